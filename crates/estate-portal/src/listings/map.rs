use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::domain::{Coordinates, Property};
use crate::config::{ConfigError, MapConfig, MAPS_API_KEY_VAR};

pub const GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("map provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("no coordinates found for '{0}'")]
    NoResults(String),
    #[error("map provider rejected the request: {0}")]
    Provider(String),
    #[error("map provider unreachable: {0}")]
    Network(#[source] reqwest::Error),
}

/// Address to coordinates lookup offered by the map provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, MapError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinSource {
    Listing,
    Geocoded,
}

/// Inline map state rendered by the property detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapState {
    Ready {
        lat: f64,
        lng: f64,
        source: PinSource,
    },
    Unavailable {
        message: String,
    },
}

/// Resolves where a listing sits on the map, preferring explicit coordinates.
#[derive(Clone)]
pub struct MapLocator {
    geocoder: Option<Arc<dyn Geocoder>>,
    timeout: Duration,
}

impl MapLocator {
    pub fn new(geocoder: Arc<dyn Geocoder>, timeout: Duration) -> Self {
        Self {
            geocoder: Some(geocoder),
            timeout,
        }
    }

    /// Locator without a provider; only listings that carry coordinates can be shown.
    pub fn without_geocoder(timeout: Duration) -> Self {
        Self {
            geocoder: None,
            timeout,
        }
    }

    pub fn from_config(config: &MapConfig) -> Result<Self, MapError> {
        match config.api_key.as_deref() {
            Some(api_key) => {
                let client = GeocodingClient::new(api_key, GEOCODE_ENDPOINT, config.timeout)?;
                Ok(Self::new(Arc::new(client), config.timeout))
            }
            None => Ok(Self::without_geocoder(config.timeout)),
        }
    }

    pub async fn locate(&self, property: &Property) -> Result<(Coordinates, PinSource), MapError> {
        if let Some(coordinates) = property.coordinates {
            return Ok((coordinates, PinSource::Listing));
        }

        let query = geocode_query(property);
        if query.is_empty() {
            return Err(MapError::NoResults(format!("listing {}", property.id)));
        }

        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or(MapError::Config(ConfigError::MissingCredential {
                var: MAPS_API_KEY_VAR,
            }))?;

        let coordinates = tokio::time::timeout(self.timeout, geocoder.geocode(&query))
            .await
            .map_err(|_| MapError::Timeout(self.timeout))??;
        Ok((coordinates, PinSource::Geocoded))
    }

    /// Like [`MapLocator::locate`], folding failures into an inline error state.
    pub async fn state(&self, property: &Property) -> MapState {
        match self.locate(property).await {
            Ok((coordinates, source)) => MapState::Ready {
                lat: coordinates.lat,
                lng: coordinates.lng,
                source,
            },
            Err(err) => {
                warn!(listing_id = property.id, error = %err, "map unavailable for listing");
                MapState::Unavailable {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for MapLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapLocator")
            .field("geocoder", &self.geocoder.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// Hidden addresses are only geocoded to postcode and city.
fn geocode_query(property: &Property) -> String {
    if property.address.hidden {
        let parts: Vec<&str> = [&property.address.zip_code, &property.address.city]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        return parts.join(" ");
    }
    property.location.trim().to_string()
}

/// Geocoding API client keyed by the map provider credential.
pub struct GeocodingClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl GeocodingClient {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self, MapError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MapError::Network)?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: Coordinates,
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn geocode(&self, address: &str) -> Result<Coordinates, MapError> {
        let response: GeocodeResponse = self
            .http
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(MapError::Network)?
            .error_for_status()
            .map_err(MapError::Network)?
            .json()
            .await
            .map_err(MapError::Network)?;

        match response.status.as_str() {
            "OK" => response
                .results
                .into_iter()
                .next()
                .map(|result| result.geometry.location)
                .ok_or_else(|| MapError::NoResults(address.to_string())),
            "ZERO_RESULTS" => Err(MapError::NoResults(address.to_string())),
            other => Err(MapError::Provider(
                response
                    .error_message
                    .unwrap_or_else(|| other.to_string()),
            )),
        }
    }
}
