use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use super::domain::{MarketingType, Property};
use super::filter::featured;
use super::format::{condition_label, format_price, heating_label, property_kind_label};
use super::gateway::ListingsGateway;
use super::map::{MapLocator, MapState};
use super::service::{ListingRequest, ListingService, DEFAULT_LOCALE};
use super::ListingsError;

/// Shared handler state: the listing service plus the detail view's map locator.
pub struct ListingsState<G> {
    pub service: ListingService<G>,
    pub locator: MapLocator,
}

impl<G> ListingsState<G>
where
    G: ListingsGateway + 'static,
{
    pub fn new(service: ListingService<G>, locator: MapLocator) -> Self {
        Self { service, locator }
    }
}

/// Router builder exposing the listings proxy endpoints.
pub fn listings_router<G>(state: Arc<ListingsState<G>>) -> Router
where
    G: ListingsGateway + 'static,
{
    Router::new()
        .route("/api/properties", get(properties_handler::<G>))
        .route("/api/properties/:property_id", get(property_handler::<G>))
        .route("/api/property-statuses", get(statuses_handler::<G>))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PropertiesQuery {
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    marketing_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    /// Limits the response to the N newest listings.
    #[serde(default)]
    featured: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DetailQuery {
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PropertiesResponse {
    data: Vec<Property>,
    total: usize,
}

/// Detail payload: the record plus display-ready labels and the inline map state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetailView {
    pub property: Property,
    pub formatted_price: String,
    pub price_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heating_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_label: Option<String>,
    pub map: MapState,
}

impl PropertyDetailView {
    pub fn new(property: Property, map: MapState) -> Self {
        let formatted_price = if property.details.price_on_inquiry {
            "Price on request".to_string()
        } else {
            format_price(property.price, &property.currency)
        };
        let price_label = match property.marketing_type {
            MarketingType::Rent => "Monthly rent",
            MarketingType::Buy => "Purchase price",
        };

        Self {
            formatted_price,
            price_label,
            kind_label: property.details.kind.as_deref().map(property_kind_label),
            heating_label: property.details.heating_type.as_deref().map(heating_label),
            condition_label: property.details.condition.as_deref().map(condition_label),
            map,
            property,
        }
    }
}

pub(crate) async fn properties_handler<G>(
    State(state): State<Arc<ListingsState<G>>>,
    Query(query): Query<PropertiesQuery>,
) -> Response
where
    G: ListingsGateway + 'static,
{
    let marketing_type = match query.marketing_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<MarketingType>() {
            Ok(marketing_type) => Some(marketing_type),
            Err(err) => {
                let payload = json!({ "error": err.to_string() });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
    };

    let request = ListingRequest {
        locale: query
            .locale
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
        marketing_type,
        status: query.status,
    };

    match state.service.properties(&request).await {
        Ok(data) => {
            let data = match query.featured {
                Some(count) => featured(&data, count),
                None => data,
            };
            let total = data.len();
            (StatusCode::OK, axum::Json(PropertiesResponse { data, total })).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to fetch properties");
            let payload = json!({
                "error": "Failed to fetch properties",
                "details": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn property_handler<G>(
    State(state): State<Arc<ListingsState<G>>>,
    Path(property_id): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response
where
    G: ListingsGateway + 'static,
{
    let locale = query.locale.unwrap_or_default();
    match state.service.property(&property_id, &locale).await {
        Ok(property) => {
            let map = state.locator.state(&property).await;
            let view = PropertyDetailView::new(property, map);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(ListingsError::NotFound(id)) => {
            warn!(property_id = %id, "property not found");
            let payload = json!({ "error": "Property not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => {
            error!(property_id = %property_id, error = %err, "failed to fetch property");
            let payload = json!({
                "error": "Failed to fetch property",
                "details": err.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn statuses_handler<G>(State(state): State<Arc<ListingsState<G>>>) -> Response
where
    G: ListingsGateway + 'static,
{
    match state.service.statuses().await {
        Ok(statuses) => (StatusCode::OK, axum::Json(statuses)).into_response(),
        Err(err) if err.is_configuration() => {
            error!(error = %err, "listings credential missing");
            let payload = json!({ "error": "API key not configured" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to fetch property statuses");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
