use crate::config::ConfigError;
use crate::listings::{FetchError, ListingsError, MapError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Listings(ListingsError),
    Fetch(FetchError),
    Map(MapError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Listings(err) => write!(f, "listings error: {}", err),
            AppError::Fetch(err) => write!(f, "fetch error: {}", err),
            AppError::Map(err) => write!(f, "map error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Listings(err) => Some(err),
            AppError::Fetch(err) => Some(err),
            AppError::Map(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Listings(ListingsError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Listings(ListingsError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Listings(_) | AppError::Fetch(_) | AppError::Map(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ListingsError> for AppError {
    fn from(value: ListingsError) -> Self {
        Self::Listings(value)
    }
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<MapError> for AppError {
    fn from(value: MapError) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::from(ListingsError::NotFound("42".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        let error = AppError::from(FetchError::Status {
            status: 503,
            body: "maintenance".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "fetch error: listings request failed: 503 - maintenance"
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_credential_is_a_server_error() {
        let error = AppError::from(ConfigError::MissingCredential {
            var: "PROPSTACK_API_KEY",
        });
        assert_eq!(
            error.to_string(),
            "configuration error: PROPSTACK_API_KEY is not set"
        );
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
