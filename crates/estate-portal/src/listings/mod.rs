//! Listing data tier: upstream access, normalization, filtering and browse state.

pub mod cache;
pub mod client;
pub mod domain;
pub mod filter;
pub mod format;
pub mod gateway;
pub mod map;
pub mod normalizer;
pub mod router;
pub mod service;
pub mod statuses;
pub mod upstream;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

use crate::config::ConfigError;

pub use client::{FetchError, FetchOutcome, LatestRequest, ListingsClient, RequestTicket};
pub use domain::{Coordinates, MarketingType, Property};
pub use filter::{
    featured, filter_all, matches, toggle, BedroomBucket, FilterCriteria, NeighborhoodChoice, TypeFilter,
};
pub use gateway::{ListingsGateway, PropstackClient, UpstreamQuery};
pub use map::{GeocodingClient, Geocoder, MapError, MapLocator, MapState};
pub use normalizer::{normalize, normalize_batch, NormalizeError};
pub use router::{listings_router, ListingsState};
pub use service::{ListingRequest, ListingService};
pub use view::{reduce, BrowseAction, BrowseState, ListingDisplay};

/// Errors raised while serving listings through the proxy.
#[derive(Debug, thiserror::Error)]
pub enum ListingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("listings API error: {status} - {body}")]
    Upstream { status: u16, body: String },
    #[error("listings API unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("listings API returned an unreadable payload: {0}")]
    Decode(String),
    #[error(transparent)]
    Normalize(#[from] normalizer::NormalizeError),
    #[error("property {0} not found")]
    NotFound(String),
}

impl ListingsError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ListingsError::Config(_))
    }
}
