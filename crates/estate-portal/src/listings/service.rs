use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::cache::ResponseCache;
use super::domain::{MarketingType, Property};
use super::gateway::{is_listing_id, ListingsGateway, UpstreamQuery};
use super::normalizer::{normalize, normalize_batch};
use super::upstream::{UpstreamPage, UpstreamProperty, UpstreamStatuses};
use super::ListingsError;
use crate::config::ListingsConfig;

pub const DEFAULT_LOCALE: &str = "en";

/// Parameters of a listings page request as received by the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub locale: String,
    pub marketing_type: Option<MarketingType>,
    /// Upstream status filter; the configured active allow-list applies when absent.
    pub status: Option<String>,
}

impl Default for ListingRequest {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            marketing_type: None,
            status: None,
        }
    }
}

/// Proxy-side listing access: status defaults, response caching and normalization.
pub struct ListingService<G> {
    gateway: Arc<G>,
    config: ListingsConfig,
    pages: ResponseCache<UpstreamQuery, UpstreamPage>,
    statuses: ResponseCache<(), UpstreamStatuses>,
}

impl<G> ListingService<G>
where
    G: ListingsGateway + 'static,
{
    pub fn new(gateway: Arc<G>, config: ListingsConfig) -> Self {
        let pages = ResponseCache::new(config.cache_ttl);
        let statuses = ResponseCache::new(config.status_cache_ttl);
        Self {
            gateway,
            config,
            pages,
            statuses,
        }
    }

    pub fn config(&self) -> &ListingsConfig {
        &self.config
    }

    /// Normalized, non-archived listings for one request.
    pub async fn properties(
        &self,
        request: &ListingRequest,
    ) -> Result<Vec<Property>, ListingsError> {
        let query = self.upstream_query(request);
        let page = match self.pages.get(&query) {
            Some(page) => {
                debug!(locale = %query.locale, "serving listings page from cache");
                page
            }
            None => {
                let page = self.gateway.properties(&query).await?;
                self.pages.insert(query.clone(), page.clone());
                page
            }
        };

        let received = page.data.len();
        let properties = normalize_batch(page.data, Utc::now());
        info!(
            locale = %query.locale,
            received,
            served = properties.len(),
            "listings page normalized"
        );
        Ok(properties)
    }

    /// A single listing. Archived listings are reported as not found.
    pub async fn property(&self, id: &str, locale: &str) -> Result<Property, ListingsError> {
        if !is_listing_id(id) {
            debug!(property_id = %id, "rejecting malformed listing id");
            return Err(ListingsError::NotFound(id.to_string()));
        }
        let locale = if locale.trim().is_empty() {
            DEFAULT_LOCALE
        } else {
            locale
        };
        let raw = self.gateway.property(id, locale).await?;
        let record: UpstreamProperty =
            serde_json::from_value(raw).map_err(|err| ListingsError::Decode(err.to_string()))?;
        let property = normalize(&record, Utc::now())?;

        if property.archived {
            return Err(ListingsError::NotFound(id.to_string()));
        }
        Ok(property)
    }

    /// The upstream status taxonomy, cached for the configured status lifetime.
    pub async fn statuses(&self) -> Result<UpstreamStatuses, ListingsError> {
        if let Some(statuses) = self.statuses.get(&()) {
            return Ok(statuses);
        }
        let statuses = self.gateway.statuses().await?;
        self.statuses.insert((), statuses.clone());
        Ok(statuses)
    }

    fn upstream_query(&self, request: &ListingRequest) -> UpstreamQuery {
        let locale = request.locale.trim();
        let status = request
            .status
            .as_deref()
            .map(str::trim)
            .filter(|status| !status.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.active_status_filter());

        UpstreamQuery {
            locale: if locale.is_empty() {
                DEFAULT_LOCALE.to_string()
            } else {
                locale.to_string()
            },
            marketing_type: request.marketing_type,
            status: Some(status),
            page: None,
            per: Some(self.config.page_size),
        }
    }
}
