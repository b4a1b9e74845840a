use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::domain::MarketingType;
use super::ListingsError;
use super::upstream::{UpstreamPage, UpstreamStatuses};
use crate::config::{ConfigError, ListingsConfig, LISTINGS_API_KEY_VAR};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Query for one page of upstream listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct UpstreamQuery {
    pub locale: String,
    pub marketing_type: Option<MarketingType>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per: Option<u32>,
}

impl UpstreamQuery {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per) = self.per {
            pairs.push(("per", per.to_string()));
        }
        if !self.locale.is_empty() {
            pairs.push(("locale", self.locale.clone()));
        }
        if let Some(marketing_type) = self.marketing_type {
            pairs.push(("marketing_type", marketing_type.as_str().to_string()));
        }
        if let Some(status) = self.status.as_ref().filter(|status| !status.is_empty()) {
            pairs.push(("status", status.clone()));
        }
        pairs
    }
}

/// Access to the third-party listings API.
#[async_trait]
pub trait ListingsGateway: Send + Sync {
    async fn properties(&self, query: &UpstreamQuery) -> Result<UpstreamPage, ListingsError>;
    /// A single raw record; `NotFound` when the upstream does not know the id.
    async fn property(&self, id: &str, locale: &str) -> Result<Value, ListingsError>;
    async fn statuses(&self) -> Result<UpstreamStatuses, ListingsError>;
}

/// reqwest-backed gateway that authenticates with the `X-API-Key` header.
#[derive(Clone)]
pub struct PropstackClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PropstackClient {
    pub fn from_config(config: &ListingsConfig) -> Result<Self, ListingsError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ListingsError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, ListingsError> {
        self.api_key.as_deref().ok_or(ListingsError::Config(
            ConfigError::MissingCredential {
                var: LISTINGS_API_KEY_VAR,
            },
        ))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ListingsError> {
        // Checked before any I/O so a missing key never surfaces as an upstream 401.
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting listings API");

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(ListingsError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ListingsError::Network)?;
        if !status.is_success() {
            return Err(ListingsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| ListingsError::Decode(err.to_string()))
    }
}

/// Upstream listing ids are plain decimal integers; anything else never reaches a URL.
pub fn is_listing_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit())
}

impl std::fmt::Debug for PropstackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropstackClient")
            .field("base_url", &self.base_url)
            .field("api_key_configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ListingsGateway for PropstackClient {
    async fn properties(&self, query: &UpstreamQuery) -> Result<UpstreamPage, ListingsError> {
        self.get_json("/properties", &query.to_pairs()).await
    }

    async fn property(&self, id: &str, locale: &str) -> Result<Value, ListingsError> {
        if !is_listing_id(id) {
            return Err(ListingsError::NotFound(id.to_string()));
        }
        let mut query = Vec::new();
        if !locale.is_empty() {
            query.push(("locale", locale.to_string()));
        }

        match self.get_json(&format!("/properties/{id}"), &query).await {
            Err(ListingsError::Upstream { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ListingsError::NotFound(id.to_string()))
            }
            other => other,
        }
    }

    async fn statuses(&self) -> Result<UpstreamStatuses, ListingsError> {
        self.get_json("/property_statuses", &[]).await
    }
}
