//! Browse-side client for the local listings proxy.

use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::domain::{MarketingType, Property};
use super::upstream::{UpstreamStatus, UpstreamStatuses};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("listings request failed: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("listings proxy unreachable: {0}")]
    Network(#[source] reqwest::Error),
    #[error("listings response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ListingsPayload {
    data: Vec<Property>,
}

/// Single-attempt fetches against `GET /api/properties`; nothing is cached here.
#[derive(Debug, Clone)]
pub struct ListingsClient {
    http: Client,
    base_url: String,
}

impl ListingsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .map_err(FetchError::Network)?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch(
        &self,
        locale: &str,
        marketing_type: Option<MarketingType>,
        status: Option<&str>,
    ) -> Result<Vec<Property>, FetchError> {
        let mut query = vec![("locale", locale.to_string())];
        if let Some(marketing_type) = marketing_type {
            query.push(("marketing_type", marketing_type.as_str().to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }

        let body = self.get_text("/api/properties", &query).await?;
        let payload: ListingsPayload = serde_json::from_str(&body).map_err(FetchError::Decode)?;
        debug!(locale, count = payload.data.len(), "listings fetched");
        Ok(payload.data)
    }

    pub async fn statuses(&self) -> Result<Vec<UpstreamStatus>, FetchError> {
        let body = self.get_text("/api/property-statuses", &[]).await?;
        let statuses: UpstreamStatuses = serde_json::from_str(&body).map_err(FetchError::Decode)?;
        Ok(statuses.entries())
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .query(query)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Network)?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Identifies one fetch issued through a [`LatestRequest`] guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestTicket(u64);

/// Result of a guarded fetch. `Superseded` results must not be applied.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Current(T),
    Superseded,
}

impl<T> FetchOutcome<T> {
    pub fn current(self) -> Option<T> {
        match self {
            FetchOutcome::Current(value) => Some(value),
            FetchOutcome::Superseded => None,
        }
    }
}

/// Last-request-wins guard: only the most recently started call is current.
#[derive(Debug, Default)]
pub struct LatestRequest {
    generation: AtomicU64,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub async fn run<F, T>(&self, request: F) -> FetchOutcome<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let output = request.await;
        if self.is_current(ticket) {
            FetchOutcome::Current(output)
        } else {
            debug!(ticket = ticket.0, "discarding superseded response");
            FetchOutcome::Superseded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let guard = LatestRequest::new();
        let first = guard.begin();
        assert!(guard.is_current(first));

        let second = guard.begin();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        assert!(second > first);
    }

    #[tokio::test]
    async fn uncontested_run_is_current() {
        let guard = LatestRequest::new();
        let outcome = guard.run(async { 7 }).await;
        assert_eq!(outcome.current(), Some(7));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ListingsClient::with_client(Client::new(), "http://127.0.0.1:3000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:3000");
    }
}
