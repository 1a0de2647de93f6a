//! HTTP implementation of the backend query contract.
//!
//! One request per query, JSON in and JSON out. There are no retries and no
//! client-side timeout: whatever the transport does is what the user gets.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;

use super::client::{BackendError, QueryBackend};
use super::types::{QueryRequest, QueryResponse};

/// Path of the query endpoint relative to the backend base URL.
pub const QUERY_PATH: &str = "/api/query";

/// Backend reached over HTTP (directly, or through `recuri proxy`).
pub struct HttpBackend {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Builds a backend for `base_url` (e.g. `http://localhost:8000`).
    ///
    /// Fails with `BackendError::Config` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let endpoint = query_endpoint(base_url)?;
        info!("Backend query endpoint: {}", endpoint);
        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
        })
    }
}

/// Joins the base URL with [`QUERY_PATH`], tolerating a trailing slash.
fn query_endpoint(base_url: &str) -> Result<Url, BackendError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    Url::parse(&format!("{trimmed}{QUERY_PATH}"))
        .map_err(|e| BackendError::Config(format!("invalid backend URL '{base_url}': {e}")))
}

#[async_trait]
impl QueryBackend for HttpBackend {
    fn name(&self) -> &str {
        self.endpoint.host_str().unwrap_or("backend")
    }

    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError> {
        info!("Backend query: {} chars", query.chars().count());

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&QueryRequest::new(query))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Backend response status: {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Backend error: {} - {}", status.as_u16(), body);
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let parsed: QueryResponse =
            serde_json::from_slice(&bytes).map_err(|e| BackendError::Parse(e.to_string()))?;

        debug!(
            "Backend answer: {} chars, {} sources",
            parsed.result.as_deref().map_or(0, |r| r.chars().count()),
            parsed.citations().len()
        );
        Ok(parsed)
    }
}
