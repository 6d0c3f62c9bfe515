//! HTTP client for Prometheus instant queries

use super::response::{QueryData, QueryResponse};
use crate::error::QueryError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

const QUERY_PATH: &str = "/api/v1/query";

/// Where a query is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    /// Prometheus base URL, e.g. `http://prometheus:9090`
    pub endpoint: String,
    /// Bearer token, attached only when present and non-empty
    pub token: Option<String>,
}

/// Anything that can evaluate an instant query
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Evaluate `expression` at a single point in time.
    ///
    /// `timeout` is forwarded to the backend as its evaluation timeout; `time`
    /// pins the evaluation instant (backend "now" when absent).
    async fn query_instant(
        &self,
        target: &QueryTarget,
        expression: &str,
        timeout: &str,
        time: Option<f64>,
    ) -> Result<QueryData, QueryError>;
}

/// Prometheus HTTP API client
#[derive(Debug, Clone)]
pub struct PromClient {
    client: Client,
}

impl PromClient {
    /// Create a new client
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("metrics-export/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

/// Full query URL for a base endpoint
pub fn query_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), QUERY_PATH)
}

#[async_trait]
impl QueryBackend for PromClient {
    async fn query_instant(
        &self,
        target: &QueryTarget,
        expression: &str,
        timeout: &str,
        time: Option<f64>,
    ) -> Result<QueryData, QueryError> {
        let url = query_url(&target.endpoint);
        let transport = |source: reqwest::Error| QueryError::Transport {
            endpoint: target.endpoint.clone(),
            source,
        };

        let mut form = vec![("query", expression.to_string()), ("timeout", timeout.to_string())];
        if let Some(time) = time {
            form.push(("time", time.to_string()));
        }

        let mut request = self.client.post(&url).form(&form);
        if let Some(token) = target.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        debug!(url = %url, query = %expression, "Sending instant query");
        let response = request.send().await.map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                endpoint: target.endpoint.clone(),
                status,
                body,
            });
        }

        let body: QueryResponse = response.json().await.map_err(transport)?;
        body.into_data()
    }
}
