//! Marketplace listings fetch over HTTP
//!
//! Implements the core `FetchPipeline` port as a bearer-authenticated GET
//! against the configured endpoint. The response body must be either a JSON
//! array of listings or an object carrying a `listings` array; anything else
//! is reported as malformed. Query construction and listing processing live
//! downstream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobscout_common::resilience::Clock;
use jobscout_core::{FetchPipeline, PipelineError};
use jobscout_domain::{AccessToken, FetchReport, JobScoutError, MarketplaceConfig, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("jobscout/", env!("CARGO_PKG_VERSION"));

/// HTTP implementation of the fetch pipeline
pub struct HttpFetchPipeline {
    client: Client,
    endpoint: Url,
    clock: Arc<dyn Clock>,
}

impl HttpFetchPipeline {
    /// # Errors
    /// `JobScoutError::Config` for an unparseable endpoint, or a network
    /// error if the HTTP client cannot be built.
    pub fn new(
        config: &MarketplaceConfig,
        request_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            JobScoutError::Config(format!("invalid marketplace endpoint '{}': {e}", config.endpoint))
        })?;

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| JobScoutError::from(InfraError::from(e)))?;

        Ok(Self { client, endpoint, clock })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FetchPipeline for HttpFetchPipeline {
    #[instrument(skip(self, token), fields(endpoint = %self.endpoint))]
    async fn run(&self, token: &AccessToken) -> std::result::Result<FetchReport, PipelineError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(%status, "marketplace responded");
        if let Some(err) = classify_status(status) {
            return Err(err);
        }

        let body = response.bytes().await.map_err(|e| PipelineError::Transport(e.to_string()))?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| PipelineError::Malformed(format!("invalid JSON: {e}")))?;
        let listings = count_listings(&value).ok_or_else(|| {
            PipelineError::Malformed(
                "expected a JSON array or an object with a `listings` array".to_string(),
            )
        })?;

        Ok(FetchReport { listings, fetched_at: self.clock.now() })
    }
}

fn classify_status(status: StatusCode) -> Option<PipelineError> {
    if status.is_success() {
        return None;
    }
    let message = format!("HTTP {status}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(PipelineError::Transport(message))
    } else {
        Some(PipelineError::Upstream(message))
    }
}

fn count_listings(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => map.get("listings").and_then(Value::as_array).map(Vec::len),
        _ => None,
    }
}
