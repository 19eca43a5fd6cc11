//! Calculation service client
//!
//! The worksheet controller only sees the [`CalculationEndpoint`] trait so
//! tests and the preview binary can swap the transport.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{AssumptionSet, StrategyResult};

use crate::config::ApiConfig;
use crate::error::{WorksheetError, WorksheetResult};

/// Longest response body kept in a status error
const MAX_ERROR_BODY: usize = 512;

/// Something that can compute a strategy result from a payload
#[async_trait]
pub trait CalculationEndpoint: Send + Sync {
    /// POST `payload` to `path` and decode the result record
    async fn calculate(&self, path: &str, payload: &Value) -> WorksheetResult<StrategyResult>;
}

/// Source of system-default assumptions
#[async_trait]
pub trait DefaultsSource: Send + Sync {
    async fn fetch_defaults(&self) -> WorksheetResult<AssumptionSet>;
}

/// HTTP client for the calculation service
#[derive(Clone)]
pub struct HttpCalculationClient {
    client: Client,
    base_url: String,
}

impl HttpCalculationClient {
    /// Create a client from configuration
    pub fn new(api: &ApiConfig) -> WorksheetResult<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| WorksheetError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check_status(response: reqwest::Response) -> WorksheetResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(WorksheetError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CalculationEndpoint for HttpCalculationClient {
    async fn calculate(&self, path: &str, payload: &Value) -> WorksheetResult<StrategyResult> {
        let url = self.url(path);
        tracing::debug!(%url, "Posting worksheet calculation");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| WorksheetError::Network(e.to_string()))?;

        let response = Self::check_status(response).await.map_err(|e| {
            tracing::warn!(%url, error = %e, "Calculation service rejected request");
            e
        })?;

        response
            .json::<StrategyResult>()
            .await
            .map_err(|e| WorksheetError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DefaultsSource for HttpCalculationClient {
    async fn fetch_defaults(&self) -> WorksheetResult<AssumptionSet> {
        let url = self.url("/api/v1/defaults");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorksheetError::Network(e.to_string()))?;

        let defaults: AssumptionSet = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| WorksheetError::Decode(e.to_string()))?;

        Ok(defaults.sanitized())
    }
}
