//! HTTP client for the upstream financial API.

use axum::http::{HeaderMap, StatusCode};
use fingate_core::{OutboundRequest, UpstreamMethod};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Status and parsed JSON body, relayed verbatim to the caller.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a client with an explicit per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| GatewayError::Internal(e.into()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Forward one request and parse the response body as JSON.
    ///
    /// Non-2xx statuses are not errors here; they are relayed as-is. Only a
/// timeout is typed; connect and DNS failures are internal errors.
    pub async fn send(&self, request: &OutboundRequest, headers: HeaderMap) -> GatewayResult<UpstreamResponse> {
        let url = self.url_for(&request.endpoint);
        let builder = match request.method {
            UpstreamMethod::Get => self.client.get(&url),
            UpstreamMethod::Post => {
                let builder = self.client.post(&url);
                match &request.payload {
                    Some(payload) => builder.json(payload),
                    None => builder,
                }
            }
        };

        // Headers go last so `json()` cannot override the built content type.
        let response = builder
            .headers(headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        debug!(url = %url, status = status.as_u16(), bytes = bytes.len(), "Upstream responded");

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                GatewayError::Internal(anyhow::anyhow!("upstream returned non-JSON body ({status}): {e}"))
            })?
        };

        Ok(UpstreamResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::UpstreamTimeout
    } else {
        GatewayError::Internal(error.into())
    }
}
