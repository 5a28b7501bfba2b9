use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;


/// Device marker sent on every upstream call.
pub const CLIENT_DEVICE: &str = "web";

/// Shared bucket for callers that arrive without a forwarded-for header.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The two methods the gateway brokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpstreamMethod {
    Get,
    Post,
}

impl UpstreamMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamMethod::Get => "GET",
            UpstreamMethod::Post => "POST",
        }
    }
}

impl fmt::Display for UpstreamMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static identity this deployment presents to the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_version: String,
    pub origin: String,
}

/// One client call, resolved and ready to be checked against the allow-list.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Relative upstream path, possibly carrying a query string.
    pub endpoint: String,
    pub method: UpstreamMethod,
    /// JSON body, only sent for POST.
    pub payload: Option<Value>,
    pub bearer_token: Option<String>,
}

impl OutboundRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: UpstreamMethod::Get,
            payload: None,
            bearer_token: None,
        }
    }

    /// `None` sends no body at all.
    pub fn post(endpoint: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: UpstreamMethod::Post,
            payload,
            bearer_token: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }
}

/// Derive the rate-limit key from an `X-Forwarded-For` value.
///
/// Takes the first comma-separated entry; anything blank collapses into
/// [`UNKNOWN_CLIENT`].
pub fn client_key_from_forwarded(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
