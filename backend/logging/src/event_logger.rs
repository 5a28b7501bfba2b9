//! Gateway Event Logger
//!
//! Structured decision events (rate limited, rejected, forwarded, session issued)
//! written through `tracing` on the `gateway_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    RateLimited {
        client: String,
        retry_after_secs: u64,
    },
    EndpointRejected {
        endpoint: String,
        method: String,
    },
    Forwarded {
        endpoint: String,
        method: String,
        status: u16,
        latency_ms: u64,
        authenticated: bool,
    },
    SessionIssued {
        max_age_secs: u64,
    },
    SessionCleared,
    Failed {
        endpoint: Option<String>,
        error_msg: String,
    },
}

impl GatewayEvent {
    fn is_warning(&self) -> bool {
        matches!(
            self,
            GatewayEvent::RateLimited { .. }
                | GatewayEvent::EndpointRejected { .. }
                | GatewayEvent::Failed { .. }
        )
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: GatewayEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a gateway decision, scrubbing free-form strings first.
    pub fn log_event(request_id: &str, event: GatewayEvent) -> EventLogEntry {
        let entry = EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event: Self::scrub(event),
        };

        let payload = serde_json::to_string(&entry).unwrap_or_default();
        if entry.event.is_warning() {
            warn!(target: "gateway_events", request_id = %entry.request_id, event = %payload, "Gateway event");
        } else {
            info!(target: "gateway_events", request_id = %entry.request_id, event = %payload, "Gateway event");
        }
        entry
    }

    fn scrub(mut event: GatewayEvent) -> GatewayEvent {
        match &mut event {
            GatewayEvent::EndpointRejected { endpoint, .. }
            | GatewayEvent::Forwarded { endpoint, .. } => {
                *endpoint = redact_sensitive_data(endpoint);
            }
            GatewayEvent::Failed { endpoint, error_msg } => {
                if let Some(endpoint) = endpoint {
                    *endpoint = redact_sensitive_data(endpoint);
                }
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }
        event
    }
}
