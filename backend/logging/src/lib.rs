//! Telemetry and structured logging components for fingate.
//!
//! Handles log redaction, JSON output generation, file rotation, and gateway decision events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, GatewayEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
