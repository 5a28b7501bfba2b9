//! `fingate-config`: gateway runtime configuration.
//!
//! Provides:
//! - Typed config schema (upstream, signing identity, session, rate limit, allow-list)
//! - Fail-fast environment loading with defaults
//! - Optional YAML allow-list file
//! - Config redaction for safe logging/display
//! - Semantic validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use env::{load_from_env, load_from_map, ConfigError};
pub use io::{load_allowlist, parse_allowlist};
pub use redact::{redact, redacted_snapshot};
pub use schema::{
    AllowlistSettings, GatewayConfig, LoggingSettings, RateLimitSettings, RouteSpec,
    SecretString, ServerSettings, SessionSettings, SigningSettings, UpstreamSettings,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::collections::HashMap;

/// Load the config from the process environment, apply the allow-list file
/// and validate.
///
/// This is the main entry point at startup. Any missing secret or validation
/// error aborts; the gateway must not serve traffic with a partial config.
pub async fn load_and_prepare() -> Result<GatewayConfig> {
    let config = load_from_env().context("Gateway configuration is incomplete")?;
    prepare(config).await
}

/// Same as [`load_and_prepare`] but reads from the provided map.
pub async fn load_and_prepare_with(env: &HashMap<String, String>) -> Result<GatewayConfig> {
    let config = load_from_map(env).context("Gateway configuration is incomplete")?;
    prepare(config).await
}

async fn prepare(mut config: GatewayConfig) -> Result<GatewayConfig> {
    if let Some(path) = config.allowlist.file.clone() {
        config.allowlist.routes = load_allowlist(&path).await?;
    }

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!(
            "Gateway configuration is invalid ({} error(s)): {}",
            report.errors.len(),
            report.errors[0]
        );
    }

    Ok(config)
}
