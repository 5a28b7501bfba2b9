//! Environment loading for the gateway config.
//!
//! Required values must be present and non-empty; optional values fall back
//! to [`crate::defaults`]. Reading goes through a plain map so tests never
//! touch the process environment.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use fingate_core::ClientIdentity;

use crate::defaults::*;
use crate::schema::{
    AllowlistSettings, GatewayConfig, LoggingSettings, RateLimitSettings, SecretString,
    ServerSettings, SessionSettings, SigningSettings, UpstreamSettings,
};

pub const ENV_UPSTREAM_BASE_URL: &str = "FINGATE_UPSTREAM_BASE_URL";
pub const ENV_API_KEY: &str = "FINGATE_API_KEY";
pub const ENV_CLIENT_ID: &str = "FINGATE_CLIENT_ID";
pub const ENV_CLIENT_VERSION: &str = "FINGATE_CLIENT_VERSION";
pub const ENV_CLIENT_ORIGIN: &str = "FINGATE_CLIENT_ORIGIN";
pub const ENV_SIGNING_SECRET: &str = "FINGATE_SIGNING_SECRET";

pub const ENV_BIND: &str = "FINGATE_BIND";
pub const ENV_PORT: &str = "FINGATE_PORT";
pub const ENV_SESSION_MAX_AGE_SECS: &str = "FINGATE_SESSION_MAX_AGE_SECS";
pub const ENV_SESSION_COOKIE_NAME: &str = "FINGATE_SESSION_COOKIE_NAME";
pub const ENV_SIGNIN_PATH: &str = "FINGATE_SIGNIN_PATH";
pub const ENV_RATE_LIMIT_MAX: &str = "FINGATE_RATE_LIMIT_MAX";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "FINGATE_RATE_LIMIT_WINDOW_SECS";
pub const ENV_RATE_LIMIT_SWEEP_SECS: &str = "FINGATE_RATE_LIMIT_SWEEP_SECS";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "FINGATE_UPSTREAM_TIMEOUT_SECS";
pub const ENV_ALLOWLIST_FILE: &str = "FINGATE_ALLOWLIST_FILE";
pub const ENV_LOG_DIR: &str = "FINGATE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "RUST_LOG";

/// Values that must be set before the gateway will serve traffic.
pub const REQUIRED_VARS: &[&str] = &[
    ENV_UPSTREAM_BASE_URL,
    ENV_API_KEY,
    ENV_CLIENT_ID,
    ENV_CLIENT_VERSION,
    ENV_CLIENT_ORIGIN,
    ENV_SIGNING_SECRET,
];

/// Error returned when the environment cannot produce a usable config.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required env var \"{var}\"")]
    Missing { var: String },

    #[error("Invalid value for env var \"{var}\": {reason}")]
    Invalid { var: String, reason: String },
}

/// Build the config from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    load_from_map(&std::env::vars().collect())
}

/// Build the config from a provided map (useful for testing).
pub fn load_from_map(env: &HashMap<String, String>) -> Result<GatewayConfig, ConfigError> {
    // Report every missing required var in declaration order, first one wins.
    for var in REQUIRED_VARS {
        required(env, var)?;
    }

    let base_url = required(env, ENV_UPSTREAM_BASE_URL)?
        .trim_end_matches('/')
        .to_string();

    Ok(GatewayConfig {
        server: ServerSettings {
            bind_address: optional(env, ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: parsed(env, ENV_PORT, DEFAULT_PORT)?,
        },
        upstream: UpstreamSettings {
            base_url,
            api_key: SecretString::new(required(env, ENV_API_KEY)?),
            timeout_secs: parsed(env, ENV_UPSTREAM_TIMEOUT_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS)?,
        },
        signing: SigningSettings {
            identity: ClientIdentity {
                client_id: required(env, ENV_CLIENT_ID)?,
                client_version: required(env, ENV_CLIENT_VERSION)?,
                origin: required(env, ENV_CLIENT_ORIGIN)?,
            },
            signing_secret: SecretString::new(required(env, ENV_SIGNING_SECRET)?),
        },
        session: SessionSettings {
            cookie_name: optional(env, ENV_SESSION_COOKIE_NAME)
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string()),
            max_age_secs: parsed(env, ENV_SESSION_MAX_AGE_SECS, DEFAULT_SESSION_MAX_AGE_SECS)?,
            signin_path: optional(env, ENV_SIGNIN_PATH)
                .unwrap_or_else(|| DEFAULT_SIGNIN_PATH.to_string()),
        },
        rate_limit: RateLimitSettings {
            max_requests: parsed(env, ENV_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_MAX)?,
            window_secs: parsed(env, ENV_RATE_LIMIT_WINDOW_SECS, DEFAULT_RATE_LIMIT_WINDOW_SECS)?,
            sweep_interval_secs: parsed(env, ENV_RATE_LIMIT_SWEEP_SECS, DEFAULT_RATE_LIMIT_SWEEP_SECS)?,
        },
        allowlist: AllowlistSettings {
            file: optional(env, ENV_ALLOWLIST_FILE).map(PathBuf::from),
            routes: default_routes(),
        },
        logging: LoggingSettings {
            dir: optional(env, ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            level: optional(env, ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        },
    })
}

fn optional(env: &HashMap<String, String>, var: &str) -> Option<String> {
    env.get(var)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(env: &HashMap<String, String>, var: &str) -> Result<String, ConfigError> {
    optional(env, var).ok_or_else(|| ConfigError::Missing {
        var: var.to_string(),
    })
}

fn parsed<T>(env: &HashMap<String, String>, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match optional(env, var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
