//! Caller credential extraction.
//!
//! The bearer token comes from `Authorization: Bearer <token>` first and the
//! session cookie second. Neither is required: some upstream endpoints
//! (sign-up, OTP) are called anonymously, and the upstream decides.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use fingate_core::client_key_from_forwarded;

use crate::headers::X_FORWARDED_FOR;

/// Resolve the caller's bearer token, if any.
pub fn extract_bearer_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_from_header(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_from_header(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Find a named cookie across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Rate-limit key for the caller.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok());
    client_key_from_forwarded(forwarded)
}
