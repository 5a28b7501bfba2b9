//! Header sets for both sides of the gateway.

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION},
    HeaderMap, HeaderName, HeaderValue,
};

use crate::signing::SignedHeaders;

pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
pub const X_CLIENT_TIMESTAMP: HeaderName = HeaderName::from_static("x-client-timestamp");
pub const X_CLIENT_ID: HeaderName = HeaderName::from_static("x-client-id");
pub const X_CLIENT_VERSION: HeaderName = HeaderName::from_static("x-client-version");
pub const X_CLIENT_DEVICE: HeaderName = HeaderName::from_static("x-client-device");
pub const X_REQUEST_SIGNATURE: HeaderName = HeaderName::from_static("x-request-signature");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Content-sniffing off, framing denied, legacy XSS filter in block mode.
pub fn apply_defensive_headers(headers: &mut HeaderMap) {
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
}

/// Build the full outbound header map for one upstream call.
///
/// Order of assembly: content type, API key, defensive headers, optional
/// bearer token, then the signed envelope.
pub fn build_outbound_headers(
    api_key: &str,
    bearer_token: Option<&str>,
    signed: &SignedHeaders,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(X_API_KEY, value(api_key).context("API key is not a valid header value")?);
    apply_defensive_headers(&mut headers);

    if let Some(token) = bearer_token {
        headers.insert(
            AUTHORIZATION,
            value(&format!("Bearer {token}")).context("Bearer token is not a valid header value")?,
        );
    }

    headers.insert(X_CLIENT_TIMESTAMP, value(&signed.timestamp)?);
    headers.insert(X_CLIENT_ID, value(&signed.client_id).context("Client id is not a valid header value")?);
    headers.insert(
        X_CLIENT_VERSION,
        value(&signed.client_version).context("Client version is not a valid header value")?,
    );
    headers.insert(X_CLIENT_DEVICE, HeaderValue::from_static(signed.client_device));
    headers.insert(X_REQUEST_SIGNATURE, value(&signed.signature)?);
    headers.insert(ORIGIN, value(&signed.origin).context("Client origin is not a valid header value")?);

    Ok(headers)
}

fn value(raw: &str) -> Result<HeaderValue> {
    Ok(HeaderValue::from_str(raw)?)
}
