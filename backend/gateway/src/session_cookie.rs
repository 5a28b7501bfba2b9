//! Session cookie issued on successful sign-in and cleared on logout.
//!
//! The cookie holds the literal upstream token and nothing else:
//! `HttpOnly`, `Secure`, `SameSite=Lax`, bounded by the configured max-age.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{GatewayError, GatewayResult};

/// Expected shape of the sign-in response: `{ status, data: { token: { token } } }`.
#[derive(Debug, Deserialize)]
pub struct SignInResponse {
    pub status: String,
    pub data: SignInData,
}

#[derive(Debug, Deserialize)]
pub struct SignInData {
    pub token: TokenEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct TokenEnvelope {
    pub token: String,
}

const SUCCESS: &str = "success";

/// Decide whether a sign-in response issues a session, and with which token.
///
/// `Ok(None)` for any failed sign-in (non-2xx status or a non-success body).
/// A success response that does not carry a usable token is an
/// [`GatewayError::UnexpectedUpstreamContract`].
pub fn session_token(status: StatusCode, body: &Value) -> GatewayResult<Option<String>> {
    let body_success = body.get("status").and_then(Value::as_str) == Some(SUCCESS);
    if !status.is_success() || !body_success {
        return Ok(None);
    }

    let parsed: SignInResponse = serde_json::from_value(body.clone()).map_err(|e| {
        GatewayError::UnexpectedUpstreamContract(format!("sign-in response missing data.token.token: {e}"))
    })?;

    let token = parsed.data.token.token;
    if token.is_empty() || !token.bytes().all(is_cookie_octet) {
        return Err(GatewayError::UnexpectedUpstreamContract(
            "sign-in token is not a valid cookie value".to_string(),
        ));
    }
    Ok(Some(token))
}

/// RFC 6265 `cookie-octet`.
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

/// Build the `Set-Cookie` value for a freshly issued session.
pub fn create_session_cookie(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

/// Build the `Set-Cookie` value that expires the session immediately.
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0")
}

/// Append a `Set-Cookie` header.
pub fn append_set_cookie(headers: &mut HeaderMap, cookie: &str) -> GatewayResult<()> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| GatewayError::Internal(anyhow::anyhow!("invalid Set-Cookie value: {e}")))?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
