//! Log Redaction Layer
//!
//! Scrubs bearer tokens, request signatures and API keys from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

// HMAC-SHA256 hex digests.
static SIGNATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-fA-F]{64}\b").unwrap());

static KEYED_SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(x-api-key|api[_-]?key|secret|token)(["']?\s*[:=]\s*["']?)([^\s"',;}]+)"#)
        .unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let mut redacted = BEARER_RE
        .replace_all(input, "Bearer [REDACTED_TOKEN]")
        .to_string();

    redacted = SIGNATURE_RE
        .replace_all(&redacted, "[REDACTED_SIGNATURE]")
        .to_string();

    redacted = KEYED_SECRET_RE
        .replace_all(&redacted, "${1}${2}[REDACTED]")
        .to_string();

    redacted
}
