//! Config redaction: produce safe-to-share config snapshots by masking secrets.

use serde_json::Value;

use crate::schema::GatewayConfig;

/// Keys whose string values are never shown in full.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "signingSecret",
    "signing_secret",
    "secret",
    "token",
    "password",
];

/// Redact a JSON value, masking every sensitive field.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Serialize the config and mask its secrets.
pub fn redacted_snapshot(config: &GatewayConfig) -> Value {
    match serde_json::to_value(config) {
        Ok(value) => redact(&value),
        Err(e) => Value::String(format!("<unserializable config: {e}>")),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if is_sensitive_key(key) && !s.is_empty() {
        // Short secrets reveal nothing; long ones keep a 4-char hint.
        let hint = if s.chars().count() > 8 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }
    Value::String(s.to_string())
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}
