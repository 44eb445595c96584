//! Common Handler Utilities
//!
//! Parameter extraction and mapping of registry errors onto JSON-RPC errors.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use vitrine::ThemeError;

use crate::protocol::JsonRpcResponse;

// ────────────────────────────────────────────────────────────────────────────
// Parameter Extraction Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Extract a required string parameter
pub fn require_string<'a>(
    params: &'a Value,
    key: &str,
    id: &Value,
) -> Result<&'a str, JsonRpcResponse> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcResponse::invalid_params(id.clone(), format!("Missing '{}' parameter", key)))
}

/// Extract a required bool parameter
pub fn require_bool(params: &Value, key: &str, id: &Value) -> Result<bool, JsonRpcResponse> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| JsonRpcResponse::invalid_params(id.clone(), format!("Missing '{}' parameter", key)))
}

/// Extract a required parameter of any JSON type
pub fn require_value<'a>(
    params: &'a Value,
    key: &str,
    id: &Value,
) -> Result<&'a Value, JsonRpcResponse> {
    params
        .get(key)
        .ok_or_else(|| JsonRpcResponse::invalid_params(id.clone(), format!("Missing '{}' parameter", key)))
}

/// Extract a string parameter with a default value
pub fn string_with_default<'a>(params: &'a Value, key: &str, default: &'a str) -> &'a str {
    params.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

/// Extract an optional parameter, treating `null` as absent
pub fn optional_value(params: &Value, key: &str) -> Option<Value> {
    params.get(key).filter(|v| !v.is_null()).cloned()
}

// ────────────────────────────────────────────────────────────────────────────
// Response Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Serialize `data` into a success response
pub fn ok<T: Serialize>(id: Value, data: &T) -> JsonRpcResponse {
    match serde_json::to_value(data) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            JsonRpcResponse::internal_error(id, format!("Failed to serialize response: {}", e))
        }
    }
}

/// Success response with a simple "success: true" payload
#[inline]
pub fn simple_success(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(id, json!({ "success": true }))
}

/// Map a registry error onto its JSON-RPC error code.
///
/// `data.reason` is always present; preview failures also carry the message
/// meant for the person holding the link.
pub fn theme_error(id: Value, err: ThemeError) -> JsonRpcResponse {
    let mut data = json!({ "reason": err.reason() });
    if err.is_preview_failure() {
        data["userMessage"] = Value::String(err.user_message());
    }

    match &err {
        ThemeError::Store(_) | ThemeError::ManifestReadFailure(_) => error!("{}", err),
        _ => warn!("{}", err),
    }
    JsonRpcResponse::error(id, err.code().code(), err.to_string(), Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine::ErrorCode;

    #[test]
    fn test_require_string() {
        let params = json!({"name": "alpha", "enabled": true});
        let id = json!(1);

        assert_eq!(require_string(&params, "name", &id).unwrap(), "alpha");
        assert!(require_string(&params, "missing", &id).is_err());
        assert!(require_string(&params, "enabled", &id).is_err());
    }

    #[test]
    fn test_require_bool() {
        let params = json!({"enabled": false, "name": "alpha"});
        let id = json!(1);

        assert!(!require_bool(&params, "enabled", &id).unwrap());
        assert!(require_bool(&params, "name", &id).is_err());
    }

    #[test]
    fn test_optional_value_treats_null_as_absent() {
        let params = json!({"draft": null, "config": {"a": 1}});
        assert_eq!(optional_value(&params, "draft"), None);
        assert_eq!(optional_value(&params, "config"), Some(json!({"a": 1})));
        assert_eq!(optional_value(&params, "missing"), None);
    }

    #[test]
    fn test_preview_errors_carry_reason_and_message() {
        let resp = theme_error(json!(3), ThemeError::TokenNotFound);
        let error = resp.error.unwrap();
        assert_eq!(error.code, ErrorCode::TokenNotFound.code());
        let data = error.data.unwrap();
        assert_eq!(data["reason"], json!("not_found"));
        assert!(data["userMessage"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn test_other_errors_carry_reason_only() {
        let resp = theme_error(json!(3), ThemeError::PluginNotInstalled("gamma".into()));
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32020);
        let data = error.data.unwrap();
        assert_eq!(data["reason"], json!("not_installed"));
        assert!(data.get("userMessage").is_none());
    }
}
