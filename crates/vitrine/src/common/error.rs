//! Common Error Types
//!
//! The registry's error taxonomy and its JSON-RPC error code mapping.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::StoreError;

/// JSON-RPC error codes for registry failures (custom range -32020..-32029)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PluginNotInstalled = -32020,
    ManifestReadFailure = -32021,
    TokenNotFound = -32022,
    TokenExpired = -32023,
    TokenThemeMismatch = -32024,
    ComponentLoadFailure = -32025,
    StorageFailure = -32026,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Registry error.
///
/// Invalid configuration values never appear here: the config resolver
/// coerces them to schema defaults instead.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Theme '{0}' is not installed")]
    PluginNotInstalled(String),

    #[error("Failed to read plugin manifests: {0}")]
    ManifestReadFailure(String),

    #[error("Preview token not found")]
    TokenNotFound,

    #[error("Preview token expired at {}", expired_at.to_rfc3339())]
    TokenExpired { expired_at: DateTime<Utc> },

    #[error("Preview token was issued for theme '{issued_for}', not '{requested}'")]
    TokenThemeMismatch {
        issued_for: String,
        requested: String,
    },

    #[error("Failed to load component for theme '{theme}': {reason}")]
    ComponentLoadFailure { theme: String, reason: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ThemeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ThemeError::PluginNotInstalled(_) => ErrorCode::PluginNotInstalled,
            ThemeError::ManifestReadFailure(_) => ErrorCode::ManifestReadFailure,
            ThemeError::TokenNotFound => ErrorCode::TokenNotFound,
            ThemeError::TokenExpired { .. } => ErrorCode::TokenExpired,
            ThemeError::TokenThemeMismatch { .. } => ErrorCode::TokenThemeMismatch,
            ThemeError::ComponentLoadFailure { .. } => ErrorCode::ComponentLoadFailure,
            ThemeError::Store(_) => ErrorCode::StorageFailure,
        }
    }

    /// Short machine-readable reason, stable across releases.
    pub fn reason(&self) -> &'static str {
        match self {
            ThemeError::PluginNotInstalled(_) => "not_installed",
            ThemeError::ManifestReadFailure(_) => "manifest_read_failure",
            ThemeError::TokenNotFound => "not_found",
            ThemeError::TokenExpired { .. } => "expired",
            ThemeError::TokenThemeMismatch { .. } => "theme_mismatch",
            ThemeError::ComponentLoadFailure { .. } => "component_load_failure",
            ThemeError::Store(_) => "storage_failure",
        }
    }

    /// Message suitable for showing to the person who followed a link or
    /// pressed a button. Preview failures each get their own wording.
    pub fn user_message(&self) -> String {
        match self {
            ThemeError::PluginNotInstalled(name) => {
                format!("The theme \"{}\" is not installed.", name)
            }
            ThemeError::TokenNotFound => {
                "This preview link was not found. Ask an administrator for a new one.".to_string()
            }
            ThemeError::TokenExpired { .. } => {
                "This preview link has expired. Ask an administrator for a fresh one.".to_string()
            }
            ThemeError::TokenThemeMismatch { issued_for, .. } => format!(
                "This preview link belongs to a different theme (\"{}\").",
                issued_for
            ),
            other => other.to_string(),
        }
    }

    pub fn is_preview_failure(&self) -> bool {
        matches!(
            self,
            ThemeError::TokenNotFound
                | ThemeError::TokenExpired { .. }
                | ThemeError::TokenThemeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_failures_have_distinct_messages() {
        let not_found = ThemeError::TokenNotFound;
        let expired = ThemeError::TokenExpired {
            expired_at: Utc::now(),
        };
        let mismatch = ThemeError::TokenThemeMismatch {
            issued_for: "alpha".to_string(),
            requested: "beta".to_string(),
        };

        let messages = [
            not_found.user_message(),
            expired.user_message(),
            mismatch.user_message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
        assert!(messages[2].contains("alpha"));
    }

    #[test]
    fn test_expired_message_does_not_promise_a_lifetime() {
        let expired = ThemeError::TokenExpired {
            expired_at: Utc::now(),
        };
        let message = expired.user_message();
        assert!(message.contains("expired"));
        assert!(!message.contains("hour"));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let codes = [
            ErrorCode::PluginNotInstalled,
            ErrorCode::ManifestReadFailure,
            ErrorCode::TokenNotFound,
            ErrorCode::TokenExpired,
            ErrorCode::TokenThemeMismatch,
            ErrorCode::ComponentLoadFailure,
            ErrorCode::StorageFailure,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_preview_failure_classification() {
        assert!(ThemeError::TokenNotFound.is_preview_failure());
        assert!(!ThemeError::PluginNotInstalled("x".into()).is_preview_failure());
        assert_eq!(ThemeError::TokenNotFound.reason(), "not_found");
    }
}
