//! Common Result Type

use super::error::ThemeError;

/// Result type used by every registry operation.
pub type ThemeResult<T> = Result<T, ThemeError>;
