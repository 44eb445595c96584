//! Common Utilities
//!
//! Error taxonomy, result alias and path resolution shared across the registry.

pub mod error;
pub mod paths;
pub mod result;

pub use error::{ErrorCode, ThemeError};
pub use paths::{config_file, data_file, themes_dir, vitrine_dir};
pub use result::ThemeResult;
