//! Theme Registry
//!
//! Record synchronization, site settings, active theme selection and
//! configuration resolution.

pub mod active;
pub mod resolve;
pub mod settings;
pub mod sync;

pub use active::ActiveThemeResolver;
pub use resolve::{is_truthy, resolve_config, schema_defaults, ThemeConfig};
pub use settings::SettingsStore;
pub use sync::{SyncReport, ThemeSynchronizer};
