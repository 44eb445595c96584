//! Vitrine
//!
//! Theme plugin registry for a content-publishing site: discovers theme
//! plugins on disk, keeps their persisted records in sync, resolves each
//! theme's configuration against its schema, picks the active theme and
//! issues theme-scoped preview tokens.

pub mod common;
pub mod config;
pub mod manifest;
pub mod preview;
pub mod render;
pub mod service;
pub mod store;
pub mod themes;

pub use common::{ErrorCode, ThemeError, ThemeResult};
pub use config::{ConfigError, RegistryConfig};
pub use manifest::{DirectoryLister, FsLister, ManifestScanner, PluginManifest};
pub use preview::{PreviewGrant, PreviewTokenService};
pub use render::{ComponentFactory, RenderContext, RenderFn, RendererRegistry, ResolvedComponent};
pub use service::{ThemeListing, ThemeRendering, ThemeService};
pub use store::{DocumentStore, JsonFileStore, MemoryStore, StoreError};
pub use themes::{resolve_config, SyncReport, ThemeConfig};
