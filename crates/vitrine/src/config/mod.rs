//! Registry configuration
//!
//! Reads the registry settings from `~/.vitrine/config.json`. Every field has a
//! default, so a missing file (or a partial one) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::common::paths;

/// Theme used when nothing else is installed, and preferred when self-healing.
pub const DEFAULT_THEME: &str = "classic";
/// Descriptor file looked up inside each plugin directory.
pub const DEFAULT_DESCRIPTOR_FILE: &str = "theme.json";
/// Lifetime of a preview token.
pub const DEFAULT_PREVIEW_TTL_SECS: u64 = 60 * 60;
/// Upper bound applied to configured preview lifetimes (30 days).
const MAX_PREVIEW_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Directory holding one subdirectory per theme plugin
    pub plugins_root: PathBuf,
    /// JSON document backing the plugin records, site settings and tokens
    pub data_file: PathBuf,
    pub default_theme: String,
    /// Component rendered when the requested theme's component is unavailable
    pub fallback_theme: String,
    pub descriptor_file: String,
    /// Subdirectory names under `plugins_root` that are never plugins
    pub reserved_dirs: Vec<String>,
    pub preview_ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        // Relative fallbacks when there is no home directory
        Self {
            plugins_root: paths::themes_dir().unwrap_or_else(|_| PathBuf::from(".vitrine/themes")),
            data_file: paths::data_file()
                .unwrap_or_else(|_| PathBuf::from(".vitrine/registry.json")),
            default_theme: DEFAULT_THEME.to_string(),
            fallback_theme: DEFAULT_THEME.to_string(),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
            reserved_dirs: vec!["shared".to_string(), "node_modules".to_string()],
            preview_ttl_secs: DEFAULT_PREVIEW_TTL_SECS,
        }
    }
}

impl RegistryConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No registry config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location (`~/.vitrine/config.json`).
    pub async fn load_default() -> Result<Self, ConfigError> {
        match paths::config_file() {
            Ok(path) => Self::load(&path).await,
            Err(_) => Ok(Self::default()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn preview_ttl(&self) -> chrono::Duration {
        let secs = self.preview_ttl_secs.min(MAX_PREVIEW_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = RegistryConfig::load(&dir.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.preview_ttl_secs, 3600);
    }

    #[test]
    fn test_default_locations_come_from_paths() {
        let config = RegistryConfig::default();
        if let (Ok(themes), Ok(data)) = (paths::themes_dir(), paths::data_file()) {
            assert_eq!(config.plugins_root, themes);
            assert_eq!(config.data_file, data);
        } else {
            assert!(config.plugins_root.ends_with("themes"));
            assert!(config.data_file.ends_with("registry.json"));
        }
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaultTheme":"aurora","previewTtlSecs":60}"#).unwrap();

        let config = RegistryConfig::load(&path).await.unwrap();
        assert_eq!(config.default_theme, "aurora");
        assert_eq!(config.preview_ttl_secs, 60);
        assert_eq!(config.descriptor_file, DEFAULT_DESCRIPTOR_FILE);
        assert_eq!(config.preview_ttl(), chrono::Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = RegistryConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = RegistryConfig::default();
        config.plugins_root = dir.path().join("themes");
        config.save(&path).await.unwrap();

        let loaded = RegistryConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }
}
