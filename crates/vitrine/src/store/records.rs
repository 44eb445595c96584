//! Persisted documents owned by the theme registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::manifest::{ConfigSchema, PluginManifest};

/// Persisted counterpart of a manifest, carrying operator state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_asset_path: Option<String>,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub config_schema: ConfigSchema,
    pub installed: bool,
    /// Operator decision; synchronization never changes it once set
    pub enabled: bool,
}

impl PluginRecord {
    pub fn from_manifest(manifest: &PluginManifest, enabled: bool) -> Self {
        Self {
            name: manifest.name.clone(),
            title: manifest.title.clone(),
            description: manifest.description.clone(),
            preview_asset_path: manifest.preview_asset_path.clone(),
            version: manifest.version.clone(),
            author: manifest.author.clone(),
            config_schema: manifest.config_schema.clone(),
            installed: true,
            enabled,
        }
    }

    /// Overwrite the disk-derived fields, leaving `enabled` alone.
    pub fn apply_manifest(&mut self, manifest: &PluginManifest) {
        self.title = manifest.title.clone();
        self.description = manifest.description.clone();
        self.preview_asset_path = manifest.preview_asset_path.clone();
        self.version = manifest.version.clone();
        self.author = manifest.author.clone();
        self.config_schema = manifest.config_schema.clone();
        self.installed = true;
    }
}

/// Site-wide settings singleton. Keys this registry does not own are kept in
/// `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub active_theme_name: String,
    /// Raw, unresolved configuration per theme name
    #[serde(default)]
    pub theme_configs: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteSettings {
    pub fn new(active_theme_name: impl Into<String>) -> Self {
        Self {
            active_theme_name: active_theme_name.into(),
            theme_configs: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

/// Short-lived credential for previewing one theme. Immutable once stored.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewToken {
    pub token: String,
    pub theme_name: String,
    pub issued_by: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PreviewToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Tokens grant access; keep them out of logs
impl fmt::Debug for PreviewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewToken")
            .field("token", &"[REDACTED]")
            .field("theme_name", &self.theme_name)
            .field("issued_by", &self.issued_by)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{FieldDescriptor, FieldKind};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn manifest(title: &str) -> PluginManifest {
        let mut config_schema = ConfigSchema::new();
        config_schema.insert("accent".to_string(), FieldDescriptor::new(FieldKind::Color));
        PluginManifest {
            name: "alpha".to_string(),
            title: title.to_string(),
            description: None,
            version: "1.0.0".to_string(),
            author: None,
            preview_asset_path: None,
            config_schema,
            source_location: PathBuf::from("/themes/alpha"),
        }
    }

    #[test]
    fn test_apply_manifest_keeps_enabled() {
        let mut record = PluginRecord::from_manifest(&manifest("Alpha"), true);
        record.installed = false;
        record.apply_manifest(&manifest("Alpha v2"));
        assert_eq!(record.title, "Alpha v2");
        assert!(record.installed);
        assert!(record.enabled);
    }

    #[test]
    fn test_settings_preserve_unrelated_keys() {
        let raw = r#"{"activeThemeName":"alpha","themeConfigs":{},"siteTitle":"My Blog"}"#;
        let settings: SiteSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.extra["siteTitle"], "My Blog");

        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["siteTitle"], "My Blog");
        assert_eq!(back["activeThemeName"], "alpha");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let now = Utc::now();
        let token = PreviewToken {
            token: "secret-value".to_string(),
            theme_name: "alpha".to_string(),
            issued_by: "admin".to_string(),
            expires_at: now,
            created_at: now,
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret-value"));
        assert!(token.is_expired_at(now));
    }
}
