//! Site settings access.
//!
//! The settings singleton is created on first read and written back whole on
//! every change. Concurrent editors are last-write-wins.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::ThemeResult;
use crate::store::{DocumentStore, SiteSettings};

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn DocumentStore>,
    default_theme: String,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn DocumentStore>, default_theme: impl Into<String>) -> Self {
        Self {
            store,
            default_theme: default_theme.into(),
        }
    }

    /// Load the settings, creating them with the default theme if absent.
    pub async fn get(&self) -> ThemeResult<SiteSettings> {
        if let Some(settings) = self.store.load_settings().await? {
            return Ok(settings);
        }

        let settings = SiteSettings::new(&self.default_theme);
        self.store.save_settings(&settings).await?;
        info!(
            "Created site settings with default theme '{}'",
            self.default_theme
        );
        Ok(settings)
    }

    pub async fn set(&self, settings: &SiteSettings) -> ThemeResult<()> {
        self.store.save_settings(settings).await?;
        Ok(())
    }

    /// Drop saved configs for themes that are no longer known. Returns the
    /// dropped names. An empty `known` set is treated as a transient scan
    /// problem and leaves the configs alone.
    pub async fn normalize(&self, known: &HashSet<String>) -> ThemeResult<Vec<String>> {
        if known.is_empty() {
            debug!("No known themes, skipping settings normalization");
            return Ok(Vec::new());
        }

        let mut settings = self.get().await?;
        let stale: Vec<String> = settings
            .theme_configs
            .keys()
            .filter(|name| !known.contains(*name))
            .cloned()
            .collect();
        if stale.is_empty() {
            return Ok(stale);
        }

        for name in &stale {
            settings.theme_configs.remove(name);
        }
        self.set(&settings).await?;
        info!("Dropped saved config for removed themes: {}", stale.join(", "));
        Ok(stale)
    }
}
