//! Active Theme Resolution
//!
//! Picks the theme the public site renders with. If the stored choice is no
//! longer installed, a replacement is chosen and persisted so later reads agree.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

use super::settings::SettingsStore;
use crate::common::ThemeResult;
use crate::manifest::compare_names;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct ActiveThemeResolver {
    store: Arc<dyn DocumentStore>,
    settings: SettingsStore,
    default_theme: String,
}

impl ActiveThemeResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: SettingsStore,
        default_theme: impl Into<String>,
    ) -> Self {
        Self {
            store,
            settings,
            default_theme: default_theme.into(),
        }
    }

    /// Names that may be activated: every installed record, or just the
    /// default theme when nothing is installed.
    pub async fn allowed_themes(&self) -> ThemeResult<BTreeSet<String>> {
        let installed: BTreeSet<String> = self
            .store
            .find_plugins()
            .await?
            .into_iter()
            .filter(|record| record.installed)
            .map(|record| record.name)
            .collect();

        if installed.is_empty() {
            return Ok(BTreeSet::from([self.default_theme.clone()]));
        }
        Ok(installed)
    }

    pub async fn resolve_active(&self) -> ThemeResult<String> {
        let mut settings = self.settings.get().await?;
        let allowed = self.allowed_themes().await?;

        if allowed.contains(&settings.active_theme_name) {
            return Ok(settings.active_theme_name);
        }

        let chosen = if allowed.contains(&self.default_theme) {
            self.default_theme.clone()
        } else {
            allowed
                .iter()
                .min_by(|a, b| compare_names(a, b))
                .cloned()
                .unwrap_or_else(|| self.default_theme.clone())
        };

        warn!(
            "Active theme '{}' is not installed, switching to '{}'",
            settings.active_theme_name, chosen
        );
        settings.active_theme_name = chosen.clone();
        self.settings.set(&settings).await?;
        Ok(chosen)
    }
}
