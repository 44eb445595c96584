//! Theme Service
//!
//! The operations an admin panel and the public site call, composed over the
//! scanner, synchronizer, settings, preview tokens and component registry.
//!
//! Every operation refreshes from disk first, so installing or removing a
//! theme directory takes effect on the next call without a restart.

use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use crate::common::{ThemeError, ThemeResult};
use crate::config::RegistryConfig;
use crate::manifest::{ConfigSchema, DirectoryLister, FsLister, ManifestScanner, PluginManifest};
use crate::preview::{PreviewGrant, PreviewTokenService};
use crate::render::{RenderContext, RendererRegistry, ResolvedComponent};
use crate::store::{DocumentStore, JsonFileStore, PluginRecord, PreviewToken};
use crate::themes::{
    resolve_config, ActiveThemeResolver, SettingsStore, ThemeConfig, ThemeSynchronizer,
};

/// One row of the admin theme list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeListing {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_asset_path: Option<String>,
    pub config_schema: ConfigSchema,
    pub installed: bool,
    pub enabled: bool,
    pub active: bool,
}

impl ThemeListing {
    fn new(manifest: &PluginManifest, record: Option<&PluginRecord>, active: bool) -> Self {
        Self {
            name: manifest.name.clone(),
            title: manifest.title.clone(),
            description: manifest.description.clone(),
            version: manifest.version.clone(),
            author: manifest.author.clone(),
            preview_asset_path: manifest.preview_asset_path.clone(),
            config_schema: manifest.config_schema.clone(),
            installed: record.map_or(true, |r| r.installed),
            enabled: record.is_some_and(|r| r.enabled),
            active,
        }
    }
}

/// Everything needed to render a page with one theme
#[derive(Debug, Clone)]
pub struct ThemeRendering {
    pub theme_name: String,
    pub config: ThemeConfig,
    pub component: ResolvedComponent,
    pub preview: bool,
}

impl ThemeRendering {
    pub fn render(&self) -> String {
        self.component.render(&RenderContext {
            theme_name: &self.theme_name,
            config: &self.config,
            preview: self.preview,
        })
    }
}

pub struct ThemeService {
    config: RegistryConfig,
    store: Arc<dyn DocumentStore>,
    scanner: ManifestScanner,
    synchronizer: ThemeSynchronizer,
    settings: SettingsStore,
    active: ActiveThemeResolver,
    previews: PreviewTokenService,
    renderers: RendererRegistry,
}

impl ThemeService {
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn DocumentStore>,
        lister: Arc<dyn DirectoryLister>,
        renderers: RendererRegistry,
    ) -> Self {
        let scanner = ManifestScanner::from_config(&config, lister);
        let settings = SettingsStore::new(Arc::clone(&store), &config.default_theme);
        let active =
            ActiveThemeResolver::new(Arc::clone(&store), settings.clone(), &config.default_theme);

        Self {
            scanner,
            synchronizer: ThemeSynchronizer::new(Arc::clone(&store)),
            settings,
            active,
            previews: PreviewTokenService::new(Arc::clone(&store), config.preview_ttl()),
            renderers,
            store,
            config,
        }
    }

    /// Open a service over the real filesystem and the configured data file.
    pub async fn open(config: RegistryConfig, renderers: RendererRegistry) -> ThemeResult<Self> {
        let store = JsonFileStore::open(&config.data_file).await?;
        info!(
            "Theme registry opened (plugins: {:?}, data: {:?})",
            config.plugins_root, config.data_file
        );
        Ok(Self::new(config, Arc::new(store), Arc::new(FsLister), renderers))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Scan the plugin tree, sync records and drop stale saved configs.
    ///
    /// Never fails: a failed scan serves the last known manifests and skips
    /// the sync so nothing is pruned on a transient read error.
    pub async fn refresh(&self) -> Arc<Vec<PluginManifest>> {
        let manifests = match self.scanner.try_scan().await {
            Ok(manifests) => manifests,
            Err(e) => {
                warn!("{}; serving last known manifests without syncing", e);
                return self
                    .scanner
                    .cached()
                    .await
                    .map(|cache| Arc::clone(&cache.manifests))
                    .unwrap_or_default();
            }
        };

        if let Err(e) = self.synchronizer.synchronize(&manifests).await {
            warn!("Theme sync failed: {}", e);
        }

        let known: HashSet<String> = manifests.iter().map(|m| m.name.clone()).collect();
        if let Err(e) = self.settings.normalize(&known).await {
            warn!("Settings normalization failed: {}", e);
        }

        manifests
    }

    /// All themes on disk with their operator state. Degrades rather than fails.
    pub async fn list_themes(&self) -> Vec<ThemeListing> {
        let manifests = self.refresh().await;

        let records: HashMap<String, PluginRecord> = match self.store.find_plugins().await {
            Ok(records) => records.into_iter().map(|r| (r.name.clone(), r)).collect(),
            Err(e) => {
                warn!("Failed to load theme records: {}", e);
                HashMap::new()
            }
        };
        let active = match self.active.resolve_active().await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("Failed to resolve active theme: {}", e);
                None
            }
        };

        manifests
            .iter()
            .map(|manifest| {
                let is_active = active.as_deref() == Some(manifest.name.as_str());
                ThemeListing::new(manifest, records.get(&manifest.name), is_active)
            })
            .collect()
    }

    pub async fn activate_theme(&self, name: &str) -> ThemeResult<()> {
        self.refresh().await;
        if !self.active.allowed_themes().await?.contains(name) {
            return Err(ThemeError::PluginNotInstalled(name.to_string()));
        }

        let mut settings = self.settings.get().await?;
        if settings.active_theme_name != name {
            let previous = std::mem::replace(&mut settings.active_theme_name, name.to_string());
            self.settings.set(&settings).await?;
            info!("Activated theme '{}' (was '{}')", name, previous);
        }
        Ok(())
    }

    /// Store `config` verbatim for `name` and return how it now resolves.
    pub async fn update_theme_config(&self, name: &str, config: Value) -> ThemeResult<ThemeConfig> {
        let schema = self.allowed_schema(name).await?;

        let mut settings = self.settings.get().await?;
        let resolved = resolve_config(&schema, &config);
        settings.theme_configs.insert(name.to_string(), config);
        self.settings.set(&settings).await?;
        info!("Updated config for theme '{}'", name);
        Ok(resolved)
    }

    pub async fn set_theme_enabled(&self, name: &str, enabled: bool) -> ThemeResult<()> {
        self.refresh().await;
        let mut record = match self.store.find_plugin(name).await? {
            Some(record) if record.installed => record,
            _ => return Err(ThemeError::PluginNotInstalled(name.to_string())),
        };

        if record.enabled != enabled {
            record.enabled = enabled;
            self.store.upsert_plugin(record).await?;
            info!(
                "Theme '{}' {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        Ok(())
    }

    /// Resolved configuration for a theme that could be activated.
    pub async fn theme_config(&self, name: &str) -> ThemeResult<ThemeConfig> {
        let schema = self.allowed_schema(name).await?;
        let settings = self.settings.get().await?;
        let saved = settings.theme_configs.get(name).unwrap_or(&Value::Null);
        Ok(resolve_config(&schema, saved))
    }

    pub async fn issue_preview_token(&self, name: &str, issued_by: &str) -> ThemeResult<PreviewToken> {
        self.refresh().await;
        self.previews.issue(name, issued_by).await
    }

    pub async fn validate_preview_token(&self, token: &str, name: &str) -> ThemeResult<PreviewGrant> {
        self.previews.validate(token, name).await
    }

    /// Render `name` through a preview token, optionally with an unsaved
    /// `draft` config in place of the saved one.
    pub async fn render_preview(
        &self,
        token: &str,
        name: &str,
        draft: Option<Value>,
    ) -> ThemeResult<ThemeRendering> {
        self.previews.validate(token, name).await?;

        // The grant outlives the plugin directory; re-check it is still there
        let schema = self.allowed_schema(name).await?;
        let config = match draft {
            Some(draft) => resolve_config(&schema, &draft),
            None => {
                let settings = self.settings.get().await?;
                let saved = settings.theme_configs.get(name).unwrap_or(&Value::Null);
                resolve_config(&schema, saved)
            }
        };

        Ok(ThemeRendering {
            theme_name: name.to_string(),
            config,
            component: self.renderers.resolve(name)?,
            preview: true,
        })
    }

    pub async fn purge_expired_previews(&self) -> ThemeResult<usize> {
        self.previews.purge_expired().await
    }

    /// Active theme, its resolved config and its render component.
    pub async fn get_active_theme_for_rendering(&self) -> ThemeResult<ThemeRendering> {
        let manifests = self.refresh().await;
        let theme_name = self.active.resolve_active().await?;

        // The default theme may have no plugin directory; it then has no schema
        let empty = ConfigSchema::new();
        let schema = manifests
            .iter()
            .find(|m| m.name == theme_name)
            .map_or(&empty, |m| &m.config_schema);
        let settings = self.settings.get().await?;
        let saved = settings.theme_configs.get(&theme_name).unwrap_or(&Value::Null);
        let config = resolve_config(schema, saved);

        let component = self.renderers.resolve(&theme_name)?;
        Ok(ThemeRendering {
            theme_name,
            config,
            component,
            preview: false,
        })
    }

    /// Schema of `name` if it could be activated right now. Uses the same
    /// allowed set as `activate_theme`, so the default theme is accepted with
    /// an empty schema when nothing is installed.
    async fn allowed_schema(&self, name: &str) -> ThemeResult<ConfigSchema> {
        let manifests = self.refresh().await;
        if !self.active.allowed_themes().await?.contains(name) {
            return Err(ThemeError::PluginNotInstalled(name.to_string()));
        }
        Ok(manifests
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.config_schema.clone())
            .unwrap_or_default())
    }
}
