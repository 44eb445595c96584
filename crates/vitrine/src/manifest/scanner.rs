//! Manifest Scanner
//!
//! Builds the ordered manifest list from the plugins root. Results are memoized
//! by a directory signature (names plus modification times), so repeated scans
//! of an unchanged tree never re-read descriptor files.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::lister::{DirEntryStat, DirectoryLister};
use super::types::{humanize_name, PluginManifest, ThemeDescriptor, DEFAULT_VERSION};
use crate::common::{ThemeError, ThemeResult};
use crate::config::{RegistryConfig, DEFAULT_DESCRIPTOR_FILE};

/// Descriptors larger than this are treated as malformed
const MAX_DESCRIPTOR_BYTES: usize = 1_000_000;

/// `"<dir>:<dirMtime>:<descriptorMtime-or-0>"` entries, sorted and `|`-joined
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectorySignature(String);

impl DirectorySignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_parts(mut parts: Vec<String>) -> Self {
        parts.sort();
        Self(parts.join("|"))
    }
}

/// Last scan result, replaced wholesale whenever the signature changes
#[derive(Debug, Clone)]
pub struct ScannerCache {
    pub signature: DirectorySignature,
    pub manifests: Arc<Vec<PluginManifest>>,
}

pub struct ManifestScanner {
    root: PathBuf,
    descriptor_file: String,
    reserved_dirs: Vec<String>,
    lister: Arc<dyn DirectoryLister>,
    cache: RwLock<Option<Arc<ScannerCache>>>,
}

impl ManifestScanner {
    pub fn new(root: impl Into<PathBuf>, lister: Arc<dyn DirectoryLister>) -> Self {
        Self {
            root: root.into(),
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
            reserved_dirs: Vec::new(),
            lister,
            cache: RwLock::new(None),
        }
    }

    pub fn from_config(config: &RegistryConfig, lister: Arc<dyn DirectoryLister>) -> Self {
        Self::new(config.plugins_root.clone(), lister)
            .with_descriptor_file(config.descriptor_file.clone())
            .with_reserved_dirs(config.reserved_dirs.clone())
    }

    pub fn with_descriptor_file(mut self, file: impl Into<String>) -> Self {
        self.descriptor_file = file.into();
        self
    }

    pub fn with_reserved_dirs(mut self, reserved: Vec<String>) -> Self {
        self.reserved_dirs = reserved;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan, degrading to the last known manifests (or none) on read failure.
    pub async fn scan(&self) -> Arc<Vec<PluginManifest>> {
        match self.try_scan().await {
            Ok(manifests) => manifests,
            Err(e) => {
                warn!("{}; serving last known manifests", e);
                self.cache
                    .read()
                    .await
                    .as_ref()
                    .map(|cache| Arc::clone(&cache.manifests))
                    .unwrap_or_default()
            }
        }
    }

    /// Scan, surfacing listing failures. A missing root is an empty result.
    pub async fn try_scan(&self) -> ThemeResult<Arc<Vec<PluginManifest>>> {
        let entries = match self.lister.list_dirs(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Plugins root {:?} does not exist", self.root);
                Vec::new()
            }
            Err(e) => {
                return Err(ThemeError::ManifestReadFailure(format!(
                    "{:?}: {}",
                    self.root, e
                )))
            }
        };

        let mut entries: Vec<DirEntryStat> = entries
            .into_iter()
            .filter(|entry| !self.is_excluded(&entry.name))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let signature = self.signature_of(&entries).await;

        if let Some(cache) = self.cache.read().await.as_ref() {
            if cache.signature == signature {
                debug!("Plugin tree unchanged, reusing {} manifests", cache.manifests.len());
                return Ok(Arc::clone(&cache.manifests));
            }
        }

        let mut manifests = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        for entry in &entries {
            let manifest = self.build_manifest(entry).await;
            if !seen.insert(manifest.name.clone()) {
                warn!(
                    "Skipping {:?}: theme name '{}' is already provided by another directory",
                    entry.path, manifest.name
                );
                continue;
            }
            manifests.push(manifest);
        }
        manifests.sort_by(|a, b| compare_names(&a.name, &b.name));

        let manifests = Arc::new(manifests);
        *self.cache.write().await = Some(Arc::new(ScannerCache {
            signature,
            manifests: Arc::clone(&manifests),
        }));

        info!("Scanned {} theme plugins from {:?}", manifests.len(), self.root);
        Ok(manifests)
    }

    /// Current cache entry, if any scan has completed
    pub async fn cached(&self) -> Option<Arc<ScannerCache>> {
        self.cache.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.cache.write().await = None;
    }

    fn is_excluded(&self, name: &str) -> bool {
        name.starts_with('.')
            || name.starts_with('_')
            || self.reserved_dirs.iter().any(|reserved| reserved == name)
    }

    async fn signature_of(&self, entries: &[DirEntryStat]) -> DirectorySignature {
        let mut parts = Vec::with_capacity(entries.len());
        for entry in entries {
            let descriptor = entry.path.join(&self.descriptor_file);
            let descriptor_modified = match self.lister.modified(&descriptor).await {
                Ok(modified) => modified,
                Err(e) => {
                    debug!("Could not stat {:?}: {}", descriptor, e);
                    None
                }
            };
            parts.push(format!(
                "{}:{}:{}",
                entry.name,
                millis(entry.modified),
                millis(descriptor_modified)
            ));
        }
        DirectorySignature::from_parts(parts)
    }

    async fn build_manifest(&self, entry: &DirEntryStat) -> PluginManifest {
        let descriptor_path = entry.path.join(&self.descriptor_file);
        let descriptor = match self.read_descriptor(&descriptor_path).await {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => ThemeDescriptor::default(),
            Err(e) => {
                warn!(
                    "Malformed descriptor {:?}: {}; using directory defaults",
                    descriptor_path, e
                );
                ThemeDescriptor::default()
            }
        };

        let name = non_blank(descriptor.name).unwrap_or_else(|| entry.name.clone());
        let title = non_blank(descriptor.title).unwrap_or_else(|| humanize_name(&name));
        let version = non_blank(descriptor.version).unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let preview_asset_path = match non_blank(descriptor.preview_url) {
            Some(relative) => self.existing_asset(&entry.path, &relative).await,
            None => None,
        };

        PluginManifest {
            name,
            title,
            description: non_blank(descriptor.description),
            version,
            author: non_blank(descriptor.author),
            preview_asset_path,
            config_schema: descriptor.config_schema.unwrap_or_default(),
            source_location: entry.path.clone(),
        }
    }

    async fn read_descriptor(&self, path: &Path) -> Result<Option<ThemeDescriptor>, String> {
        if !self.lister.is_file(path).await {
            return Ok(None);
        }

        let content = self
            .lister
            .read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read file: {}", e))?;
        if content.len() > MAX_DESCRIPTOR_BYTES {
            return Err("Descriptor too large (max 1MB)".to_string());
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| format!("Failed to parse JSON: {}", e))
    }

    /// Returns the normalized relative path only if the asset is on disk.
    async fn existing_asset(&self, plugin_dir: &Path, relative: &str) -> Option<String> {
        let relative = Path::new(relative.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            warn!(
                "Ignoring preview asset {:?} outside plugin directory {:?}",
                relative, plugin_dir
            );
            return None;
        }

        if self.lister.is_file(&plugin_dir.join(relative)).await {
            Some(relative.to_string_lossy().into_owned())
        } else {
            debug!("Preview asset {:?} missing in {:?}", relative, plugin_dir);
            None
        }
    }
}

/// Case-insensitive order with a byte-order tie-break, so the result does not
/// depend on the host locale.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn millis(time: Option<SystemTime>) -> u128 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
