//! Theme Synchronizer
//!
//! Keeps persisted plugin records in step with the manifests on disk. Safe to
//! run on every request: unchanged records are not rewritten, and the operator's
//! `enabled` flag is only ever set when a record is first created.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::common::ThemeResult;
use crate::manifest::PluginManifest;
use crate::store::{DocumentStore, PluginRecord};

/// Initial `enabled` value for newly discovered themes
const ENABLED_ON_INSERT: bool = false;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub pruned: Vec<String>,
    /// (theme name, error) for upserts that failed; the next sync retries them
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty()
            && self.updated.is_empty()
            && self.pruned.is_empty()
            && self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct ThemeSynchronizer {
    store: Arc<dyn DocumentStore>,
}

impl ThemeSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn synchronize(&self, manifests: &[PluginManifest]) -> ThemeResult<SyncReport> {
        let mut report = SyncReport::default();

        let names: HashSet<&str> = manifests.iter().map(|m| m.name.as_str()).collect();
        report.pruned = self
            .store
            .delete_plugins(&|record: &PluginRecord| !names.contains(record.name.as_str()))
            .await?;
        for name in &report.pruned {
            info!("Pruned theme record '{}' (no longer on disk)", name);
        }

        let existing: HashMap<String, PluginRecord> = self
            .store
            .find_plugins()
            .await?
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        for manifest in manifests {
            let (record, inserted) = match existing.get(&manifest.name) {
                Some(current) => {
                    let mut record = current.clone();
                    record.apply_manifest(manifest);
                    if &record == current {
                        report.unchanged += 1;
                        continue;
                    }
                    (record, false)
                }
                None => (PluginRecord::from_manifest(manifest, ENABLED_ON_INSERT), true),
            };

            match self.store.upsert_plugin(record).await {
                Ok(()) if inserted => {
                    debug!("Inserted theme record '{}'", manifest.name);
                    report.inserted.push(manifest.name.clone());
                }
                Ok(()) => {
                    debug!("Updated theme record '{}'", manifest.name);
                    report.updated.push(manifest.name.clone());
                }
                Err(e) => {
                    error!("Failed to sync theme record '{}': {}", manifest.name, e);
                    report.failed.push((manifest.name.clone(), e.to_string()));
                }
            }
        }

        if !report.is_noop() {
            info!(
                "Theme sync: {} inserted, {} updated, {} pruned, {} failed",
                report.inserted.len(),
                report.updated.len(),
                report.pruned.len(),
                report.failed.len()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn manifest(name: &str, version: &str) -> PluginManifest {
        PluginManifest {
            name: name.to_string(),
            title: name.to_uppercase(),
            description: None,
            version: version.to_string(),
            author: None,
            preview_asset_path: None,
            config_schema: Default::default(),
            source_location: PathBuf::from(format!("/themes/{}", name)),
        }
    }

    #[tokio::test]
    async fn test_first_sync_inserts_disabled_records() {
        let store = Arc::new(MemoryStore::new());
        let sync = ThemeSynchronizer::new(store.clone());

        let report = sync
            .synchronize(&[manifest("alpha", "1.0.0"), manifest("beta", "1.0.0")])
            .await
            .unwrap();
        assert_eq!(report.inserted, vec!["alpha", "beta"]);

        let records = store.find_plugins().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.installed && !r.enabled));
    }

    #[tokio::test]
    async fn test_resync_preserves_enabled_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let sync = ThemeSynchronizer::new(store.clone());
        let manifests = [manifest("alpha", "1.0.0"), manifest("beta", "1.0.0")];
        sync.synchronize(&manifests).await.unwrap();

        let mut alpha = store.find_plugin("alpha").await.unwrap().unwrap();
        alpha.enabled = true;
        store.upsert_plugin(alpha).await.unwrap();

        let second = sync.synchronize(&manifests).await.unwrap();
        assert!(second.is_noop());
        assert_eq!(second.unchanged, 2);
        let third = sync.synchronize(&manifests).await.unwrap();
        assert_eq!(second, third);

        assert!(store.find_plugin("alpha").await.unwrap().unwrap().enabled);
        assert!(!store.find_plugin("beta").await.unwrap().unwrap().enabled);
    }

    #[tokio::test]
    async fn test_manifest_fields_overwrite_but_enabled_survives_update() {
        let store = Arc::new(MemoryStore::new());
        let sync = ThemeSynchronizer::new(store.clone());
        sync.synchronize(&[manifest("alpha", "1.0.0")]).await.unwrap();

        let mut alpha = store.find_plugin("alpha").await.unwrap().unwrap();
        alpha.enabled = true;
        store.upsert_plugin(alpha).await.unwrap();

        let report = sync.synchronize(&[manifest("alpha", "2.0.0")]).await.unwrap();
        assert_eq!(report.updated, vec!["alpha"]);

        let alpha = store.find_plugin("alpha").await.unwrap().unwrap();
        assert_eq!(alpha.version, "2.0.0");
        assert!(alpha.enabled);
    }

    #[tokio::test]
    async fn test_prunes_exactly_the_removed_plugin() {
        let store = Arc::new(MemoryStore::new());
        let sync = ThemeSynchronizer::new(store.clone());
        sync.synchronize(&[
            manifest("alpha", "1.0.0"),
            manifest("beta", "1.0.0"),
            manifest("gamma", "1.0.0"),
        ])
        .await
        .unwrap();

        let report = sync
            .synchronize(&[manifest("alpha", "1.0.0"), manifest("gamma", "1.0.0")])
            .await
            .unwrap();
        assert_eq!(report.pruned, vec!["beta"]);

        let mut names: Vec<String> = store
            .find_plugins()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["alpha", "gamma"]);
    }

    #[tokio::test]
    async fn test_empty_manifest_set_prunes_everything() {
        let store = Arc::new(MemoryStore::new());
        let sync = ThemeSynchronizer::new(store.clone());
        sync.synchronize(&[manifest("alpha", "1.0.0")]).await.unwrap();

        let report = sync.synchronize(&[]).await.unwrap();
        assert_eq!(report.pruned, vec!["alpha"]);
        assert!(store.find_plugins().await.unwrap().is_empty());
    }
}
