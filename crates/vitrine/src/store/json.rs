//! JSON File Store
//!
//! Keeps the whole registry document in memory and rewrites
//! `registry.json` (pretty-printed) after every mutation. A mutation is applied
//! to a copy first, so a failed write leaves the in-memory state unchanged.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{
    DocumentStore, PluginFilter, PluginRecord, PreviewToken, SiteSettings, StoreData, StoreResult,
    TokenFilter,
};

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`. A missing file is an
    /// empty store; it is written on the first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "Registry store opened at {:?} ({} plugin records)",
            path,
            data.plugins.len()
        );
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<R>(&self, f: impl FnOnce(&mut StoreData) -> StoreResult<R>) -> StoreResult<R> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let result = f(&mut next)?;
        self.persist(&next).await?;
        *data = next;
        Ok(result)
    }

    async fn persist(&self, data: &StoreData) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Persisted registry store to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn find_plugins(&self) -> StoreResult<Vec<PluginRecord>> {
        Ok(self.data.read().await.plugins())
    }

    async fn find_plugin(&self, name: &str) -> StoreResult<Option<PluginRecord>> {
        Ok(self.data.read().await.plugin(name))
    }

    async fn upsert_plugin(&self, record: PluginRecord) -> StoreResult<()> {
        self.mutate(|data| {
            data.upsert_plugin(record);
            Ok(())
        })
        .await
    }

    async fn delete_plugins(&self, filter: PluginFilter<'_>) -> StoreResult<Vec<String>> {
        if !self.data.read().await.plugins.values().any(|r| filter(r)) {
            return Ok(Vec::new());
        }
        self.mutate(|data| Ok(data.delete_plugins(filter))).await
    }

    async fn load_settings(&self) -> StoreResult<Option<SiteSettings>> {
        Ok(self.data.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &SiteSettings) -> StoreResult<()> {
        self.mutate(|data| {
            data.settings = Some(settings.clone());
            Ok(())
        })
        .await
    }

    async fn insert_token(&self, token: PreviewToken) -> StoreResult<()> {
        self.mutate(|data| data.insert_token(token)).await
    }

    async fn find_token(&self, token: &str) -> StoreResult<Option<PreviewToken>> {
        Ok(self.data.read().await.token(token))
    }

    async fn delete_tokens(&self, filter: TokenFilter<'_>) -> StoreResult<usize> {
        if !self.data.read().await.preview_tokens.iter().any(|t| filter(t)) {
            return Ok(0);
        }
        self.mutate(|data| Ok(data.delete_tokens(filter))).await
    }
}
