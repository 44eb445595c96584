//! Document Store
//!
//! Persistence seam for the three document kinds the registry owns: plugin
//! records, the site settings singleton, and preview tokens. Operations are
//! find / upsert / delete-by-filter; nothing here knows about themes beyond the
//! document shapes.

mod json;
mod memory;
pub mod records;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use records::{PluginRecord, PreviewToken, SiteSettings};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize store document: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Preview token already exists")]
    DuplicateToken,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Predicate used by the delete-by-filter operations
pub type PluginFilter<'a> = &'a (dyn Fn(&PluginRecord) -> bool + Send + Sync);
pub type TokenFilter<'a> = &'a (dyn Fn(&PreviewToken) -> bool + Send + Sync);

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_plugins(&self) -> StoreResult<Vec<PluginRecord>>;

    async fn find_plugin(&self, name: &str) -> StoreResult<Option<PluginRecord>>;

    /// Insert or replace the record with the same name.
    async fn upsert_plugin(&self, record: PluginRecord) -> StoreResult<()>;

    /// Delete every record matching `filter`; returns the deleted names.
    async fn delete_plugins(&self, filter: PluginFilter<'_>) -> StoreResult<Vec<String>>;

    async fn load_settings(&self) -> StoreResult<Option<SiteSettings>>;

    async fn save_settings(&self, settings: &SiteSettings) -> StoreResult<()>;

    /// Fails with `DuplicateToken` if the token string is already stored.
    async fn insert_token(&self, token: PreviewToken) -> StoreResult<()>;

    async fn find_token(&self, token: &str) -> StoreResult<Option<PreviewToken>>;

    /// Delete every token matching `filter`; returns how many were removed.
    async fn delete_tokens(&self, filter: TokenFilter<'_>) -> StoreResult<usize>;
}

/// The whole persisted document, shared by both store implementations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreData {
    #[serde(default)]
    plugins: BTreeMap<String, PluginRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<SiteSettings>,
    #[serde(default)]
    preview_tokens: Vec<PreviewToken>,
}

impl StoreData {
    fn plugins(&self) -> Vec<PluginRecord> {
        self.plugins.values().cloned().collect()
    }

    fn plugin(&self, name: &str) -> Option<PluginRecord> {
        self.plugins.get(name).cloned()
    }

    fn upsert_plugin(&mut self, record: PluginRecord) {
        self.plugins.insert(record.name.clone(), record);
    }

    fn delete_plugins(&mut self, filter: PluginFilter<'_>) -> Vec<String> {
        let doomed: Vec<String> = self
            .plugins
            .values()
            .filter(|record| filter(record))
            .map(|record| record.name.clone())
            .collect();
        for name in &doomed {
            self.plugins.remove(name);
        }
        doomed
    }

    fn insert_token(&mut self, token: PreviewToken) -> StoreResult<()> {
        if self.preview_tokens.iter().any(|t| t.token == token.token) {
            return Err(StoreError::DuplicateToken);
        }
        self.preview_tokens.push(token);
        Ok(())
    }

    fn token(&self, token: &str) -> Option<PreviewToken> {
        self.preview_tokens.iter().find(|t| t.token == token).cloned()
    }

    fn delete_tokens(&mut self, filter: TokenFilter<'_>) -> usize {
        let before = self.preview_tokens.len();
        self.preview_tokens.retain(|token| !filter(token));
        before - self.preview_tokens.len()
    }
}
