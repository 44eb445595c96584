//! In-process document store, used by tests and throwaway runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    DocumentStore, PluginFilter, PluginRecord, PreviewToken, SiteSettings, StoreData, StoreResult,
    TokenFilter,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_plugins(&self) -> StoreResult<Vec<PluginRecord>> {
        Ok(self.data.read().await.plugins())
    }

    async fn find_plugin(&self, name: &str) -> StoreResult<Option<PluginRecord>> {
        Ok(self.data.read().await.plugin(name))
    }

    async fn upsert_plugin(&self, record: PluginRecord) -> StoreResult<()> {
        self.data.write().await.upsert_plugin(record);
        Ok(())
    }

    async fn delete_plugins(&self, filter: PluginFilter<'_>) -> StoreResult<Vec<String>> {
        Ok(self.data.write().await.delete_plugins(filter))
    }

    async fn load_settings(&self) -> StoreResult<Option<SiteSettings>> {
        Ok(self.data.read().await.settings.clone())
    }

    async fn save_settings(&self, settings: &SiteSettings) -> StoreResult<()> {
        self.data.write().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn insert_token(&self, token: PreviewToken) -> StoreResult<()> {
        self.data.write().await.insert_token(token)
    }

    async fn find_token(&self, token: &str) -> StoreResult<Option<PreviewToken>> {
        Ok(self.data.read().await.token(token))
    }

    async fn delete_tokens(&self, filter: TokenFilter<'_>) -> StoreResult<usize> {
        Ok(self.data.write().await.delete_tokens(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::exercise_store;

    #[tokio::test]
    async fn test_memory_store_contract() {
        let store = MemoryStore::new();
        exercise_store(&store).await;
    }
}
