use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::errors::StoreError;

/// Durable per-key record store with whole-value get/set semantics
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory implementation of ProgressStore for development and testing
///
/// Values are kept exactly as written so that a corrupt record behaves the
/// same way it would coming back from a remote store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProgressStore {
    records: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let records = self.records.read().await;
        let value = records.get(key).cloned();
        debug!(found = value.is_some(), "Fetched progress record from memory");
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), value);
        debug!("Stored progress record in memory");
        Ok(())
    }
}
