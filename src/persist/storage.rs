use crate::core::{ReconcileError, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Durable key-value store scoped to one session owner.
#[async_trait]
pub trait ScopedStorage: Send + Sync {
    async fn save(&self, key: &str, value: JsonValue) -> Result<()>;
    async fn load(&self, key: &str) -> Result<Option<JsonValue>>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage backed by `Arc<RwLock<HashMap>>`.
///
/// Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryScopedStorage {
    entries: Arc<RwLock<HashMap<String, JsonValue>>>,
}

impl InMemoryScopedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ReconcileError::Storage("storage lock poisoned during len".into()))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ScopedStorage for InMemoryScopedStorage {
    async fn save(&self, key: &str, value: JsonValue) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ReconcileError::Storage("storage lock poisoned during save".into()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<JsonValue>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ReconcileError::Storage("storage lock poisoned during load".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ReconcileError::Storage("storage lock poisoned during remove".into()))?;
        entries.remove(key);
        Ok(())
    }
}
