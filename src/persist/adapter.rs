use super::snapshot::PendingSnapshot;
use super::storage::ScopedStorage;
use super::writer::SnapshotWriter;
use crate::core::{ReconcileError, Result};
use crate::pending::PendingEditStore;
use chrono::{DateTime, Duration, Utc};
use log::warn;
use std::sync::Arc;
use tracing::info;

/// Mirrors the pending edits of one scope into durable storage.
///
/// Restores are awaited; saves are queued on a background writer so edits
/// never wait on storage.
pub struct PersistenceAdapter {
    storage: Arc<dyn ScopedStorage>,
    key: String,
    max_age: Duration,
    writer: SnapshotWriter,
}

impl PersistenceAdapter {
    pub fn new(
        storage: Arc<dyn ScopedStorage>,
        key: impl Into<String>,
        max_age: Duration,
    ) -> Self {
        let key = key.into();
        let writer = SnapshotWriter::spawn(storage.clone(), key.clone());
        Self {
            storage,
            key,
            max_age,
            writer,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub async fn restore(&self) -> Result<Option<PendingEditStore>> {
        self.restore_at(Utc::now()).await
    }

    /// Loads the snapshot for this scope as of `now`.
    ///
    /// Unreadable and stale snapshots are removed and yield `None`, as does an
    /// empty one. Only a failing storage read is an error.
    pub async fn restore_at(&self, now: DateTime<Utc>) -> Result<Option<PendingEditStore>> {
        let raw = match self.storage.load(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(ReconcileError::Serialization(err)) => return self.discard(err).await,
            Err(err) => return Err(err),
        };

        let snapshot: PendingSnapshot = match serde_json::from_value(raw) {
            Ok(snapshot) => snapshot,
            Err(err) => return self.discard(err).await,
        };

        if snapshot.is_stale(now, self.max_age) {
            info!(
                key = %self.key,
                timestamp = snapshot.timestamp,
                "evicting stale pending edit snapshot"
            );
            self.storage.remove(&self.key).await?;
            return Ok(None);
        }

        if snapshot.is_empty() {
            self.storage.remove(&self.key).await?;
            return Ok(None);
        }

        let store = snapshot.into_store();
        info!(key = %self.key, records = store.pending_count(), "restored pending edits");
        Ok(Some(store))
    }

    async fn discard(&self, err: serde_json::Error) -> Result<Option<PendingEditStore>> {
        warn!(
            "discarding unreadable pending edit snapshot: key='{}' error='{}'",
            self.key, err
        );
        self.storage.remove(&self.key).await?;
        Ok(None)
    }

    /// Queues a write reflecting `store`. An empty store removes the key.
    pub fn snapshot(&self, store: &PendingEditStore) {
        self.snapshot_at(store, Utc::now());
    }

    pub fn snapshot_at(&self, store: &PendingEditStore, at: DateTime<Utc>) {
        if store.is_empty() {
            self.writer.schedule_remove();
            return;
        }

        match serde_json::to_value(PendingSnapshot::capture(store, at)) {
            Ok(value) => self.writer.schedule_save(value),
            Err(err) => warn!(
                "failed to encode pending edit snapshot: key='{}' error='{}'",
                self.key, err
            ),
        }
    }

    /// Waits until every queued write has reached storage.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::{FileScopedStorage, InMemoryScopedStorage};
    use serde_json::json;

    fn adapter(storage: &InMemoryScopedStorage) -> PersistenceAdapter {
        PersistenceAdapter::new(
            Arc::new(storage.clone()),
            "pending-edits:p1",
            Duration::hours(24),
        )
    }

    #[tokio::test]
    async fn nothing_stored_restores_nothing() {
        let storage = InMemoryScopedStorage::new();
        assert!(adapter(&storage).restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_then_restore() {
        let storage = InMemoryScopedStorage::new();
        let adapter = adapter(&storage);
        let store = PendingEditStore::new()
            .queue_top_level_edit("r1", "bmk", "A")
            .queue_sub_item_edit("r1", "s1", "key", "K");

        adapter.snapshot(&store);
        adapter.flush().await;

        let restored = adapter.restore().await.unwrap().unwrap();
        assert_eq!(restored.pending_record_ids(), vec!["r1".to_string()]);
        assert_eq!(restored.patch("r1").unwrap().field_count(), 2);
    }

    #[tokio::test]
    async fn empty_store_removes_the_key() {
        let storage = InMemoryScopedStorage::new();
        let adapter = adapter(&storage);
        adapter.snapshot(&PendingEditStore::new().queue_top_level_edit("r1", "a", "1"));
        adapter.flush().await;
        assert_eq!(storage.len().unwrap(), 1);

        adapter.snapshot(&PendingEditStore::new());
        adapter.flush().await;
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn stale_snapshot_is_evicted() {
        let storage = InMemoryScopedStorage::new();
        let adapter = adapter(&storage);
        let captured = Utc::now() - Duration::hours(25);
        adapter.snapshot_at(
            &PendingEditStore::new().queue_top_level_edit("r1", "a", "1"),
            captured,
        );
        adapter.flush().await;

        assert!(adapter.restore().await.unwrap().is_none());
        assert!(storage.load(adapter.key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_discarded() {
        let storage = InMemoryScopedStorage::new();
        storage
            .save("pending-edits:p1", json!({"edits": 7}))
            .await
            .unwrap();

        assert!(adapter(&storage).restore().await.unwrap().is_none());
        assert!(storage.is_empty().unwrap());
    }

    #[tokio::test]
    async fn unparseable_file_is_discarded() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileScopedStorage::new(dir.path());
        let path = storage.path_for("pending-edits:p1");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let adapter = PersistenceAdapter::new(
            Arc::new(storage),
            "pending-edits:p1",
            Duration::hours(24),
        );
        assert!(adapter.restore().await.unwrap().is_none());
        assert!(!path.exists());
    }
}
