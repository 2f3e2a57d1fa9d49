use crate::core::{FieldMap, RecordId, SubItemId};
use crate::path::{FieldLocation, FieldPath};
use crate::pending::PendingEditStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted form of the pending edits. Error state is not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSnapshot {
    #[serde(default)]
    pub edits: BTreeMap<RecordId, StagedRecordEdits>,
    #[serde(default)]
    pub sub_item_edits: BTreeMap<RecordId, BTreeMap<SubItemId, FieldMap>>,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRecordEdits {
    #[serde(default)]
    pub top_level: FieldMap,
    #[serde(default, skip_serializing_if = "FieldMap::is_empty")]
    pub sub_object: FieldMap,
}

impl PendingSnapshot {
    pub fn capture(store: &PendingEditStore, at: DateTime<Utc>) -> Self {
        let mut snapshot = Self {
            timestamp: at.timestamp_millis(),
            ..Self::default()
        };

        for (record_id, patch) in store.patches() {
            if !patch.top_level().is_empty() || !patch.sub_object().is_empty() {
                snapshot.edits.insert(
                    record_id.clone(),
                    StagedRecordEdits {
                        top_level: patch.top_level().clone(),
                        sub_object: patch.sub_object().clone(),
                    },
                );
            }
            if !patch.sub_items().is_empty() {
                snapshot
                    .sub_item_edits
                    .insert(record_id.clone(), patch.sub_items().clone());
            }
        }
        snapshot
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Older than `max_age` at `now`. An unreadable timestamp counts as stale.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.captured_at() {
            Some(captured) => now.signed_duration_since(captured) > max_age,
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits
            .values()
            .all(|edits| edits.top_level.is_empty() && edits.sub_object.is_empty())
            && self.sub_item_edits.values().all(|items| items.values().all(FieldMap::is_empty))
    }

    pub fn into_store(self) -> PendingEditStore {
        let mut store = PendingEditStore::new();
        for (record_id, edits) in self.edits {
            for (field, value) in edits.top_level {
                store = store.queue_edit(
                    &FieldPath::new(record_id.clone(), FieldLocation::top(field)),
                    value,
                );
            }
            for (field, value) in edits.sub_object {
                store = store.queue_edit(
                    &FieldPath::new(record_id.clone(), FieldLocation::sub_object(field)),
                    value,
                );
            }
        }
        for (record_id, items) in self.sub_item_edits {
            for (sub_item_id, fields) in items {
                for (field, value) in fields {
                    store = store.queue_edit(
                        &FieldPath::new(
                            record_id.clone(),
                            FieldLocation::sub_item(sub_item_id.clone(), field),
                        ),
                        value,
                    );
                }
            }
        }
        store
    }
}
