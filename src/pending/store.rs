use super::patch::Patch;
use super::payload::{PayloadOptions, RecordPatchPayload, build_patch_payload};
use crate::core::{FieldValue, RecordId};
use crate::path::{ErrorInfo, FieldLocation, FieldPath};
use im::OrdMap;

/// Record id → staged patch, plus the last known error per record.
///
/// Every mutation returns a new store; the maps are persistent, so a store
/// captured before an await stays valid and cheap to keep around.
#[derive(Debug, Clone, Default)]
pub struct PendingEditStore {
    patches: OrdMap<RecordId, Patch>,
    errors: OrdMap<RecordId, ErrorInfo>,
    next_version: u64,
}

impl PendingEditStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn queue_top_level_edit(
        &self,
        record_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.queue_edit(
            &FieldPath::new(record_id, FieldLocation::top(field)),
            value.into(),
        )
    }

    pub fn queue_sub_object_edit(
        &self,
        record_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.queue_edit(
            &FieldPath::new(record_id, FieldLocation::sub_object(field)),
            value.into(),
        )
    }

    pub fn queue_sub_item_edit(
        &self,
        record_id: &str,
        sub_item_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.queue_edit(
            &FieldPath::new(record_id, FieldLocation::sub_item(sub_item_id, field)),
            value.into(),
        )
    }

    /// Stages `value` at `path` and clears the record's error display.
    pub fn queue_edit(&self, path: &FieldPath, value: FieldValue) -> Self {
        let mut patch = self.patches.get(&path.record_id).cloned().unwrap_or_default();
        patch.set(path.location.clone(), value);
        let mut next = self.with_patch(&path.record_id, patch);
        next.errors = next.errors.without(&path.record_id);
        next
    }

    /// Replaces the record's patch, assigning a fresh version. An empty patch
    /// removes the entry.
    pub(crate) fn with_patch(&self, record_id: &str, patch: Patch) -> Self {
        let mut next = self.clone();
        if patch.is_empty() {
            next.patches = next.patches.without(record_id);
            return next;
        }
        next.next_version += 1;
        let patch = patch.with_version(next.next_version);
        next.patches = next.patches.update(record_id.to_string(), patch);
        next
    }

    pub fn with_error(&self, record_id: &str, info: ErrorInfo) -> Self {
        let mut next = self.clone();
        next.errors = if info.is_empty() {
            next.errors.without(record_id)
        } else {
            next.errors.update(record_id.to_string(), info)
        };
        next
    }

    pub fn clear_error(&self, record_id: &str) -> Self {
        let mut next = self.clone();
        next.errors = next.errors.without(record_id);
        next
    }

    pub fn discard_record(&self, record_id: &str) -> Self {
        let mut next = self.clone();
        next.patches = next.patches.without(record_id);
        next.errors = next.errors.without(record_id);
        next
    }

    /// Drops every patch and error. Versions keep counting up.
    pub fn discard_all(&self) -> Self {
        Self {
            patches: OrdMap::new(),
            errors: OrdMap::new(),
            next_version: self.next_version,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn build_patch_payload(
        &self,
        record_id: &str,
        options: PayloadOptions,
    ) -> Option<RecordPatchPayload> {
        self.patches
            .get(record_id)
            .and_then(|patch| build_patch_payload(record_id, patch, options))
    }

    pub fn has_pending(&self, record_id: &str) -> bool {
        self.patches.contains_key(record_id)
    }

    pub fn pending_count(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn patch(&self, record_id: &str) -> Option<&Patch> {
        self.patches.get(record_id)
    }

    pub fn pending_value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.patch(&path.record_id)
            .and_then(|patch| patch.get(&path.location))
    }

    pub fn pending_record_ids(&self) -> Vec<RecordId> {
        self.patches.keys().cloned().collect()
    }

    pub fn patches(&self) -> impl Iterator<Item = (&RecordId, &Patch)> {
        self.patches.iter()
    }

    pub fn error(&self, record_id: &str) -> Option<&ErrorInfo> {
        self.errors.get(record_id)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&RecordId, &ErrorInfo)> {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_returns_a_new_store() {
        let empty = PendingEditStore::new();
        let staged = empty.queue_top_level_edit("r1", "bmk", "ABC");

        assert!(!empty.has_pending("r1"));
        assert!(staged.has_pending("r1"));
        assert_eq!(staged.pending_count(), 1);
        assert_eq!(
            staged.pending_value(&FieldPath::new("r1", FieldLocation::top("bmk"))),
            Some(&FieldValue::from("ABC"))
        );
    }

    #[test]
    fn every_change_bumps_the_version() {
        let first = PendingEditStore::new().queue_top_level_edit("r1", "bmk", "A");
        let second = first.queue_sub_object_edit("r1", "mass", 3i64);
        let v1 = first.patch("r1").unwrap().version();
        let v2 = second.patch("r1").unwrap().version();
        assert!(v2 > v1);
        assert_eq!(first.patch("r1").unwrap().version(), v1);
    }

    #[test]
    fn queue_clears_existing_error() {
        let store = PendingEditStore::new()
            .queue_top_level_edit("r1", "bmk", "A")
            .with_error("r1", ErrorInfo::with_message("rejected"));
        assert!(store.error("r1").is_some());

        let edited = store.queue_top_level_edit("r1", "bmk", "B");
        assert!(edited.error("r1").is_none());
        assert!(store.error("r1").is_some());
    }

    #[test]
    fn sub_item_edits_accumulate_per_item() {
        let store = PendingEditStore::new()
            .queue_sub_item_edit("r1", "s1", "key", "K1")
            .queue_sub_item_edit("r1", "s1", "label", "L1")
            .queue_sub_item_edit("r1", "s2", "key", "K2");
        let patch = store.patch("r1").unwrap();
        assert_eq!(patch.sub_item("s1").unwrap().len(), 2);
        assert_eq!(patch.sub_item("s2").unwrap().len(), 1);
    }

    #[test]
    fn no_pending_means_no_payload() {
        let store = PendingEditStore::new();
        assert!(store.build_patch_payload("r1", PayloadOptions::default()).is_none());
    }

    #[test]
    fn empty_patch_is_never_retained() {
        let store = PendingEditStore::new().with_patch("r1", Patch::default());
        assert!(!store.has_pending("r1"));
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn discard_record_and_all() {
        let store = PendingEditStore::new()
            .queue_top_level_edit("r1", "a", "1")
            .queue_top_level_edit("r2", "a", "2")
            .with_error("r2", ErrorInfo::with_message("x"));

        let one_left = store.discard_record("r2");
        assert_eq!(one_left.pending_record_ids(), vec!["r1".to_string()]);
        assert!(one_left.error("r2").is_none());

        let none_left = store.discard_all();
        assert_eq!(none_left.pending_count(), 0);
        assert_eq!(none_left.errors().count(), 0);

        let requeued = none_left.queue_top_level_edit("r1", "a", "3");
        assert!(requeued.patch("r1").unwrap().version() > store.patch("r1").unwrap().version());
    }
}
