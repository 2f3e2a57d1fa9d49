use crate::config::SessionConfig;
use crate::core::{FieldValue, Record, RecordId, ReconcileError, Result};
use crate::engine::{
    BatchTransport, LogNotificationSink, Notification, NotificationSink, SaveOptions, SaveOutcome,
    SubmissionState, gate, reconcile,
};
use crate::path::{ErrorInfo, ErrorKey, FieldLocation, FieldPath};
use crate::pending::{PendingEditStore, RecordPatchPayload};
use crate::persist::{PersistenceAdapter, ScopedStorage};
use crate::validate::LocalValidator;
use std::slice;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// One user's editing session over a scope of records.
///
/// Edits are staged synchronously and mirrored to storage in the background.
/// Saves take `&self`, so edits can keep arriving while a batch is in flight;
/// the store lock is never held across an await.
pub struct EditSession {
    config: SessionConfig,
    state: Mutex<PendingEditStore>,
    transport: Arc<dyn BatchTransport>,
    validator: LocalValidator,
    notifier: Arc<dyn NotificationSink>,
    persistence: Option<PersistenceAdapter>,
}

impl EditSession {
    pub fn new(config: SessionConfig, transport: Arc<dyn BatchTransport>) -> Self {
        Self {
            config,
            state: Mutex::new(PendingEditStore::new()),
            transport,
            validator: LocalValidator::new(),
            notifier: Arc::new(LogNotificationSink),
            persistence: None,
        }
    }

    pub fn with_validator(mut self, validator: LocalValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Attaches durable storage and restores any fresh snapshot for this
    /// scope. A failed restore is logged and the session keeps its current
    /// edits. The configuration is checked first, since it names the storage
    /// key and the snapshot age limit.
    pub async fn with_storage(mut self, storage: Arc<dyn ScopedStorage>) -> Result<Self> {
        self.config.validate().map_err(ReconcileError::InvalidConfig)?;
        let adapter = PersistenceAdapter::new(
            storage,
            self.config.storage_key(),
            self.config.max_snapshot_age,
        );
        match adapter.restore().await {
            Ok(Some(restored)) => {
                *self.lock() = restored;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(key = adapter.key(), error = %err, "failed to restore pending edits");
            }
        }
        self.persistence = Some(adapter);
        Ok(self)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PendingEditStore> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the store and queues a snapshot while still holding the lock,
    /// so snapshots reach the writer in mutation order.
    fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&PendingEditStore) -> PendingEditStore,
    {
        let mut state = self.lock();
        *state = mutate(&*state);
        if let Some(persistence) = &self.persistence {
            persistence.snapshot(&state);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Copy of the current store. Cheap: the maps are shared.
    pub fn store(&self) -> PendingEditStore {
        self.lock().clone()
    }

    pub fn has_pending(&self, record_id: &str) -> bool {
        self.lock().has_pending(record_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending_count()
    }

    pub fn pending_record_ids(&self) -> Vec<RecordId> {
        self.lock().pending_record_ids()
    }

    fn pending_at(&self, record_id: &str, location: FieldLocation) -> Option<FieldValue> {
        self.lock()
            .pending_value(&FieldPath::new(record_id, location))
            .cloned()
    }

    pub fn is_field_dirty(&self, record_id: &str, field: &str) -> bool {
        self.get_pending_value(record_id, field).is_some()
    }

    pub fn is_sub_object_field_dirty(&self, record_id: &str, field: &str) -> bool {
        self.get_sub_object_pending_value(record_id, field).is_some()
    }

    pub fn is_sub_item_field_dirty(&self, record_id: &str, sub_item_id: &str, field: &str) -> bool {
        self.get_sub_item_pending_value(record_id, sub_item_id, field)
            .is_some()
    }

    pub fn get_pending_value(&self, record_id: &str, field: &str) -> Option<FieldValue> {
        self.pending_at(record_id, FieldLocation::top(field))
    }

    pub fn get_sub_object_pending_value(&self, record_id: &str, field: &str) -> Option<FieldValue> {
        self.pending_at(record_id, FieldLocation::sub_object(field))
    }

    pub fn get_sub_item_pending_value(
        &self,
        record_id: &str,
        sub_item_id: &str,
        field: &str,
    ) -> Option<FieldValue> {
        self.pending_at(record_id, FieldLocation::sub_item(sub_item_id, field))
    }

    /// First error for `field`, tried bare, then as `record.<field>`, then as
    /// `subobject.<field>`.
    pub fn get_field_error(&self, record_id: &str, field: &str) -> Option<String> {
        self.lock()
            .error(record_id)
            .and_then(|info| info.field_error(field))
            .map(str::to_string)
    }

    pub fn get_sub_item_field_error(
        &self,
        record_id: &str,
        sub_item_id: &str,
        field: &str,
    ) -> Option<String> {
        self.lock()
            .error(record_id)
            .and_then(|info| info.sub_item_field_error(sub_item_id, field))
            .map(str::to_string)
    }

    pub fn error_info(&self, record_id: &str) -> Option<ErrorInfo> {
        self.lock().error(record_id).cloned()
    }

    /// The wire patch a save would send for `record_id` right now.
    pub fn patch_payload(&self, record_id: &str) -> Result<RecordPatchPayload> {
        let options = self.default_options().payload_options();
        self.lock()
            .build_patch_payload(record_id, options)
            .ok_or_else(|| ReconcileError::UnknownRecord(record_id.to_string()))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn queue_top_level_edit(&self, record_id: &str, field: &str, value: impl Into<FieldValue>) {
        self.queue_edit(&FieldPath::new(record_id, FieldLocation::top(field)), value.into());
    }

    pub fn queue_sub_object_edit(
        &self,
        record_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) {
        self.queue_edit(
            &FieldPath::new(record_id, FieldLocation::sub_object(field)),
            value.into(),
        );
    }

    pub fn queue_sub_item_edit(
        &self,
        record_id: &str,
        sub_item_id: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) {
        self.queue_edit(
            &FieldPath::new(record_id, FieldLocation::sub_item(sub_item_id, field)),
            value.into(),
        );
    }

    pub fn queue_edit(&self, path: &FieldPath, value: FieldValue) {
        self.update(|store| store.queue_edit(path, value));
    }

    /// Stages an edit addressed by its wire key (`record.bmk`,
    /// `subitems.4.key`, ...). Group keys are not editable.
    pub fn queue_edit_by_key(&self, record_id: &str, key: &str, value: FieldValue) -> Result<()> {
        match ErrorKey::parse(key)? {
            ErrorKey::Field(location) => {
                self.queue_edit(&FieldPath::new(record_id, location), value);
                Ok(())
            }
            ErrorKey::Group(_) => Err(ReconcileError::InvalidFieldPath(key.to_string())),
        }
    }

    pub fn discard_record(&self, record_id: &str) {
        self.update(|store| store.discard_record(record_id));
    }

    pub fn discard_all(&self) {
        self.update(PendingEditStore::discard_all);
    }

    // ========================================================================
    // Actions
    // ========================================================================

    fn default_options(&self) -> SaveOptions {
        SaveOptions {
            include_sub_items: self.config.include_sub_items,
            mode: self.config.validation_mode,
        }
    }

    /// Submits every record with pending edits as one batch.
    pub async fn save_all_pending(&self, canonical: &[Record]) -> Result<SaveOutcome> {
        let record_ids = self.pending_record_ids();
        self.save_records_with(canonical, &record_ids, self.default_options())
            .await
    }

    /// Submits one record's pending edits as a batch of one.
    pub async fn save_record(&self, record: &Record) -> Result<SaveOutcome> {
        self.save_records_with(
            slice::from_ref(record),
            slice::from_ref(&record.id),
            self.default_options(),
        )
        .await
    }

    /// Gates, submits and reconciles the pending edits of `record_ids`.
    ///
    /// A transport failure leaves every edit pending and is returned as
    /// `ReconcileError::Transport`. Per-record failures are reported in the
    /// outcome.
    pub async fn save_records_with(
        &self,
        canonical: &[Record],
        record_ids: &[RecordId],
        options: SaveOptions,
    ) -> Result<SaveOutcome> {
        let gated = {
            let mut state = self.lock();
            let gated = gate(&state, canonical, record_ids, &self.validator, options);
            *state = gated.store.clone();
            gated
        };

        if gated.submission.is_empty() {
            if !gated.rejected.is_empty() {
                info!(
                    rejected = gated.rejected.len(),
                    "every record failed local validation, nothing sent"
                );
                self.notifier.notify(Notification::warning(format!(
                    "Nothing saved: {} records failed validation",
                    gated.rejected.len()
                )));
            } else {
                debug!("no pending edits to save");
            }
            return Ok(SaveOutcome::aborted(gated.rejected));
        }

        let submission = gated.submission;
        info!(
            records = submission.len(),
            rejected = gated.rejected.len(),
            "submitting batch"
        );

        let response = match self.transport.submit_batch(submission.payloads()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    error = %err,
                    records = submission.len(),
                    "batch submission failed, keeping all edits"
                );
                self.notifier.notify(Notification::error(format!("Save failed: {err}")));
                return Err(err.into());
            }
        };

        let reconciliation = {
            let mut state = self.lock();
            let reconciliation = reconcile(&state, &submission, &response, canonical);
            *state = reconciliation.store.clone();
            if let Some(persistence) = &self.persistence {
                persistence.snapshot(&state);
            }
            reconciliation
        };

        self.notifier.notify(reconciliation.summary.notification());

        let mut records = reconciliation.records;
        records.extend(gated.rejected);
        Ok(SaveOutcome {
            state: SubmissionState::Reconciled,
            updated_records: reconciliation.updated_records,
            records,
            summary: reconciliation.summary,
            warnings: reconciliation.warnings,
        })
    }

    /// Waits until every queued snapshot write has reached storage.
    pub async fn flush(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.flush().await;
        }
    }
}
