use super::outcome::{RecordOutcome, RecordStatus};
use crate::core::{FailureKind, Record, RecordId};
use crate::pending::{Patch, PayloadOptions, PendingEditStore, RecordPatchPayload};
use crate::validate::{LocalValidator, ValidationContext, ValidationMode};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Per-save switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub include_sub_items: bool,
    pub mode: ValidationMode,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            include_sub_items: true,
            mode: ValidationMode::Edit,
        }
    }
}

impl SaveOptions {
    pub fn payload_options(&self) -> PayloadOptions {
        PayloadOptions {
            include_sub_items: self.include_sub_items,
        }
    }
}

/// What was sent for one record, captured before dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRecord {
    pub record_id: RecordId,
    /// Store version of the patch at capture time.
    pub version: u64,
    /// The outgoing part of the patch, exactly as sent.
    pub sent: Patch,
    pub payload: RecordPatchPayload,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub records: Vec<SubmittedRecord>,
}

impl Submission {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, record_id: &str) -> Option<&SubmittedRecord> {
        self.records.iter().find(|record| record.record_id == record_id)
    }

    pub fn payloads(&self) -> Vec<RecordPatchPayload> {
        self.records.iter().map(|record| record.payload.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct GateResult {
    /// Input store with local validation errors recorded.
    pub store: PendingEditStore,
    pub submission: Submission,
    pub rejected: Vec<RecordOutcome>,
}

pub(crate) fn index_records(records: &[Record]) -> HashMap<&str, &Record> {
    records.iter().map(|record| (record.id.as_str(), record)).collect()
}

/// Validates the outgoing part of every candidate's patch and captures the
/// ones that pass. Candidates with nothing to send are skipped silently.
pub fn gate(
    store: &PendingEditStore,
    canonical: &[Record],
    candidates: &[RecordId],
    validator: &LocalValidator,
    options: SaveOptions,
) -> GateResult {
    let canonical = index_records(canonical);
    let mut next = store.clone();
    let mut submission = Submission::default();
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for record_id in candidates {
        if !seen.insert(record_id.as_str()) {
            continue;
        }
        let Some(patch) = store.patch(record_id) else {
            continue;
        };
        let outgoing = patch.outgoing(options.include_sub_items);
        if outgoing.is_empty() {
            continue;
        }

        let ctx = ValidationContext::new(canonical.get(record_id.as_str()).copied(), options.mode);
        if let Some(info) = validator.validate(record_id, &outgoing, &ctx) {
            next = next.with_error(record_id, info.clone());
            rejected.push(RecordOutcome {
                record_id: record_id.clone(),
                status: RecordStatus::Failed {
                    kind: FailureKind::ClientValidation,
                    message: info.message.clone(),
                },
                error: Some(info),
            });
            continue;
        }

        let Some(payload) = store.build_patch_payload(record_id, options.payload_options()) else {
            continue;
        };
        submission.records.push(SubmittedRecord {
            record_id: record_id.clone(),
            version: patch.version(),
            sent: outgoing,
            payload,
        });
    }

    debug!(
        submitted = submission.len(),
        rejected = rejected.len(),
        "gated pending edits"
    );
    GateResult {
        store: next,
        submission,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::FieldSelector;

    fn ids(ids: &[&str]) -> Vec<RecordId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn violating_records_are_held_back() {
        let store = PendingEditStore::new()
            .queue_top_level_edit("r1", "bmk", "12345678901")
            .queue_top_level_edit("r2", "bmk", "ok");
        let validator = LocalValidator::new().max_length(FieldSelector::top("bmk"), 10);

        let gated = gate(&store, &[], &ids(&["r1", "r2"]), &validator, SaveOptions::default());

        assert_eq!(gated.submission.len(), 1);
        assert!(gated.submission.get("r2").is_some());
        assert_eq!(gated.rejected.len(), 1);
        assert_eq!(
            gated.store.error("r1").and_then(|info| info.field_error("bmk")),
            Some("must be at most 10 characters")
        );
        assert!(store.error("r1").is_none());
    }

    #[test]
    fn captures_version_and_outgoing_patch() {
        let store = PendingEditStore::new()
            .queue_top_level_edit("r1", "bmk", "A")
            .queue_sub_item_edit("r1", "s1", "key", "K");
        let options = SaveOptions {
            include_sub_items: false,
            ..SaveOptions::default()
        };

        let gated = gate(&store, &[], &ids(&["r1"]), &LocalValidator::new(), options);
        let submitted = gated.submission.get("r1").unwrap();

        assert_eq!(submitted.version, store.patch("r1").unwrap().version());
        assert_eq!(submitted.sent.field_count(), 1);
        assert!(submitted.payload.patch.sub_items.is_empty());
    }

    #[test]
    fn nothing_to_send_is_skipped() {
        let store = PendingEditStore::new().queue_sub_item_edit("r1", "s1", "key", "K");
        let options = SaveOptions {
            include_sub_items: false,
            ..SaveOptions::default()
        };
        let gated = gate(
            &store,
            &[],
            &ids(&["r1", "missing", "r1"]),
            &LocalValidator::new(),
            options,
        );
        assert!(gated.submission.is_empty());
        assert!(gated.rejected.is_empty());
    }
}
