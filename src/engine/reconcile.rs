use super::gate::{Submission, SubmittedRecord, index_records};
use super::outcome::{ReconcileWarning, RecordOutcome, RecordStatus};
use super::summary::SaveSummary;
use super::transport::{BatchResponse, BatchResultItem};
use crate::core::{FailureKind, FieldMap, Record};
use crate::path::{ErrorInfo, classify};
use crate::pending::{Patch, PendingEditStore, sub_object_wire_value};
use std::collections::HashMap;
use tracing::{debug, warn};

pub const NO_RESULT_MESSAGE: &str = "no result returned for record";
pub const DEFAULT_FAILURE_MESSAGE: &str = "update failed";

/// Result of applying one batch response.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub store: PendingEditStore,
    pub updated_records: Vec<Record>,
    pub records: Vec<RecordOutcome>,
    pub warnings: Vec<ReconcileWarning>,
    pub summary: SaveSummary,
}

/// Which of the sent fields the server accepted, and what to show for the rest.
struct Verdict {
    accepted: Patch,
    status: RecordStatus,
    error: Option<ErrorInfo>,
}

fn judge(submitted: &SubmittedRecord, result: Option<&BatchResultItem>) -> Verdict {
    let Some(result) = result else {
        warn!(
            record_id = %submitted.record_id,
            "batch response has no result for submitted record"
        );
        return Verdict {
            accepted: Patch::default(),
            status: RecordStatus::Failed {
                kind: FailureKind::ServerRecord,
                message: Some(NO_RESULT_MESSAGE.to_string()),
            },
            error: Some(ErrorInfo::with_message(NO_RESULT_MESSAGE)),
        };
    };

    if let Some(fields) = result.field_errors() {
        let error = ErrorInfo::from_field_errors(result.error.clone(), fields.clone());
        let classification = classify(fields.keys().map(String::as_str));

        if classification.has_unrecognized() {
            warn!(
                record_id = %submitted.record_id,
                keys = ?classification.unrecognized,
                "unrecognised error keys, keeping every edit pending"
            );
            return Verdict {
                accepted: Patch::default(),
                status: RecordStatus::Failed {
                    kind: FailureKind::ServerField,
                    message: result.error.clone(),
                },
                error: Some(error),
            };
        }

        let mut accepted = Patch::default();
        for (location, value) in submitted.sent.entries() {
            if !classification.fails(&location) {
                accepted.set(location, value.clone());
            }
        }

        let status = if accepted.is_empty() {
            RecordStatus::Failed {
                kind: FailureKind::ServerField,
                message: result.error.clone(),
            }
        } else {
            RecordStatus::PartiallySaved {
                failed_fields: fields.keys().cloned().collect(),
            }
        };
        return Verdict {
            accepted,
            status,
            error: Some(error),
        };
    }

    if result.success {
        return Verdict {
            accepted: submitted.sent.clone(),
            status: RecordStatus::Saved,
            error: None,
        };
    }

    let message = result
        .error
        .clone()
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
    Verdict {
        accepted: Patch::default(),
        status: RecordStatus::Failed {
            kind: FailureKind::ServerRecord,
            message: Some(message.clone()),
        },
        error: Some(ErrorInfo::with_message(message)),
    }
}

/// Copy of `record` with every accepted field applied.
fn merge_accepted(
    record: &Record,
    accepted: &Patch,
    warnings: &mut Vec<ReconcileWarning>,
) -> Record {
    let mut merged = record.clone();

    for (field, value) in accepted.top_level() {
        merged.fields.insert(field.clone(), value.clone());
    }

    if !accepted.sub_object().is_empty() {
        let sub_object = merged.sub_object.get_or_insert_with(FieldMap::new);
        for (field, value) in accepted.sub_object() {
            sub_object.insert(field.clone(), sub_object_wire_value(value));
        }
    }

    for (sub_item_id, fields) in accepted.sub_items() {
        match merged.sub_item_mut(sub_item_id) {
            Some(item) => {
                for (field, value) in fields {
                    item.fields.insert(field.clone(), value.clone());
                }
            }
            None => {
                warn!(
                    record_id = %record.id,
                    sub_item_id = %sub_item_id,
                    "confirmed sub-item edit has no canonical sub-item, dropping it"
                );
                warnings.push(ReconcileWarning::MissingSubItem {
                    record_id: record.id.clone(),
                    sub_item_id: sub_item_id.clone(),
                });
            }
        }
    }

    merged
}

/// Removes the accepted fields from the record's current patch.
///
/// When the patch is the one that was submitted the accepted locations go
/// unconditionally. When it changed in flight only entries still holding the
/// value that was sent are dropped; anything restaged stays pending.
fn narrow(
    store: PendingEditStore,
    submitted: &SubmittedRecord,
    accepted: &Patch,
) -> PendingEditStore {
    let Some(current) = store.patch(&submitted.record_id) else {
        debug!(record_id = %submitted.record_id, "record discarded while the batch was in flight");
        return store;
    };
    if accepted.is_empty() {
        return store;
    }

    let narrowed = if current.version() == submitted.version {
        current.without_locations(accepted)
    } else {
        debug!(
            record_id = %submitted.record_id,
            submitted_version = submitted.version,
            current_version = current.version(),
            "retaining edits staged while the batch was in flight"
        );
        current.without_confirmed(accepted)
    };

    if narrowed.field_count() == current.field_count() {
        return store;
    }
    store.with_patch(&submitted.record_id, narrowed)
}

/// Applies a batch response to the current store.
///
/// `store` is the store as it is now, which may hold edits queued after the
/// submission was captured. `canonical` is the caller's snapshot; records
/// missing from it are reconciled but produce no updated copy.
pub fn reconcile(
    store: &PendingEditStore,
    submission: &Submission,
    response: &BatchResponse,
    canonical: &[Record],
) -> Reconciliation {
    let canonical = index_records(canonical);
    let mut warnings = Vec::new();

    let mut results: HashMap<&str, &BatchResultItem> = HashMap::new();
    for item in &response.results {
        if submission.get(&item.record_id).is_none() {
            warn!(
                record_id = %item.record_id,
                "ignoring result for a record that was not submitted"
            );
            warnings.push(ReconcileWarning::UnexpectedResult {
                record_id: item.record_id.clone(),
            });
            continue;
        }
        results.entry(item.record_id.as_str()).or_insert(item);
    }

    let mut next = store.clone();
    let mut updated_records = Vec::new();
    let mut records = Vec::with_capacity(submission.len());

    for submitted in &submission.records {
        let record_id = submitted.record_id.as_str();
        let verdict = judge(submitted, results.get(record_id).copied());

        if !verdict.accepted.is_empty() {
            match canonical.get(record_id) {
                Some(record) => {
                    updated_records.push(merge_accepted(record, &verdict.accepted, &mut warnings))
                }
                None => debug!(record_id, "no canonical record to merge into"),
            }
        }

        next = narrow(next, submitted, &verdict.accepted);

        let error = match verdict.error {
            Some(info) if next.has_pending(record_id) => {
                next = next.with_error(record_id, info.clone());
                Some(info)
            }
            _ => {
                next = next.clear_error(record_id);
                None
            }
        };

        records.push(RecordOutcome {
            record_id: submitted.record_id.clone(),
            status: verdict.status,
            error,
        });
    }

    let summary = SaveSummary::from_outcomes(&records);
    debug!(
        saved = summary.fully_succeeded,
        partial = summary.partially_succeeded,
        failed = summary.failed,
        "reconciled batch response"
    );

    Reconciliation {
        store: next,
        updated_records,
        records,
        warnings,
        summary,
    }
}
