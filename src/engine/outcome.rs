use super::summary::SaveSummary;
use crate::core::{FailureKind, Record, RecordId, SubItemId};
use crate::path::ErrorInfo;
use std::fmt;

/// Terminal state of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    /// The batch went out and every result has been applied.
    Reconciled,
    /// Nothing was sent: no pending edits, or every record failed local
    /// validation.
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Saved,
    /// Some submitted fields were merged; `failed_fields` are the keys the
    /// server reported.
    PartiallySaved { failed_fields: Vec<String> },
    Failed {
        kind: FailureKind,
        message: Option<String>,
    },
}

impl RecordStatus {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            RecordStatus::Failed { kind, .. } => Some(*kind),
            RecordStatus::PartiallySaved { .. } => Some(FailureKind::ServerField),
            RecordStatus::Saved => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub record_id: RecordId,
    pub status: RecordStatus,
    /// Error state left on the record, `None` when it was cleared.
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileWarning {
    /// A confirmed sub-item edit targets an item the canonical record no
    /// longer has. The edit is cleared from pending; nothing is merged for it.
    MissingSubItem {
        record_id: RecordId,
        sub_item_id: SubItemId,
    },
    /// The server answered for a record that was not part of the batch.
    UnexpectedResult { record_id: RecordId },
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileWarning::MissingSubItem {
                record_id,
                sub_item_id,
            } => write!(
                f,
                "sub-item '{}' of record '{}' is missing from the canonical snapshot",
                sub_item_id, record_id
            ),
            ReconcileWarning::UnexpectedResult { record_id } => {
                write!(f, "result for unsubmitted record '{}' ignored", record_id)
            }
        }
    }
}

/// Everything a save produced for the caller to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub state: SubmissionState,
    /// Merged copies of canonical records that had at least one field
    /// accepted.
    pub updated_records: Vec<Record>,
    pub records: Vec<RecordOutcome>,
    pub summary: SaveSummary,
    pub warnings: Vec<ReconcileWarning>,
}

impl SaveOutcome {
    pub(crate) fn aborted(rejected: Vec<RecordOutcome>) -> Self {
        Self {
            state: SubmissionState::Aborted,
            updated_records: Vec::new(),
            records: rejected,
            summary: SaveSummary::default(),
            warnings: Vec::new(),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.state == SubmissionState::Aborted
    }

    pub fn record(&self, record_id: &str) -> Option<&RecordOutcome> {
        self.records.iter().find(|outcome| outcome.record_id == record_id)
    }

    pub fn updated_record(&self, record_id: &str) -> Option<&Record> {
        self.updated_records.iter().find(|record| record.id == record_id)
    }
}
