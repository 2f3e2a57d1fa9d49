//! Batch reconciliation: gate staged patches through local validation,
//! capture what is sent, and fold the per-record results back into the
//! pending store and the caller's canonical records.

pub mod gate;
pub mod outcome;
pub mod reconcile;
pub mod summary;
pub mod transport;

pub use gate::{GateResult, SaveOptions, Submission, SubmittedRecord, gate};
pub use outcome::{ReconcileWarning, RecordOutcome, RecordStatus, SaveOutcome, SubmissionState};
pub use reconcile::{DEFAULT_FAILURE_MESSAGE, NO_RESULT_MESSAGE, Reconciliation, reconcile};
pub use summary::{
    LogNotificationSink, Notification, NotificationLevel, NotificationSink, SaveSummary,
};
pub use transport::{BatchResponse, BatchResultItem, BatchTransport};
