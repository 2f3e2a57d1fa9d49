// ============================================================================
// batchedit Library
// ============================================================================

//! Partial-failure batch edit reconciliation.
//!
//! Stage field edits across many records, submit them as one batch, and fold
//! the per-record results back: accepted fields are merged into copies of the
//! caller's records, rejected ones stay pending, and nothing edited while the
//! batch was in flight is lost.
//!
//! # Examples
//!
//! ```
//! use batchedit::{
//!     BatchResponse, BatchResultItem, BatchTransport, EditSession, Record,
//!     RecordPatchPayload, SessionConfig, TransportError,
//! };
//! use std::sync::Arc;
//!
//! struct AcceptAll;
//!
//! #[async_trait::async_trait]
//! impl BatchTransport for AcceptAll {
//!     async fn submit_batch(
//!         &self,
//!         payloads: Vec<RecordPatchPayload>,
//!     ) -> Result<BatchResponse, TransportError> {
//!         Ok(BatchResponse::from_results(
//!             payloads.into_iter().map(|p| BatchResultItem::success(p.id)).collect(),
//!         ))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let session = EditSession::new(SessionConfig::new("project-1"), Arc::new(AcceptAll));
//! session.queue_top_level_edit("r1", "bmk", "ABC");
//!
//! let canonical = vec![Record::new("r1").with_field("bmk", "old")];
//! let outcome = session.save_all_pending(&canonical).await?;
//!
//! assert!(!session.has_pending("r1"));
//! assert_eq!(outcome.updated_records[0].field("bmk").and_then(|v| v.as_str()), Some("ABC"));
//! # Ok::<(), batchedit::ReconcileError>(())
//! # }).unwrap();
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod path;
pub mod pending;
pub mod persist;
pub mod session;
pub mod validate;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use crate::core::{
    FailureKind, FieldMap, FieldValue, Record, RecordId, ReconcileError, Result, SubItem,
    SubItemId, TransportError,
};
pub use engine::{
    BatchResponse, BatchResultItem, BatchTransport, LogNotificationSink, Notification,
    NotificationLevel, NotificationSink, ReconcileWarning, RecordOutcome, RecordStatus,
    SaveOptions, SaveOutcome, SaveSummary, SubmissionState,
};
pub use path::{ErrorInfo, FieldGroup, FieldLocation, FieldPath, Scope};
pub use pending::{Patch, PayloadOptions, PendingEditStore, RecordPatch, RecordPatchPayload};
pub use persist::{FileScopedStorage, InMemoryScopedStorage, PersistenceAdapter, ScopedStorage};
pub use session::EditSession;
pub use validate::{FieldSelector, LocalValidator, ValidationMode, ValidationRule};
