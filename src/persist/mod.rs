//! Durable mirror of the pending edit store.

pub mod adapter;
pub mod file;
pub mod snapshot;
pub mod storage;
pub mod writer;

pub use adapter::PersistenceAdapter;
pub use file::FileScopedStorage;
pub use snapshot::{PendingSnapshot, StagedRecordEdits};
pub use storage::{InMemoryScopedStorage, ScopedStorage};
pub use writer::SnapshotWriter;
