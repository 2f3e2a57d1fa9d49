pub mod error;
pub mod record;
pub mod value;

pub use error::{FailureKind, ReconcileError, Result, TransportError};
pub use record::{Record, RecordId, SubItem, SubItemId};
pub use value::{FieldMap, FieldValue};
