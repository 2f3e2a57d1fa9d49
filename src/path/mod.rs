//! Field addressing shared by payload building, validation and server error
//! parsing.

mod classify;
mod error_info;
mod field_path;

pub use classify::{FailureClassification, classify};
pub use error_info::ErrorInfo;
pub use field_path::{
    ErrorKey, FieldGroup, FieldLocation, FieldPath, RECORD_PREFIX, SUB_ITEMS_PREFIX,
    SUB_OBJECT_PREFIX, Scope,
};
