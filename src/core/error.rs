use thiserror::Error;

/// Failure of the batch call itself: the request never produced per-record
/// results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed batch response: {0}")]
    Decode(String),

    #[error("Batch rejected by server: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Batch transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid field path '{0}'")]
    InvalidFieldPath(String),

    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("Record '{0}' has no pending edits")]
    UnknownRecord(String),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Where a per-record failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A local invariant failed; the record never reached the network.
    ClientValidation,
    /// The server rejected specific fields of an otherwise processed record.
    ServerField,
    /// The server rejected the whole record without field detail.
    ServerRecord,
    /// The batch call failed as a whole.
    Transport,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ClientValidation => "client_validation",
            Self::ServerField => "server_field",
            Self::ServerRecord => "server_record",
            Self::Transport => "transport",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts_into_reconcile_error() {
        let err: ReconcileError = TransportError::Network("connection reset".into()).into();
        assert!(matches!(err, ReconcileError::Transport(_)));
        assert_eq!(
            err.to_string(),
            "Batch transport failed: Network error: connection reset"
        );
    }

    #[test]
    fn failure_kind_labels() {
        assert_eq!(FailureKind::ServerField.to_string(), "server_field");
        assert_eq!(FailureKind::ClientValidation.to_string(), "client_validation");
    }
}
