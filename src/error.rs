//! Error types for the paranoid record engine
//!
//! Expected outcomes (a hook veto, a validation reject) are reported through
//! [`OperationStatus`](crate::lifecycle::OperationStatus), not through this
//! enum. Errors here are hard faults: storage failures, transaction failures,
//! and misconfiguration caught at registration time.

use thiserror::Error;

/// Result type alias for engine operations
pub type ParanoidResult<T> = Result<T, ParanoidError>;

/// Hard faults raised by the engine
#[derive(Error, Debug, Clone)]
pub enum ParanoidError {
    /// The persistence backend reported a fault
    #[error("Storage error: {0}")]
    Storage(String),

    /// Transaction begin/commit/rollback failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Invalid paranoid column or association configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A record type or polymorphic discriminator is not registered
    #[error("Unknown record type: {0}")]
    UnknownType(String),

    /// Lifecycle operation invoked on a type without a paranoid column
    #[error("Record type '{0}' is not paranoid")]
    NotParanoid(String),

    /// The record has no usable primary key value
    #[error("Primary key is missing or null on record of type '{0}'")]
    MissingPrimaryKey(String),

    /// Mutation attempted on a record frozen by a permanent destroy
    #[error("Record of type '{0}' is frozen after permanent destroy")]
    RecordFrozen(String),
}

// Convert from anyhow errors raised by backend implementations
impl From<anyhow::Error> for ParanoidError {
    fn from(err: anyhow::Error) -> Self {
        ParanoidError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParanoidError::Configuration("deleted_value requires Text column".to_string());
        assert!(format!("{}", err).contains("Configuration error"));

        let err = ParanoidError::UnknownType("Comment".to_string());
        assert_eq!(format!("{}", err), "Unknown record type: Comment");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: ParanoidError = anyhow::anyhow!("connection refused").into();
        match err {
            ParanoidError::Storage(msg) => assert!(msg.contains("connection refused")),
            _ => panic!("Expected storage error"),
        }
    }
}
