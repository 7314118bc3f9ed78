//! Errors reported across the host boundary

use kdfbridge_scrypt::{ScryptError, ScryptErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a [`NativeError`], as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeErrorKind {
    /// A derivation parameter failed validation
    InvalidParameter,
    /// Working memory could not be obtained
    AllocationFailure,
    /// The primitive failed, or panicked, for any other reason
    InternalFailure,
    /// The call's arguments had the wrong shape or encoding
    InvalidArgument,
    /// No handler for the requested method name
    UnknownMethod,
}

/// Error returned to the host in place of a result
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct NativeError {
    /// What went wrong
    pub kind: NativeErrorKind,
    /// Human-readable description, free of secret material
    pub message: String,
}

impl NativeError {
    /// Create an error of `kind`
    #[must_use]
    pub fn new(kind: NativeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an `invalid_argument` error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::InvalidArgument, message)
    }

    /// Create an `unknown_method` error for `method`
    #[must_use]
    pub fn unknown_method(method: &str) -> Self {
        Self::new(NativeErrorKind::UnknownMethod, format!("No method {method}"))
    }

    /// Create an `internal_failure` error
    #[must_use]
    pub fn internal_failure(message: impl Into<String>) -> Self {
        Self::new(NativeErrorKind::InternalFailure, message)
    }
}

impl From<ScryptError> for NativeError {
    fn from(error: ScryptError) -> Self {
        let kind = match error.kind() {
            ScryptErrorKind::InvalidParameter => NativeErrorKind::InvalidParameter,
            ScryptErrorKind::AllocationFailure => NativeErrorKind::AllocationFailure,
            ScryptErrorKind::Internal => NativeErrorKind::InternalFailure,
        };
        Self::new(kind, error.to_string())
    }
}

/// Result type for boundary calls
pub type Result<T> = std::result::Result<T, NativeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrypt_errors_keep_their_category() {
        let cases = [
            (
                ScryptError::invalid_parameter("N must be a power of two"),
                NativeErrorKind::InvalidParameter,
            ),
            (
                ScryptError::allocation_failure(1 << 20),
                NativeErrorKind::AllocationFailure,
            ),
            (
                ScryptError::internal("output length mismatch"),
                NativeErrorKind::InternalFailure,
            ),
        ];
        for (error, kind) in cases {
            assert_eq!(NativeError::from(error).kind, kind);
        }
    }

    #[test]
    fn serializes_kind_and_message() {
        let json = serde_json::to_value(NativeError::unknown_method("fetch")).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({"kind": "UnknownMethod", "message": "No method fetch"})
        );
    }
}
