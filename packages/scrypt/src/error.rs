//! Error handling for scrypt key derivation

use thiserror::Error;

/// Scrypt derivation errors
///
/// Every failure leaves no output behind: a caller either receives a complete
/// [`DerivedKey`](crate::DerivedKey) or one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScryptError {
    /// A cost parameter, length or input size failed validation.
    /// Raised before any working memory is requested.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Working memory for the derivation could not be obtained
    #[error("Allocation failure: could not obtain {requested} bytes of working memory")]
    AllocationFailure {
        /// Size of the refused request in bytes
        requested: usize,
    },

    /// The primitive failed for a reason not covered above
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse category of a [`ScryptError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScryptErrorKind {
    /// See [`ScryptError::InvalidParameter`]
    InvalidParameter,
    /// See [`ScryptError::AllocationFailure`]
    AllocationFailure,
    /// See [`ScryptError::Internal`]
    Internal,
}

impl ScryptError {
    /// Create an `invalid_parameter` error
    #[must_use]
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create an `allocation_failure` error for a request of `requested` bytes
    #[must_use]
    pub fn allocation_failure(requested: usize) -> Self {
        Self::AllocationFailure { requested }
    }

    /// Create an internal error
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The category of this error
    #[must_use]
    pub fn kind(&self) -> ScryptErrorKind {
        match self {
            Self::InvalidParameter(_) => ScryptErrorKind::InvalidParameter,
            Self::AllocationFailure { .. } => ScryptErrorKind::AllocationFailure,
            Self::Internal(_) => ScryptErrorKind::Internal,
        }
    }
}

/// Result type for scrypt operations
pub type Result<T> = std::result::Result<T, ScryptError>;
