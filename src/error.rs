//! Error taxonomy of the slot store
//!
//! Every failure is a decision returned to the caller; a failed operation
//! never leaves a partial write behind.

use thiserror::Error;

use crate::journal::JournalError;

/// Result type for store operations
pub type SwapResult<T> = Result<T, SwapError>;

/// Errors returned by store operations
#[derive(Debug, Error)]
pub enum SwapError {
    /// Referenced record is absent, or not owned by the caller.
    /// The two cases are deliberately indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A business precondition failed
    #[error("rejected: {0}")]
    Rejected(String),

    /// The record is not in a state that allows the operation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored rows contradict each other
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// The transaction could not be made durable and was not applied
    #[error("storage error: {0}")]
    Storage(#[from] JournalError),
}

impl SwapError {
    pub(crate) fn rejected(msg: impl Into<String>) -> Self {
        SwapError::Rejected(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        SwapError::Conflict(msg.into())
    }

    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        SwapError::Integrity(msg.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            SwapError::NotFound(_) => "NOT_FOUND",
            SwapError::Rejected(_) => "REJECTED",
            SwapError::Conflict(_) => "CONFLICT",
            SwapError::Integrity(_) => "INTEGRITY_ERROR",
            SwapError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
