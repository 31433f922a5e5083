//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An entity id was empty.
    #[error("{kind} id cannot be empty")]
    InvalidId {
        /// Entity kind of the offending entity.
        kind: &'static str,
    },

    /// An entity of the same kind and id already exists.
    #[error("{kind} already exists: {id}")]
    DuplicateId {
        /// Entity kind.
        kind: &'static str,
        /// The duplicated id.
        id: String,
    },

    /// No entity of this kind has the requested id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind.
        kind: &'static str,
        /// The missing id.
        id: String,
    },

    /// Version conflict: the caller's copy is stale.
    #[error("optimistic lock on {kind} {id}: stored version {stored}, expected {expected}")]
    OptimisticLock {
        /// Entity kind.
        kind: &'static str,
        /// The contested id.
        id: String,
        /// Version currently stored.
        stored: u64,
        /// Version the caller presented.
        expected: u64,
    },

    /// Snapshot encoding or decoding failed.
    #[error("storage failure for {kind} {id}: {message}")]
    Codec {
        /// Entity kind.
        kind: &'static str,
        /// The affected id.
        id: String,
        /// Underlying serde message.
        message: String,
    },
}

impl StoreError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId { .. } => "INVALID_ID",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::OptimisticLock { .. } => "OPTIMISTIC_LOCK",
            Self::Codec { .. } => "STORAGE",
        }
    }

    /// Returns true if retrying the whole read-modify-write cycle can
    /// succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::OptimisticLock { .. })
    }
}
