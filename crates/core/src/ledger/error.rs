//! Transaction engine error types.

use ledgerkit_shared::{MoneyError, TransactionId};
use thiserror::Error;

use super::transaction::TransactionStatus;
use crate::store::StoreError;
use crate::validation::ValidationFailed;

/// Errors that can occur during transaction processing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Validation found at least one error-severity finding.
    ///
    /// Carries every finding so callers can fix all problems in one pass.
    #[error("transaction {id}: {source}")]
    Validation {
        /// The offending transaction.
        id: TransactionId,
        /// The aggregate of findings.
        #[source]
        source: ValidationFailed,
    },

    /// The transaction is not in a status that allows the operation.
    #[error("transaction {id} must be in Draft or Pending status, was {status:?}")]
    InvalidStatus {
        /// The offending transaction.
        id: TransactionId,
        /// Its current status.
        status: TransactionStatus,
    },

    /// Void was called on an already-voided transaction.
    #[error("transaction {0} is already voided")]
    AlreadyVoided(TransactionId),

    /// Reverse was called on an already-reversed transaction.
    #[error("transaction {0} is already reversed")]
    AlreadyReversed(TransactionId),

    /// Only posted transactions can be voided.
    #[error("cannot void transaction {id}: status is {status:?}, not Posted")]
    CannotVoidNonPosted {
        /// The offending transaction.
        id: TransactionId,
        /// Its current status.
        status: TransactionStatus,
    },

    /// Only posted transactions can be reversed.
    #[error("cannot reverse transaction {id}: status is {status:?}, not Posted")]
    CannotReverseNonPosted {
        /// The offending transaction.
        id: TransactionId,
        /// Its current status.
        status: TransactionStatus,
    },

    /// A store operation failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Monetary arithmetic failed (e.g. mixed currencies in a summary).
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// The operation observed cancellation.
    #[error("operation {operation} was cancelled")]
    Cancelled {
        /// The cancelled operation's name.
        operation: &'static str,
    },
}

impl LedgerError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_FAILED",
            Self::InvalidStatus { .. } => "INVALID_STATUS",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::CannotVoidNonPosted { .. } => "CANNOT_VOID_NON_POSTED",
            Self::CannotReverseNonPosted { .. } => "CANNOT_REVERSE_NON_POSTED",
            Self::Storage(inner) => inner.error_code(),
            Self::Money(inner) => inner.error_code(),
            Self::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Returns true if retrying can succeed.
    ///
    /// Only a stale-version store conflict warrants a retry of the whole
    /// read-modify-write cycle; validation and business failures are
    /// deterministic.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(inner) if inner.is_retryable())
    }
}
