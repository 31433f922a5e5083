//! Reporting error types.

use ledgerkit_shared::{AccountId, MoneyError};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during report calculations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportError {
    /// Entries for one account span more than one currency.
    #[error("account {account_id} has entries in more than one currency")]
    MixedCurrencies {
        /// The account whose history is inconsistent.
        account_id: AccountId,
    },

    /// A ratio's denominator evaluated to zero.
    #[error("ratio {ratio}: denominator is zero")]
    DivisionByZero {
        /// The offending ratio definition id.
        ratio: String,
    },

    /// A store operation failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Monetary arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// The operation observed cancellation.
    #[error("operation {operation} was cancelled")]
    Cancelled {
        /// The cancelled operation's name.
        operation: &'static str,
    },
}

impl ReportError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MixedCurrencies { .. } => "MIXED_CURRENCIES",
            Self::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            Self::Storage(inner) => inner.error_code(),
            Self::Money(inner) => inner.error_code(),
            Self::Cancelled { .. } => "CANCELLED",
        }
    }
}
