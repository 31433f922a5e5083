//! Account invariant errors.

use ledgerkit_shared::AccountId;
use thiserror::Error;

/// Errors raised by account invariant checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The account type cannot change after creation.
    #[error("Account {0} type is immutable after creation")]
    TypeImmutable(AccountId),

    /// Following the parent chain revisits an account.
    #[error("Account {0} parent chain contains a cycle")]
    ParentCycle(AccountId),

    /// A parent id references an account that does not exist.
    #[error("Account {child} references unknown parent {parent}")]
    UnknownParent {
        /// The account whose parent is dangling.
        child: AccountId,
        /// The missing parent id.
        parent: AccountId,
    },
}

impl AccountError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TypeImmutable(_) => "ACCOUNT_TYPE_IMMUTABLE",
            Self::ParentCycle(_) => "ACCOUNT_PARENT_CYCLE",
            Self::UnknownParent { .. } => "ACCOUNT_UNKNOWN_PARENT",
        }
    }
}
