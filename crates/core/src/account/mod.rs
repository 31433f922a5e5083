//! Chart-of-accounts model.
//!
//! Accounts are pure data plus the normal-balance rule: the single place
//! where the account-type → debit/credit direction mapping lives. All
//! balance computations elsewhere go through [`AccountType::normal_side`].

pub mod error;
pub mod types;

pub use error::AccountError;
pub use types::{validate_hierarchy, validate_update, Account, AccountStatus, AccountType};
