//! Shared value types for ledgerkit.
//!
//! This crate provides the leaf types used across the workspace:
//! - Money types with decimal precision and an ISO 4217 currency tag
//! - Typed IDs for type-safe entity references
//! - Pagination types for query contracts
//! - A cancellation token for long-running operations

pub mod types;

pub use types::cancel::Cancellation;
pub use types::id::{AccountId, TransactionId};
pub use types::money::{Currency, Money, MoneyError, Rounding};
pub use types::pagination::PageRequest;
