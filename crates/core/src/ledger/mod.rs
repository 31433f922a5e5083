//! Double-entry transaction engine.
//!
//! This module implements the transaction lifecycle:
//! - Ledger entries (debits and credits)
//! - Transaction aggregates with status transitions
//! - Structural validation of the double-entry invariants
//! - Posting, batch posting with compensation, voiding, and reversal
//! - Lifecycle events on the event bus

pub mod entry;
pub mod error;
pub mod processor;
pub mod transaction;
pub mod types;
pub mod validator;

#[cfg(test)]
mod processor_props;

pub use entry::{Entry, EntryType};
pub use error::LedgerError;
pub use processor::TransactionProcessor;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use types::TransactionSummary;
pub use validator::TransactionValidator;
