//! Transaction summary types.

use ledgerkit_shared::{AccountId, Money};
use serde::{Deserialize, Serialize};

/// Totals-only view of a transaction. Pure computation, no I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Sum of all debit entries.
    pub total_debits: Money,
    /// Sum of all credit entries.
    pub total_credits: Money,
    /// Debits minus credits; zero for a balanced transaction.
    pub net_amount: Money,
    /// Number of entries.
    pub entry_count: usize,
    /// Sorted, de-duplicated ids of the accounts the transaction touches.
    pub affected_accounts: Vec<AccountId>,
}
