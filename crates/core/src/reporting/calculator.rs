//! Report calculator: deterministic balance and ratio computation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgerkit_shared::{AccountId, Cancellation, Currency, Money};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use super::error::ReportError;
use super::types::{
    AccountSelector, BalanceChange, BalanceMovement, BalanceType, Calculation, RatioDefinition,
    ReportPeriod,
};
use crate::account::Account;
use crate::ledger::{Transaction, TransactionStatus};
use crate::store::{FilterOp, Query, Repository};

/// Computes balances, balance changes, and ratios from the stored journal.
///
/// Only Posted transactions contribute. Results are deterministic for a
/// given store state: accounts iterate in id order and movements are
/// ordered by (business date, transaction id).
pub struct ReportCalculator<R: Repository> {
    store: Arc<R>,
}

impl<R: Repository> Clone for ReportCalculator<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: Repository> ReportCalculator<R> {
    /// Creates a calculator reading from the given store.
    #[must_use]
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Computes an account's balance over a period.
    ///
    /// The balance accumulates each entry on the account's normal side
    /// positively and the opposite side negatively, in the transactions'
    /// common currency. With no matching transactions the result is zero in
    /// the account's own currency.
    ///
    /// # Errors
    ///
    /// `MIXED_CURRENCIES` when the account's entries span currencies,
    /// `NOT_FOUND` for an unknown account.
    pub fn calculate_balance(
        &self,
        account_id: &AccountId,
        period: &ReportPeriod,
        cancel: &Cancellation,
    ) -> Result<Money, ReportError> {
        self.check_cancelled("calculate_balance", cancel)?;
        let account: Account = self.store.read(account_id.as_str())?;
        let balance = self.accumulate(&account, period.start.as_ref(), false, &period.end, true)?;
        Ok(balance.unwrap_or_else(|| Money::zero(account.currency.clone())))
    }

    /// Computes opening balance, closing balance, net change, and the
    /// ordered movement list for an account over a period.
    ///
    /// The opening balance is the balance as of the period start,
    /// exclusive; the closing balance is as of the period end, inclusive.
    /// Both accumulate from the beginning of time.
    ///
    /// # Errors
    ///
    /// As [`ReportCalculator::calculate_balance`].
    pub fn calculate_changes(
        &self,
        account_id: &AccountId,
        period: &ReportPeriod,
        cancel: &Cancellation,
    ) -> Result<BalanceChange, ReportError> {
        self.check_cancelled("calculate_changes", cancel)?;
        let account: Account = self.store.read(account_id.as_str())?;

        let opening = match &period.start {
            Some(start) => self.accumulate(&account, None, false, start, false)?,
            None => None,
        };
        self.check_cancelled("calculate_changes", cancel)?;
        let closing = self.accumulate(&account, None, false, &period.end, true)?;

        let currency = closing
            .as_ref()
            .or(opening.as_ref())
            .map(|money| money.currency.clone())
            .unwrap_or_else(|| account.currency.clone());
        let opening_balance = opening.unwrap_or_else(|| Money::zero(currency.clone()));
        let closing_balance = closing.unwrap_or_else(|| Money::zero(currency));
        let net_change = closing_balance.subtract(&opening_balance)?;

        let movements = self.movements(&account, period)?;

        Ok(BalanceChange {
            opening_balance,
            closing_balance,
            net_change,
            movements,
        })
    }

    /// Evaluates a ratio definition over a period and rounds the result to
    /// the definition's scale (half-even).
    ///
    /// # Errors
    ///
    /// `DIVISION_BY_ZERO` when the denominator evaluates to zero.
    pub fn calculate_ratio(
        &self,
        definition: &RatioDefinition,
        period: &ReportPeriod,
        cancel: &Cancellation,
    ) -> Result<Decimal, ReportError> {
        let numerator = self.evaluate(&definition.numerator, period, cancel)?;
        let denominator = self.evaluate(&definition.denominator, period, cancel)?;
        if denominator.is_zero() {
            return Err(ReportError::DivisionByZero {
                ratio: definition.id.clone(),
            });
        }
        Ok((numerator / denominator)
            .round_dp_with_strategy(definition.scale, RoundingStrategy::MidpointNearestEven))
    }

    /// Evaluates one calculation: selects accounts, reads the configured
    /// balance for each, and sums the decimal amounts.
    ///
    /// # Errors
    ///
    /// Selector or balance failures propagate.
    pub fn evaluate(
        &self,
        calculation: &Calculation,
        period: &ReportPeriod,
        cancel: &Cancellation,
    ) -> Result<Decimal, ReportError> {
        let adjusted = match &calculation.adjustment {
            Some(adjustment) => adjustment.apply(period),
            None => period.clone(),
        };

        let accounts = self.select_accounts(&calculation.selector)?;
        let mut total = Decimal::ZERO;
        for account in &accounts {
            self.check_cancelled("evaluate", cancel)?;
            let value = match calculation.balance_type {
                BalanceType::Closing => self.closing_amount(account, &adjusted)?,
                BalanceType::Opening => self.opening_amount(account, &adjusted)?,
                BalanceType::Average => {
                    let opening = self.opening_amount(account, &adjusted)?;
                    let closing = self.closing_amount(account, &adjusted)?;
                    (opening + closing) / Decimal::TWO
                }
            };
            total += value;
        }
        Ok(total)
    }

    /// Returns accounts matching a selector, in id order.
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn select_accounts(&self, selector: &AccountSelector) -> Result<Vec<Account>, ReportError> {
        let mut query = Query::new();
        if !selector.types.is_empty() {
            query = query.filter("type", FilterOp::In, to_json(&selector.types));
        }
        if !selector.codes.is_empty() {
            query = query.filter("code", FilterOp::In, to_json(&selector.codes));
        }
        if !selector.categories.is_empty() {
            query = query.filter("metadata.category", FilterOp::In, to_json(&selector.categories));
        }
        if !selector.tags.is_empty() {
            query = query.filter("metadata.tags", FilterOp::In, to_json(&selector.tags));
        }
        Ok(self.store.query(&query)?)
    }

    fn opening_amount(
        &self,
        account: &Account,
        period: &ReportPeriod,
    ) -> Result<Decimal, ReportError> {
        match &period.start {
            Some(start) => Ok(self
                .accumulate(account, None, false, start, false)?
                .map(|money| money.amount)
                .unwrap_or_default()),
            None => Ok(Decimal::ZERO),
        }
    }

    fn closing_amount(
        &self,
        account: &Account,
        period: &ReportPeriod,
    ) -> Result<Decimal, ReportError> {
        Ok(self
            .accumulate(account, None, false, &period.end, true)?
            .map(|money| money.amount)
            .unwrap_or_default())
    }

    /// Folds the account's posted entries within the date window into a
    /// signed balance. Returns `None` when no entries match.
    fn accumulate(
        &self,
        account: &Account,
        start: Option<&DateTime<Utc>>,
        start_exclusive: bool,
        end: &DateTime<Utc>,
        end_inclusive: bool,
    ) -> Result<Option<Money>, ReportError> {
        let transactions = self.posted_transactions(account, start, start_exclusive, end, end_inclusive)?;

        let mut currency: Option<Currency> = None;
        let mut balance = Decimal::ZERO;
        for tx in &transactions {
            for entry in tx.entries.iter().filter(|e| e.account_id == account.id) {
                match &currency {
                    None => currency = Some(entry.amount.currency.clone()),
                    Some(existing) if existing != &entry.amount.currency => {
                        return Err(ReportError::MixedCurrencies {
                            account_id: account.id.clone(),
                        });
                    }
                    Some(_) => {}
                }
                balance += account
                    .account_type
                    .balance_contribution(entry.entry_type, entry.amount.amount);
            }
        }
        Ok(currency.map(|currency| Money::new(balance, currency)))
    }

    fn movements(
        &self,
        account: &Account,
        period: &ReportPeriod,
    ) -> Result<Vec<BalanceMovement>, ReportError> {
        let transactions =
            self.posted_transactions(account, period.start.as_ref(), false, &period.end, true)?;

        let mut movements = Vec::new();
        for tx in &transactions {
            for entry in tx.entries.iter().filter(|e| e.account_id == account.id) {
                movements.push(BalanceMovement {
                    date: tx.date,
                    amount: entry.amount.clone(),
                    entry_type: entry.entry_type,
                    description: tx.description.clone(),
                    transaction_id: tx.id.clone(),
                });
            }
        }
        Ok(movements)
    }

    /// Queries the Posted transactions touching the account within the date
    /// window, ordered by (date, id) for determinism.
    fn posted_transactions(
        &self,
        account: &Account,
        start: Option<&DateTime<Utc>>,
        start_exclusive: bool,
        end: &DateTime<Utc>,
        end_inclusive: bool,
    ) -> Result<Vec<Transaction>, ReportError> {
        let mut query = Query::new()
            .filter("status", FilterOp::Eq, to_json(&TransactionStatus::Posted))
            .filter("entries.account_id", FilterOp::Eq, account.id.as_str())
            .filter(
                "date",
                if end_inclusive { FilterOp::Lte } else { FilterOp::Lt },
                to_json(end),
            )
            .sort_by("date", false)
            .sort_by("id", false);
        if let Some(start) = start {
            query = query.filter(
                "date",
                if start_exclusive { FilterOp::Gt } else { FilterOp::Gte },
                to_json(start),
            );
        }
        Ok(self.store.query(&query)?)
    }

    fn check_cancelled(
        &self,
        operation: &'static str,
        cancel: &Cancellation,
    ) -> Result<(), ReportError> {
        if cancel.is_cancelled() {
            return Err(ReportError::Cancelled { operation });
        }
        Ok(())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
