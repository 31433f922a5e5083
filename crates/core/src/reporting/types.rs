//! Reporting domain types: periods, selectors, calculations, movements.

use chrono::{DateTime, Days, Months, Utc};
use ledgerkit_shared::{Money, TransactionId};
use serde::{Deserialize, Serialize};

use crate::account::AccountType;
use crate::ledger::EntryType;

/// A reporting period.
///
/// `start == None` means "the beginning of time" (used by balance-sheet
/// balances, which accumulate all history up to a date). The start is
/// inclusive and the end is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// Inclusive start; `None` reaches back to the first transaction.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive end.
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    /// Period from the beginning of time through `end`.
    #[must_use]
    pub fn until(end: DateTime<Utc>) -> Self {
        Self { start: None, end }
    }

    /// Period between two dates, both inclusive.
    #[must_use]
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end,
        }
    }
}

/// Which balance a calculation reads for each selected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceType {
    /// Balance as of the period start, exclusive.
    Opening,
    /// Balance as of the period end, inclusive.
    Closing,
    /// Mean of opening and closing.
    Average,
}

/// Calendar unit for period adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodUnit {
    /// Whole days.
    Day,
    /// Calendar months.
    Month,
    /// Calendar years.
    Year,
}

/// How a period adjustment transforms the base period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    /// Move both endpoints by the signed amount.
    Shift,
    /// Move only the end, growing or shrinking the window.
    Extend,
}

/// Shifts or extends a reporting period by a signed number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAdjustment {
    /// Shift or extend.
    pub kind: AdjustmentKind,
    /// Calendar unit.
    pub unit: PeriodUnit,
    /// Signed amount; negative moves into the past.
    pub amount: i32,
}

impl PeriodAdjustment {
    /// Applies the adjustment to a base period.
    #[must_use]
    pub fn apply(&self, period: &ReportPeriod) -> ReportPeriod {
        match self.kind {
            AdjustmentKind::Shift => ReportPeriod {
                start: period
                    .start
                    .map(|start| shift_date(start, self.unit, self.amount)),
                end: shift_date(period.end, self.unit, self.amount),
            },
            AdjustmentKind::Extend => ReportPeriod {
                start: period.start,
                end: shift_date(period.end, self.unit, self.amount),
            },
        }
    }
}

/// Moves a date by a signed number of calendar units. Saturates on
/// out-of-range dates rather than failing.
#[must_use]
pub fn shift_date(date: DateTime<Utc>, unit: PeriodUnit, amount: i32) -> DateTime<Utc> {
    let shifted = match unit {
        PeriodUnit::Day => {
            let days = Days::new(amount.unsigned_abs().into());
            if amount >= 0 {
                date.checked_add_days(days)
            } else {
                date.checked_sub_days(days)
            }
        }
        PeriodUnit::Month => shift_months(date, amount),
        PeriodUnit::Year => shift_months(date, amount.saturating_mul(12)),
    };
    shifted.unwrap_or(date)
}

fn shift_months(date: DateTime<Utc>, months: i32) -> Option<DateTime<Utc>> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

/// Selects accounts for a calculation.
///
/// Within a field the listed values are alternatives (OR); across fields
/// the criteria combine with AND. Empty fields match everything.
/// Categories and tags are read from account metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSelector {
    /// Account types to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<AccountType>,
    /// Account codes to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<String>,
    /// Metadata categories to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Metadata tags to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AccountSelector {
    /// Selects all accounts of the given types.
    #[must_use]
    pub fn of_types(types: impl Into<Vec<AccountType>>) -> Self {
        Self {
            types: types.into(),
            ..Self::default()
        }
    }
}

/// One value computation: which accounts, which period, which balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calculation {
    /// Account selection criteria.
    pub selector: AccountSelector,
    /// Optional adjustment applied to the base period first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<PeriodAdjustment>,
    /// Which balance the calculation reads per account.
    pub balance_type: BalanceType,
}

impl Calculation {
    /// Closing-balance calculation over a selector, no period adjustment.
    #[must_use]
    pub fn closing(selector: AccountSelector) -> Self {
        Self {
            selector,
            adjustment: None,
            balance_type: BalanceType::Closing,
        }
    }
}

/// Defines a financial ratio as numerator over denominator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioDefinition {
    /// Stable ratio identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the ratio means.
    #[serde(default)]
    pub description: String,
    /// Numerator calculation.
    pub numerator: Calculation,
    /// Denominator calculation.
    pub denominator: Calculation,
    /// Decimal places of the result (half-even rounding).
    pub scale: u32,
}

/// A single movement on an account within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMovement {
    /// Business date of the transaction.
    pub date: DateTime<Utc>,
    /// Entry amount.
    pub amount: Money,
    /// Which side the entry was on.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// The owning transaction's description.
    pub description: String,
    /// The owning transaction.
    pub transaction_id: TransactionId,
}

/// Opening/closing balances and the movements between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Balance as of the period start, exclusive.
    pub opening_balance: Money,
    /// Balance as of the period end, inclusive.
    pub closing_balance: Money,
    /// Closing minus opening.
    pub net_change: Money,
    /// Movements within the period, ordered by (date, transaction id).
    pub movements: Vec<BalanceMovement>,
}
