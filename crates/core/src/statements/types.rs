//! Statement data model and generation options.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ledgerkit_shared::{AccountId, Currency, Money};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reporting::{ReportError, ReportPeriod};

/// Kind of financial statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementType {
    /// Statement of financial position.
    BalanceSheet,
    /// Profit and loss over a period.
    IncomeStatement,
    /// Statement of cash flows.
    CashFlow,
    /// Pre-closing trial balance.
    TrialBalance,
}

/// A single line in a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display label.
    pub label: String,
    /// Line amount.
    pub amount: Money,
    /// Accounts that make up this line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub account_ids: Vec<AccountId>,
    /// Optional nested lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<LineItem>,
    /// Custom attributes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl LineItem {
    /// Creates a line item with no account references.
    #[must_use]
    pub fn new(label: impl Into<String>, amount: Money) -> Self {
        Self {
            label: label.into(),
            amount,
            account_ids: Vec::new(),
            sub_items: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a line item backed by one account.
    #[must_use]
    pub fn for_account(label: impl Into<String>, amount: Money, account_id: AccountId) -> Self {
        Self {
            label: label.into(),
            amount,
            account_ids: vec![account_id],
            sub_items: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

/// An ordered group of line items with a total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSection {
    /// Section title.
    pub title: String,
    /// Line items, in presentation order.
    pub items: Vec<LineItem>,
    /// Section total.
    pub total: Money,
}

/// A generated financial statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Statement kind.
    #[serde(rename = "type")]
    pub statement_type: StatementType,
    /// Statement title.
    pub title: String,
    /// Reporting entity name.
    pub entity: String,
    /// Statement date or period end.
    pub as_of: DateTime<Utc>,
    /// Period start, for period statements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
    /// Statement currency.
    pub currency: Currency,
    /// Ordered sections.
    pub sections: Vec<StatementSection>,
    /// Prior-period statement for comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparative_period: Option<Box<Statement>>,
    /// Additional metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

/// How much detail statements carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Suppress zero-valued lines.
    #[default]
    Summary,
    /// Keep every account, zero balances included.
    Detailed,
}

/// Method for the operating section of a cash-flow statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowMethod {
    /// Enumerated cash receipts and payments.
    Direct,
    /// Net income adjusted for non-cash items.
    #[default]
    Indirect,
}

/// Options specific to cash-flow generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashFlowOptions {
    /// Operating-section method.
    pub method: CashFlowMethod,
}

/// Options for statement generation.
#[derive(Debug, Clone)]
pub struct StatementOptions {
    /// Reporting entity name.
    pub entity: String,
    /// Currency section totals are stated in.
    pub currency: Currency,
    /// Attach a prior-period statement.
    pub include_comparative: bool,
    /// Length of the comparative period, in months (balance sheet only;
    /// period statements compare against the immediately prior window).
    pub comparative_period_months: u32,
    /// Zero-line policy.
    pub detail_level: DetailLevel,
    /// Cash-flow specifics.
    pub cash_flow: CashFlowOptions,
}

impl StatementOptions {
    /// Creates options with summary detail and no comparative period.
    #[must_use]
    pub fn new(entity: impl Into<String>, currency: Currency) -> Self {
        Self {
            entity: entity.into(),
            currency,
            include_comparative: false,
            comparative_period_months: 0,
            detail_level: DetailLevel::default(),
            cash_flow: CashFlowOptions::default(),
        }
    }

    /// Enables a comparative period of the given length in months.
    #[must_use]
    pub fn with_comparative(mut self, months: u32) -> Self {
        self.include_comparative = true;
        self.comparative_period_months = months;
        self
    }

    /// Sets the detail level.
    #[must_use]
    pub fn with_detail(mut self, detail_level: DetailLevel) -> Self {
        self.detail_level = detail_level;
        self
    }

    /// Sets the cash-flow method.
    #[must_use]
    pub fn with_cash_flow_method(mut self, method: CashFlowMethod) -> Self {
        self.cash_flow = CashFlowOptions { method };
        self
    }
}

/// Pluggable source of indirect-method operating adjustments (non-cash
/// items, working-capital changes). The base engine emits only the Net
/// Income line; registered adjustments add their lines after it.
pub trait OperatingAdjustment: Send + Sync {
    /// Lines to add to the operating section for the period.
    ///
    /// # Errors
    ///
    /// Failures abort cash-flow generation.
    fn line_items(&self, period: &ReportPeriod) -> Result<Vec<LineItem>, ReportError>;
}

/// Pluggable source of direct-method operating cash activity.
pub trait CashActivitySource: Send + Sync {
    /// Enumerated cash receipts for the period.
    ///
    /// # Errors
    ///
    /// Failures abort cash-flow generation.
    fn receipts(&self, period: &ReportPeriod) -> Result<Vec<LineItem>, ReportError>;

    /// Enumerated cash payments for the period (negative amounts).
    ///
    /// # Errors
    ///
    /// Failures abort cash-flow generation.
    fn payments(&self, period: &ReportPeriod) -> Result<Vec<LineItem>, ReportError>;
}
