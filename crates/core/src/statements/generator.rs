//! Statement generator: assembles statements from calculator outputs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ledgerkit_shared::{Cancellation, Money};
use rust_decimal::Decimal;

use super::types::{
    CashActivitySource, CashFlowMethod, DetailLevel, LineItem, OperatingAdjustment, Statement,
    StatementOptions, StatementSection, StatementType,
};
use crate::account::{Account, AccountType};
use crate::ledger::EntryType;
use crate::reporting::{
    shift_date, AccountSelector, PeriodUnit, ReportCalculator, ReportError, ReportPeriod,
};
use crate::store::Repository;

/// Generates financial statements from the stored journal.
pub struct StatementGenerator<R: Repository> {
    calculator: ReportCalculator<R>,
    adjustments: Vec<Arc<dyn OperatingAdjustment>>,
    cash_sources: Vec<Arc<dyn CashActivitySource>>,
}

impl<R: Repository> StatementGenerator<R> {
    /// Creates a generator reading from the given store.
    #[must_use]
    pub fn new(store: Arc<R>) -> Self {
        Self {
            calculator: ReportCalculator::new(store),
            adjustments: Vec::new(),
            cash_sources: Vec::new(),
        }
    }

    /// Registers an indirect-method operating adjustment.
    pub fn register_adjustment(&mut self, adjustment: Arc<dyn OperatingAdjustment>) {
        self.adjustments.push(adjustment);
    }

    /// Registers a direct-method cash activity source.
    pub fn register_cash_source(&mut self, source: Arc<dyn CashActivitySource>) {
        self.cash_sources.push(source);
    }

    /// The underlying calculator.
    #[must_use]
    pub fn calculator(&self) -> &ReportCalculator<R> {
        &self.calculator
    }

    /// Generates a balance sheet as of a date.
    ///
    /// Sections, in order: Assets, Liabilities, Equity. Each line is one
    /// account's balance accumulated from the beginning of time.
    ///
    /// # Errors
    ///
    /// Calculator failures propagate.
    pub fn balance_sheet(
        &self,
        as_of: DateTime<Utc>,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<Statement, ReportError> {
        let mut statement = base_statement(StatementType::BalanceSheet, "Balance Sheet", as_of, None, opts);

        for (title, account_type) in [
            ("Assets", AccountType::Asset),
            ("Liabilities", AccountType::Liability),
            ("Equity", AccountType::Equity),
        ] {
            statement
                .sections
                .push(self.balance_section(title, account_type, as_of, opts, cancel)?);
        }

        if opts.include_comparative && opts.comparative_period_months > 0 {
            let months = i32::try_from(opts.comparative_period_months).unwrap_or(i32::MAX);
            let comparative_as_of = shift_date(as_of, PeriodUnit::Month, -months);
            let inner = comparative_options(opts);
            statement.comparative_period =
                Some(Box::new(self.balance_sheet(comparative_as_of, &inner, cancel)?));
        }

        Ok(statement)
    }

    /// Generates an income statement over a period.
    ///
    /// Sections: Revenue, Expenses; line amounts are net changes. The
    /// comparative period, when requested, is the immediately prior window
    /// of the same length.
    ///
    /// # Errors
    ///
    /// Calculator failures propagate.
    pub fn income_statement(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<Statement, ReportError> {
        let mut statement =
            base_statement(StatementType::IncomeStatement, "Income Statement", end, Some(start), opts);
        let period = ReportPeriod::between(start, end);

        statement
            .sections
            .push(self.change_section("Revenue", AccountType::Revenue, &period, opts, cancel)?);
        statement
            .sections
            .push(self.change_section("Expenses", AccountType::Expense, &period, opts, cancel)?);

        if opts.include_comparative {
            let length = end - start;
            let inner = comparative_options(opts);
            statement.comparative_period = Some(Box::new(self.income_statement(
                start - length,
                start,
                &inner,
                cancel,
            )?));
        }

        Ok(statement)
    }

    /// Generates a cash-flow statement over a period.
    ///
    /// Sections: Operating (direct or indirect per options), Investing
    /// (asset-account net changes), Financing (liability-account net
    /// changes).
    ///
    /// # Errors
    ///
    /// Calculator and extension-point failures propagate.
    pub fn cash_flow(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<Statement, ReportError> {
        let mut statement = base_statement(
            StatementType::CashFlow,
            "Statement of Cash Flows",
            end,
            Some(start),
            opts,
        );
        let period = ReportPeriod::between(start, end);

        let operating = match opts.cash_flow.method {
            CashFlowMethod::Indirect => self.operating_indirect(&period, opts, cancel)?,
            CashFlowMethod::Direct => self.operating_direct(&period, opts, cancel)?,
        };
        statement.sections.push(operating);

        statement.sections.push(self.change_section(
            "Investing Activities",
            AccountType::Asset,
            &period,
            opts,
            cancel,
        )?);
        statement.sections.push(self.change_section(
            "Financing Activities",
            AccountType::Liability,
            &period,
            opts,
            cancel,
        )?);

        if opts.include_comparative {
            let length = end - start;
            let inner = comparative_options(opts);
            statement.comparative_period =
                Some(Box::new(self.cash_flow(start - length, start, &inner, cancel)?));
        }

        Ok(statement)
    }

    /// Generates a trial balance as of a date.
    ///
    /// Two sections: accounts with debit-normal balances and accounts with
    /// credit-normal balances. The statement metadata records whether the
    /// two totals agree.
    ///
    /// # Errors
    ///
    /// Calculator failures propagate.
    pub fn trial_balance(
        &self,
        as_of: DateTime<Utc>,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<Statement, ReportError> {
        let mut statement =
            base_statement(StatementType::TrialBalance, "Trial Balance", as_of, None, opts);

        let accounts = self.calculator.select_accounts(&AccountSelector::default())?;
        let period = ReportPeriod::until(as_of);

        let mut debit_items = Vec::new();
        let mut credit_items = Vec::new();
        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;

        for account in &accounts {
            if cancel.is_cancelled() {
                return Err(ReportError::Cancelled {
                    operation: "trial_balance",
                });
            }
            let balance = self
                .calculator
                .calculate_balance(&account.id, &period, cancel)?;
            if balance.is_zero() && opts.detail_level != DetailLevel::Detailed {
                continue;
            }
            let item =
                LineItem::for_account(account.name.clone(), balance.clone(), account.id.clone());
            match account.account_type.normal_side() {
                EntryType::Debit => {
                    debit_total += balance.amount;
                    debit_items.push(item);
                }
                EntryType::Credit => {
                    credit_total += balance.amount;
                    credit_items.push(item);
                }
            }
        }

        statement.sections.push(StatementSection {
            title: "Debit Balances".to_string(),
            items: debit_items,
            total: Money::new(debit_total, opts.currency.clone()),
        });
        statement.sections.push(StatementSection {
            title: "Credit Balances".to_string(),
            items: credit_items,
            total: Money::new(credit_total, opts.currency.clone()),
        });
        statement
            .metadata
            .insert("is_balanced".to_string(), (debit_total == credit_total).into());

        Ok(statement)
    }

    fn balance_section(
        &self,
        title: &str,
        account_type: AccountType,
        as_of: DateTime<Utc>,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<StatementSection, ReportError> {
        let accounts = self.accounts_of_type(account_type)?;
        let period = ReportPeriod::until(as_of);

        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for account in &accounts {
            let balance = self
                .calculator
                .calculate_balance(&account.id, &period, cancel)?;
            if !balance.is_zero() || opts.detail_level == DetailLevel::Detailed {
                total += balance.amount;
                items.push(LineItem::for_account(
                    account.name.clone(),
                    balance,
                    account.id.clone(),
                ));
            }
        }

        Ok(StatementSection {
            title: title.to_string(),
            items,
            total: Money::new(total, opts.currency.clone()),
        })
    }

    fn change_section(
        &self,
        title: &str,
        account_type: AccountType,
        period: &ReportPeriod,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<StatementSection, ReportError> {
        let accounts = self.accounts_of_type(account_type)?;

        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for account in &accounts {
            let changes = self
                .calculator
                .calculate_changes(&account.id, period, cancel)?;
            if !changes.net_change.is_zero() || opts.detail_level == DetailLevel::Detailed {
                total += changes.net_change.amount;
                items.push(LineItem::for_account(
                    account.name.clone(),
                    changes.net_change,
                    account.id.clone(),
                ));
            }
        }

        Ok(StatementSection {
            title: title.to_string(),
            items,
            total: Money::new(total, opts.currency.clone()),
        })
    }

    /// Indirect operating section: Net Income (ΣΔ revenue − ΣΔ expense)
    /// followed by registered adjustment lines.
    fn operating_indirect(
        &self,
        period: &ReportPeriod,
        opts: &StatementOptions,
        cancel: &Cancellation,
    ) -> Result<StatementSection, ReportError> {
        let net_income = self.net_income(period, cancel)?;

        let mut items = vec![LineItem::new(
            "Net Income",
            Money::new(net_income, opts.currency.clone()),
        )];
        for adjustment in &self.adjustments {
            items.extend(adjustment.line_items(period)?);
        }

        let total: Decimal = items.iter().map(|item| item.amount.amount).sum();
        Ok(StatementSection {
            title: "Operating Activities".to_string(),
            items,
            total: Money::new(total, opts.currency.clone()),
        })
    }

    /// Direct operating section: enumerated receipts then payments from
    /// registered sources.
    fn operating_direct(
        &self,
        period: &ReportPeriod,
        opts: &StatementOptions,
        _cancel: &Cancellation,
    ) -> Result<StatementSection, ReportError> {
        let mut items = Vec::new();
        for source in &self.cash_sources {
            items.extend(source.receipts(period)?);
        }
        for source in &self.cash_sources {
            items.extend(source.payments(period)?);
        }

        let total: Decimal = items.iter().map(|item| item.amount.amount).sum();
        Ok(StatementSection {
            title: "Operating Activities".to_string(),
            items,
            total: Money::new(total, opts.currency.clone()),
        })
    }

    fn net_income(
        &self,
        period: &ReportPeriod,
        cancel: &Cancellation,
    ) -> Result<Decimal, ReportError> {
        let mut revenue = Decimal::ZERO;
        for account in &self.accounts_of_type(AccountType::Revenue)? {
            revenue += self
                .calculator
                .calculate_changes(&account.id, period, cancel)?
                .net_change
                .amount;
        }
        let mut expenses = Decimal::ZERO;
        for account in &self.accounts_of_type(AccountType::Expense)? {
            expenses += self
                .calculator
                .calculate_changes(&account.id, period, cancel)?
                .net_change
                .amount;
        }
        Ok(revenue - expenses)
    }

    fn accounts_of_type(&self, account_type: AccountType) -> Result<Vec<Account>, ReportError> {
        self.calculator
            .select_accounts(&AccountSelector::of_types(vec![account_type]))
    }
}

fn base_statement(
    statement_type: StatementType,
    title: &str,
    as_of: DateTime<Utc>,
    period_start: Option<DateTime<Utc>>,
    opts: &StatementOptions,
) -> Statement {
    Statement {
        statement_type,
        title: title.to_string(),
        entity: opts.entity.clone(),
        as_of,
        period_start,
        currency: opts.currency.clone(),
        sections: Vec::new(),
        comparative_period: None,
        metadata: HashMap::new(),
    }
}

/// Options for a nested comparative statement: same currency and detail,
/// but never another level of comparison.
fn comparative_options(opts: &StatementOptions) -> StatementOptions {
    let mut inner = opts.clone();
    inner.include_comparative = false;
    inner.comparative_period_months = 0;
    inner
}
