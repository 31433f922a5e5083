//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for exact arithmetic. Arithmetic
//! preserves full precision; rounding is a separate, explicit step.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during monetary operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Arithmetic between two values in different currencies.
    #[error("Mismatched currencies: {left} vs {right}")]
    MismatchedCurrencies {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },

    /// Division by a zero scalar.
    #[error("Division by zero")]
    DivisionByZero,

    /// A currency code that is not a three-letter ISO 4217 code.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

impl MoneyError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MismatchedCurrencies { .. } => "MISMATCHED_CURRENCIES",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
        }
    }
}

/// ISO 4217 alphabetic currency code (e.g. "USD", "EUR").
///
/// Validated on construction: exactly three ASCII uppercase letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Creates a currency from an ISO 4217 alphabetic code.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidCurrency` unless the code is exactly
    /// three ASCII uppercase letters.
    pub fn new(code: impl Into<String>) -> Result<Self, MoneyError> {
        let code = code.into();
        let valid = code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(MoneyError::InvalidCurrency(code));
        }
        Ok(Self(code))
    }

    /// Returns the currency code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// US Dollar.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Rounding mode for the explicit rounding step.
///
/// Half-even ("banker's rounding") is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rounding {
    /// Round midpoints to the nearest even digit.
    #[default]
    HalfEven,
    /// Round midpoints away from zero.
    HalfUp,
    /// Round midpoints toward zero.
    HalfDown,
    /// Truncate toward zero.
    Down,
    /// Round away from zero.
    Up,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfDown => RoundingStrategy::MidpointTowardZero,
            Self::Down => RoundingStrategy::ToZero,
            Self::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// A monetary value in a specific currency.
///
/// Arithmetic between two `Money` values requires matching currencies and
/// fails otherwise; no implicit rounding ever happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The exact decimal amount.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Creates a new monetary value.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the given currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Adds two monetary values of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::MismatchedCurrencies` if the currencies differ.
    pub fn add(&self, other: &Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        Ok(Self {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Subtracts another monetary value of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::MismatchedCurrencies` if the currencies differ.
    pub fn subtract(&self, other: &Self) -> Result<Self, MoneyError> {
        self.require_same_currency(other)?;
        Ok(Self {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Multiplies by a decimal scalar, preserving the currency.
    #[must_use]
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self {
            amount: self.amount * factor,
            currency: self.currency.clone(),
        }
    }

    /// Divides by a decimal scalar.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::DivisionByZero` if the scalar is zero.
    pub fn divide(&self, factor: Decimal) -> Result<Self, MoneyError> {
        if factor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self {
            amount: self.amount / factor,
            currency: self.currency.clone(),
        })
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency.clone(),
        }
    }

    /// Returns the negated value.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            amount: -self.amount,
            currency: self.currency.clone(),
        }
    }

    /// Rounds to `scale` decimal places with the given mode.
    ///
    /// This is the only place rounding happens; all arithmetic keeps full
    /// precision.
    #[must_use]
    pub fn round(&self, scale: u32, rounding: Rounding) -> Self {
        Self {
            amount: self
                .amount
                .round_dp_with_strategy(scale, rounding.strategy()),
            currency: self.currency.clone(),
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is strictly negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    fn require_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::MismatchedCurrencies {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
