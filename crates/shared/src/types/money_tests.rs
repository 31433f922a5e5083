use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::money::{Currency, Money, MoneyError, Rounding};

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::usd())
}

fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::new("EUR").unwrap())
}

#[test]
fn test_add_same_currency() {
    let sum = usd(dec!(100.25)).add(&usd(dec!(0.75))).unwrap();
    assert_eq!(sum, usd(dec!(101.00)));
}

#[test]
fn test_add_mismatched_currencies() {
    let err = usd(dec!(1)).add(&eur(dec!(1))).unwrap_err();
    assert!(matches!(err, MoneyError::MismatchedCurrencies { .. }));
    assert_eq!(err.error_code(), "MISMATCHED_CURRENCIES");
}

#[test]
fn test_subtract() {
    let diff = usd(dec!(10.00)).subtract(&usd(dec!(2.50))).unwrap();
    assert_eq!(diff, usd(dec!(7.50)));

    assert!(matches!(
        usd(dec!(1)).subtract(&eur(dec!(1))),
        Err(MoneyError::MismatchedCurrencies { .. })
    ));
}

#[test]
fn test_multiply_preserves_currency() {
    let result = eur(dec!(12.50)).multiply(dec!(3));
    assert_eq!(result, eur(dec!(37.50)));
}

#[test]
fn test_divide() {
    let result = usd(dec!(10)).divide(dec!(4)).unwrap();
    assert_eq!(result, usd(dec!(2.5)));
}

#[test]
fn test_divide_by_zero() {
    let err = usd(dec!(10)).divide(Decimal::ZERO).unwrap_err();
    assert_eq!(err, MoneyError::DivisionByZero);
    assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
}

#[test]
fn test_division_keeps_precision_until_rounded() {
    // 10 / 3 keeps full precision; rounding is a separate step.
    let result = usd(dec!(10)).divide(dec!(3)).unwrap();
    let rounded = result.round(2, Rounding::default());
    assert_eq!(rounded, usd(dec!(3.33)));
}

#[test]
fn test_abs_and_negate() {
    assert_eq!(usd(dec!(-5)).abs(), usd(dec!(5)));
    assert_eq!(usd(dec!(5)).negate(), usd(dec!(-5)));
    assert_eq!(usd(dec!(-5)).negate(), usd(dec!(5)));
}

#[test]
fn test_predicates() {
    assert!(usd(dec!(0)).is_zero());
    assert!(usd(dec!(0.00)).is_zero());
    assert!(usd(dec!(1)).is_positive());
    assert!(!usd(dec!(0)).is_positive());
    assert!(usd(dec!(-1)).is_negative());
    assert!(!usd(dec!(0)).is_negative());
}

#[test]
fn test_equality_ignores_trailing_zeros() {
    assert_eq!(usd(dec!(100.00)), usd(dec!(100)));
    assert_ne!(usd(dec!(100)), eur(dec!(100)));
}

#[test]
fn test_round_half_even() {
    // Banker's rounding: midpoints go to the nearest even digit.
    assert_eq!(usd(dec!(2.125)).round(2, Rounding::HalfEven), usd(dec!(2.12)));
    assert_eq!(usd(dec!(2.135)).round(2, Rounding::HalfEven), usd(dec!(2.14)));
}

#[test]
fn test_round_modes() {
    let value = usd(dec!(2.125));
    assert_eq!(value.round(2, Rounding::HalfUp), usd(dec!(2.13)));
    assert_eq!(value.round(2, Rounding::HalfDown), usd(dec!(2.12)));
    assert_eq!(value.round(2, Rounding::Down), usd(dec!(2.12)));
    assert_eq!(value.round(2, Rounding::Up), usd(dec!(2.13)));
}

#[test]
fn test_currency_validation() {
    assert!(Currency::new("USD").is_ok());
    assert!(Currency::new("usd").is_err());
    assert!(Currency::new("USDX").is_err());
    assert!(Currency::new("").is_err());
    assert!(Currency::new("U1D").is_err());
}

#[test]
fn test_json_shape() {
    let money = usd(dec!(100.00));
    let json = serde_json::to_value(&money).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "amount": "100.00", "currency": "USD" })
    );

    let back: Money = serde_json::from_value(json).unwrap();
    assert_eq!(back, money);
}

#[test]
fn test_json_rejects_bad_currency() {
    let result: Result<Money, _> =
        serde_json::from_value(serde_json::json!({ "amount": "1", "currency": "dollars" }));
    assert!(result.is_err());
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Addition and subtraction are inverse operations.
    #[test]
    fn prop_add_subtract_roundtrip(a in amount_strategy(), b in amount_strategy()) {
        let sum = usd(a).add(&usd(b)).unwrap();
        let back = sum.subtract(&usd(b)).unwrap();
        prop_assert_eq!(back, usd(a));
    }

    /// Negation is its own inverse.
    #[test]
    fn prop_double_negate(a in amount_strategy()) {
        prop_assert_eq!(usd(a).negate().negate(), usd(a));
    }

    /// abs never yields a negative value.
    #[test]
    fn prop_abs_non_negative(a in amount_strategy()) {
        prop_assert!(!usd(a).abs().is_negative());
    }
}
