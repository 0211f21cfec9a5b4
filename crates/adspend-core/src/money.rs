//! Two-decimal money helpers.
//!
//! Amounts are `rust_decimal::Decimal` in memory and integer cents at rest.

use crate::error::ValueError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Highest budget a campaign may be given.
pub fn max_budget() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Smallest meaningful amount.
pub fn one_cent() -> Decimal {
    Decimal::new(1, 2)
}

/// Round to two decimal places, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn to_cents(value: Decimal) -> Result<i64, ValueError> {
    let mut rounded = round_cents(value);
    rounded.rescale(2);
    i64::try_from(rounded.mantissa()).map_err(|_| ValueError::OutOfRange(value))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Parse user-supplied money text, e.g. `"150"` or `"150.00"`.
pub fn parse_money(text: &str) -> Result<Decimal, ValueError> {
    Decimal::from_str(text.trim())
        .map(round_cents)
        .map_err(|_| ValueError::InvalidAmount(text.to_string()))
}

/// Check a budget value against `0 <= value <= max_budget()`.
pub fn validate_budget(value: Decimal) -> Result<Decimal, ValueError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValueError::NegativeBudget(value));
    }
    if value > max_budget() {
        return Err(ValueError::BudgetTooLarge {
            value,
            max: max_budget(),
        });
    }
    Ok(round_cents(value))
}
