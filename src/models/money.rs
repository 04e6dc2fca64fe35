//! Money amounts
//!
//! Amounts are `rust_decimal::Decimal` in memory, integer cents in storage and
//! two-decimal strings (`"150.00"`) on the wire.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },
}

/// Decimal amount from integer cents
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Integer cents from an amount, rounding half away from zero to two places
pub fn to_cents(amount: Decimal, field: &'static str) -> Result<i64, MoneyError> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(MoneyError::OutOfRange { field })
}

/// Normalize to exactly two fractional digits
pub fn two_places(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Parse a user-supplied amount. Accepts JSON numbers and numeric strings.
pub fn parse_amount(value: Option<&Value>, field: &'static str) -> Result<Decimal, MoneyError> {
    let raw = match value {
        None | Some(Value::Null) => return Err(MoneyError::Missing { field }),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(MoneyError::Missing { field }),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(MoneyError::NotANumber {
                field,
                value: other.to_string(),
            })
        }
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| MoneyError::NotANumber { field, value: raw })
}

/// Parse an amount that must be zero or more
pub fn parse_non_negative(value: Option<&Value>, field: &'static str) -> Result<Decimal, MoneyError> {
    let amount = parse_amount(value, field)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative { field });
    }
    Ok(two_places(amount))
}

/// Parse an amount that must be strictly positive
pub fn parse_positive(value: Option<&Value>, field: &'static str) -> Result<Decimal, MoneyError> {
    let amount = parse_non_negative(value, field)?;
    if amount.is_zero() {
        return Err(MoneyError::NotPositive { field });
    }
    Ok(amount)
}

/// Serde adapter writing amounts as two-decimal strings
pub mod serde_two_places {
    use rust_decimal::Decimal;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.2}", super::two_places(*amount)))
    }
}
