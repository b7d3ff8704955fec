//! Lossless prize-money type backed by rust_decimal.
//!
//! Earnings arrive from the data source as integers, decimals, or Mongo-style
//! wrapped numbers. They are stored as canonical text and parsed back here so
//! scoring never touches floating point.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prize money / points amount in whole or fractional currency units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("not a number: {0:?}")]
    Malformed(String),
    #[error("negative amount: {0}")]
    Negative(String),
    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// Largest single-event prize accepted from the data source. Purses run in
/// the tens of millions; anything past this is a feed error.
pub const MAX_EARNINGS: i64 = 1_000_000_000_000;

impl Money {
    pub fn new(value: RustDecimal) -> Self {
        Money(value)
    }

    pub fn zero() -> Self {
        Money(RustDecimal::ZERO)
    }

    pub fn from_whole(units: i64) -> Self {
        Money(RustDecimal::from(units))
    }

    /// Parse a canonical or raw numeric string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s.trim()).map(Money)
    }

    /// Parse an earnings figure as stored from the data source.
    ///
    /// Prize money is never negative and never above `MAX_EARNINGS`; either
    /// is treated the same as an unparseable value.
    ///
    /// # Errors
    /// Returns `MoneyError` for malformed, negative or out-of-range text.
    pub fn parse_earnings(raw: &str) -> Result<Self, MoneyError> {
        let value = Self::from_str_canonical(raw)
            .map_err(|_| MoneyError::Malformed(raw.to_string()))?;
        if value.is_negative() {
            return Err(MoneyError::Negative(raw.to_string()));
        }
        if value.0 > RustDecimal::from(MAX_EARNINGS) {
            return Err(MoneyError::OutOfRange(raw.to_string()));
        }
        Ok(value)
    }

    /// Format without exponent notation or trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Drop any fractional part (toward zero).
    pub fn trunc(&self) -> Self {
        Money(self.0.trunc())
    }

    /// Whole units as i64, saturating on overflow.
    pub fn whole_units(&self) -> i64 {
        self.0.trunc().to_i64().unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Money {
    fn from(value: RustDecimal) -> Self {
        Money(value)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl std::ops::Mul<RustDecimal> for Money {
    type Output = Money;

    fn mul(self, rhs: RustDecimal) -> Money {
        Money(self.0.saturating_mul(rhs))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_strips_trailing_zeros() {
        let m = Money::from_str_canonical("1500000.00").unwrap();
        assert_eq!(m.to_canonical_string(), "1500000");
        let m = Money::from_str_canonical("12.50").unwrap();
        assert_eq!(m.to_canonical_string(), "12.5");
    }

    #[test]
    fn test_parse_earnings_rejects_garbage_and_negatives() {
        assert!(matches!(
            Money::parse_earnings("N/A"),
            Err(MoneyError::Malformed(_))
        ));
        assert!(matches!(
            Money::parse_earnings("-10"),
            Err(MoneyError::Negative(_))
        ));
        assert_eq!(
            Money::parse_earnings(" 360000 ").unwrap(),
            Money::from_whole(360_000)
        );
    }

    #[test]
    fn test_parse_earnings_rejects_out_of_range() {
        assert!(matches!(
            Money::parse_earnings("79228162514264337593543950335"),
            Err(MoneyError::OutOfRange(_))
        ));
        assert_eq!(
            Money::parse_earnings("1000000000000").unwrap(),
            Money::from_whole(MAX_EARNINGS)
        );
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let max = Money::new(RustDecimal::MAX);
        assert_eq!(max + Money::from_whole(1), max);
        assert_eq!(max * RustDecimal::new(15, 1), max);

        let mut total = max;
        total += max;
        assert_eq!(total, max);
    }

    #[test]
    fn test_trunc_and_whole_units() {
        let m = Money::from_str_canonical("1500000.75").unwrap();
        assert_eq!(m.trunc(), Money::from_whole(1_500_000));
        assert_eq!(m.whole_units(), 1_500_000);
    }

    #[test]
    fn test_sum() {
        let total: Money = vec![Money::from_whole(10), Money::from_whole(32)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_whole(42));
    }

    #[test]
    fn test_json_serializes_as_number() {
        let json = serde_json::to_value(Money::from_whole(500_000)).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "500000.0");
    }
}
