//! Lossless decimal numeric type backed by rust_decimal.
//!
//! All currency math in the reporting engine goes through this wrapper so
//! revenue/profit sums never accumulate floating-point drift. Serializes to a
//! JSON number, which is what the dashboard consumers expect.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Lossless decimal numeric type for financial calculations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }

    pub fn from_u32(value: u32) -> Self {
        Decimal(RustDecimal::from(value))
    }

    /// Format as a canonical string (no exponent notation, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Division that treats a zero denominator as a zero result.
    ///
    /// Participation ratios and ticket medio over an empty bucket are defined
    /// as 0, never an error.
    pub fn div_or_zero(&self, denominator: Decimal) -> Decimal {
        if denominator.is_zero() {
            Decimal::zero()
        } else {
            Decimal(self.0 / denominator.0)
        }
    }

    /// Share of `total` expressed as a percentage (0 when `total` is 0).
    pub fn percent_of(&self, total: Decimal) -> Decimal {
        self.div_or_zero(total) * Decimal::hundred()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for s in ["123.456", "0.0001", "1000000", "-123.456", "0"] {
            let decimal = Decimal::from_str_canonical(s).expect("parse failed");
            let reparsed =
                Decimal::from_str_canonical(&decimal.to_canonical_string()).expect("reparse");
            assert_eq!(decimal, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_json_serializes_as_number() {
        let decimal = Decimal::from_str_canonical("123.45").unwrap();
        let json = serde_json::to_value(decimal).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "123.45");
    }

    #[test]
    fn test_div_or_zero_on_zero_denominator() {
        let revenue = Decimal::from_i64(100);
        assert_eq!(revenue.div_or_zero(Decimal::zero()), Decimal::zero());
        assert_eq!(
            revenue.div_or_zero(Decimal::from_i64(4)),
            Decimal::from_i64(25)
        );
    }

    #[test]
    fn test_percent_of() {
        let part = Decimal::from_i64(5);
        let total = Decimal::from_i64(20);
        assert_eq!(part.percent_of(total), Decimal::from_i64(25));
        assert_eq!(part.percent_of(Decimal::zero()), Decimal::zero());
    }

    #[test]
    fn test_sum_and_add_assign() {
        let values = vec![
            Decimal::from_i64(1),
            Decimal::from_str_canonical("2.5").unwrap(),
            Decimal::from_i64(-1),
        ];
        let total: Decimal = values.into_iter().sum();
        assert_eq!(total.to_canonical_string(), "2.5");

        let mut acc = Decimal::zero();
        acc += Decimal::from_i64(7);
        assert_eq!(acc, Decimal::from_i64(7));
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Decimal::from_i64(3).is_positive());
        assert!(Decimal::from_i64(-3).is_negative());
        assert!(Decimal::zero().is_zero());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
    }
}
