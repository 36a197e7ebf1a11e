use crate::error::OddJobsError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Currency every amount is quoted in unless configured otherwise.
pub const DEFAULT_CURRENCY: &str = "ZAR";

/// A non-negative monetary value.
///
/// Wraps `rust_decimal::Decimal` so that budgets, fees and tips can never go
/// negative and arithmetic stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, OddJobsError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(OddJobsError::ValidationError(
                "Amount must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = OddJobsError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

// Sums of non-negative values stay non-negative, so only addition is exposed.
impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(OddJobsError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::new(dec!(10.0)).unwrap();
        let b = Amount::new(dec!(5.5)).unwrap();
        assert_eq!((a + b).value(), dec!(15.5));

        let total: Amount = [a, b, Amount::ZERO].into_iter().sum();
        assert_eq!(total.value(), dec!(15.5));
    }

    #[test]
    fn test_amount_rejects_negative_json() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"-3\"");
        assert!(parsed.is_err());
        let parsed: Amount = serde_json::from_str("\"300\"").unwrap();
        assert_eq!(parsed.value(), dec!(300));
    }

    #[test]
    fn test_amount_display_is_normalized() {
        let amount = Amount::new(dec!(550.00)).unwrap();
        assert_eq!(amount.to_string(), "550");
    }
}
