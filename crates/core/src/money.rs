use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// A signed amount held at minor-unit (cent) precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid amount: '{0}'")]
pub struct ParseMoneyError(pub String);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// `None` when the amount does not fit in `i64` cents.
    pub fn to_cents(self) -> Option<i64> {
        self.0.checked_mul(Decimal::ONE_HUNDRED)?.round().to_i64()
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Fixed two-decimal rendering without currency symbol, e.g. `-42.50`.
    pub fn to_plain_string(self) -> String {
        format!("{:.2}", self.0)
    }

    /// Parses amounts as banks print them: `1,234.56`, `-50.00`, `$12`,
    /// `(42.50)` for negatives, and `42,50` when a comma is the only separator
    /// and is followed by at most two digits.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
            (true, &s[1..s.len() - 1])
        } else {
            (false, s)
        };
        let mut cleaned = s.replace(['$', ' '], "");
        if let Some(rest) = cleaned.strip_prefix('+') {
            cleaned = rest.to_string();
        }
        if cleaned.is_empty() {
            return None;
        }

        let decimal_comma = !cleaned.contains('.')
            && cleaned.matches(',').count() == 1
            && cleaned
                .rsplit(',')
                .next()
                .is_some_and(|frac| !frac.is_empty() && frac.len() <= 2);
        let cleaned = if decimal_comma {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        };

        let dec = Decimal::from_str(&cleaned).ok()?;
        let money = Money::from_decimal(dec);
        Some(if negative { -money.abs() } else { money })
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s).ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
