//! Monetary amounts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount with two fractional digits.
///
/// Backed by [`Decimal`] so that `NUMERIC(10, 2)` columns round-trip
/// exactly. Serializes as a decimal string (`"12.50"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Number of fractional digits every amount is kept at.
    pub const SCALE: u32 = 2;

    /// Creates an amount, rounding half away from zero to two digits.
    pub fn from_decimal(amount: Decimal) -> Self {
        let mut rounded =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        Self(rounded)
    }

    /// Creates an amount from minor units (e.g. `1250` = `12.50`).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::SCALE))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money::from_decimal(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::from_decimal(amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::from_decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_cents_keeps_two_digits() {
        let money = Money::from_cents(1250);
        assert_eq!(money.amount(), dec!(12.50));
        assert_eq!(money.to_string(), "12.50");
    }

    #[test]
    fn from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(1.005)).to_string(), "1.01");
        assert_eq!(Money::from_decimal(dec!(3)).to_string(), "3.00");
    }

    #[test]
    fn multiply_and_sum() {
        let soup = Money::from_cents(1550);
        let total: Money = [soup.multiply(2), Money::from_cents(300)].into_iter().sum();
        assert_eq!(total, Money::from_cents(3400));
    }

    #[test]
    fn zero_and_sign() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(-1).is_negative());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "\"9.99\"");
    }
}
