//! Type-safe price and discount representation using decimal arithmetic.
//!
//! Prices are non-negative amounts in the store's single currency. Discounts
//! are whole-catalog percentages in `0..=100`, so applying one never yields a
//! price above the original.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors produced when constructing a [`Price`] or [`Discount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The percentage is outside `0..=100`.
    #[error("discount must be between 0 and 100 (got {0})")]
    DiscountOutOfRange(Decimal),
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest representable amount. Arithmetic saturates here.
    pub const MAX: Self = Self(Decimal::MAX);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Apply a percentage discount: `price - price * discount / 100`.
    #[must_use]
    pub fn discounted(self, discount: Discount) -> Self {
        let off = self.0.checked_mul(discount.percent()).map_or_else(
            || self.0 / Decimal::ONE_HUNDRED * discount.percent(),
            |scaled| scaled / Decimal::ONE_HUNDRED,
        );
        Self((self.0 - off).max(Decimal::ZERO))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Saturates at [`Price::MAX`].
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.0.checked_add(rhs.0).map_or(Self::MAX, Self)
    }
}

/// Saturates at zero; totals are only subtracted from amounts they bound.
impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(Decimal::ZERO))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map_or(Self::MAX, Self)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// A percentage discount in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Discount(Decimal);

impl Discount {
    /// No discount.
    pub const NONE: Self = Self(Decimal::ZERO);

    /// Create a new discount percentage.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::DiscountOutOfRange` outside `0..=100`.
    pub fn new(percent: Decimal) -> Result<Self, PriceError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PriceError::DiscountOutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// Get the percentage value.
    #[must_use]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Whether any discount applies.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl TryFrom<Decimal> for Discount {
    type Error = PriceError;

    fn try_from(percent: Decimal) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl From<Discount> for Decimal {
    fn from(discount: Discount) -> Self {
        discount.0
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(n: i64) -> Price {
        Price::new(Decimal::from(n)).unwrap()
    }

    fn discount(n: i64) -> Discount {
        Discount::new(Decimal::from(n)).unwrap()
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(matches!(
            Price::new(Decimal::from(-1)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_discount_range() {
        assert!(Discount::new(Decimal::from(101)).is_err());
        assert!(Discount::new(Decimal::from(-5)).is_err());
        assert!(Discount::new(Decimal::ONE_HUNDRED).is_ok());
    }

    #[test]
    fn test_discounted_price() {
        assert_eq!(price(100).discounted(discount(10)), price(90));
        assert_eq!(price(100).discounted(Discount::NONE), price(100));
        assert_eq!(price(100).discounted(discount(100)), Price::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates_at_max() {
        let huge = Price::new(Decimal::MAX / Decimal::TWO).unwrap();

        assert_eq!(huge * 3, Price::MAX);
        assert_eq!(huge + huge + huge, Price::MAX);
        assert_eq!([huge, huge, price(1)].into_iter().sum::<Price>(), Price::MAX);
        assert_eq!(price(7) * 3, price(21));
    }

    #[test]
    fn test_discount_on_max_price_does_not_overflow() {
        let discounted = Price::MAX.discounted(discount(10));
        assert!(discounted < Price::MAX);
        assert!(discounted > Price::ZERO);
        assert_eq!(Price::MAX.discounted(discount(100)), Price::ZERO);
    }

    #[test]
    fn test_final_price_never_exceeds_price() {
        for d in [0, 1, 33, 50, 99, 100] {
            let p = Price::new(Decimal::new(1999, 2)).unwrap();
            assert!(p.discounted(discount(d)) <= p);
        }
    }

    #[test]
    fn test_deserialize_from_number() {
        let p: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(p.amount(), Decimal::new(1999, 2));
        assert!(serde_json::from_str::<Price>("-3").is_err());
        assert!(serde_json::from_str::<Discount>("150").is_err());
    }

    #[test]
    fn test_sum_and_multiply() {
        let total: Price = [price(100) * 2, price(5) * 3].into_iter().sum();
        assert_eq!(total, price(215));
    }
}
