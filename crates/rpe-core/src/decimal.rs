//! Precision-safe decimal types.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors in price and volume calculations.
//! Statistical values (toxicity scores, confidence weights) stay `f64`;
//! money never does.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with volumes in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Calculate basis points difference from another price.
    #[inline]
    pub fn bps_from(&self, other: Price) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some((self.0 - other.0) / other.0 * Decimal::from(10000))
    }

    /// Calculate percentage difference from another price.
    ///
    /// `Price::new(dec!(240)).pct_from(Price::new(dec!(200)))` is `20`.
    #[inline]
    pub fn pct_from(&self, other: Price) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some((self.0 - other.0) / other.0 * Decimal::from(100))
    }

    /// Relative deviation from another price, as an `f64` fraction.
    ///
    /// Used by consensus scoring where the result feeds tier thresholds,
    /// not money math.
    #[inline]
    pub fn relative_deviation_from(&self, other: Price) -> Option<f64> {
        if other.is_zero() {
            return None;
        }
        ((self.0 - other.0).abs() / other.0).to_f64()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<Decimal>()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Traded volume (in quote currency) with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(pub Decimal);

impl Volume {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Clamp into an inclusive range.
    #[inline]
    pub fn clamp(self, min: Volume, max: Volume) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Volume {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<Decimal>()?))
    }
}

impl From<Decimal> for Volume {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Volume {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Volume {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Volume {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Volume {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Volume {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_bps() {
        let p1 = Price::new(dec!(100));
        let p2 = Price::new(dec!(101));

        let bps = p2.bps_from(p1).unwrap();
        assert_eq!(bps, dec!(100)); // 1% = 100 bps
    }

    #[test]
    fn test_price_pct_gap() {
        // The reference scenario: close 200, open 240 → 20.00% gap
        let close = Price::new(dec!(200));
        let open = Price::new(dec!(240));

        assert_eq!(open.pct_from(close).unwrap(), dec!(20));
    }

    #[test]
    fn test_relative_deviation() {
        let p1 = Price::new(dec!(100));
        let p2 = Price::new(dec!(103));

        let dev = p2.relative_deviation_from(p1).unwrap();
        assert!((dev - 0.03).abs() < 1e-12);

        // Symmetric in magnitude
        let dev_down = Price::new(dec!(97)).relative_deviation_from(p1).unwrap();
        assert!((dev_down - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_bps_from_zero_is_none() {
        assert!(Price::new(dec!(100)).bps_from(Price::ZERO).is_none());
        assert!(Price::new(dec!(100))
            .relative_deviation_from(Price::ZERO)
            .is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("12.5".parse::<Price>().unwrap(), Price::new(dec!(12.5)));
        assert!(matches!(
            "not-a-price".parse::<Price>(),
            Err(CoreError::DecimalParse(_))
        ));
    }

    #[test]
    fn test_volume_accumulation() {
        let mut v = Volume::ZERO;
        v += Volume::new(dec!(250.5));
        v += Volume::new(dec!(749.5));
        assert_eq!(v.inner(), dec!(1000));
    }

    #[test]
    fn test_volume_clamp() {
        let v = Volume::new(dec!(5000));
        let clamped = v.clamp(Volume::new(dec!(100)), Volume::new(dec!(2000)));
        assert_eq!(clamped.inner(), dec!(2000));
    }
}
