//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Splitting a ৳10.00 payment across three lines with floats:            │
//! │    3.3333.. + 3.3333.. + 3.3333.. = 9.999999..  ❌ drift                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer poisha (1 taka = 100 poisha)                     │
//! │    1000 / 3 = 333, 333, 334 (remainder assigned explicitly)            │
//! │    Σ = 1000 exactly                                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dokan_core::money::Money;
//!
//! let price = Money::from_minor(1099); // ৳10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.minor(), 3297);
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (poisha).
///
/// ## Design Decisions
/// - **i64 (signed)**: credit balances go negative on overpayment
/// - **Major-unit wire format**: serializes as a JSON number of taka
///   (`"sellPrice": 10.5`), see [Wire Format](#wire-format)
/// - **Ord**: clamping (`max(Money::zero())`) is plain `Ord::max`
///
/// ## Where Money Flows
/// ```text
/// Product.sell_price ──► line gross ──► discount share ──► line net
///                                                           │
///                          paid share ◄─────────────────────┤
///                                                           ▼
///                                  line due ──► Credit.total_due
/// ```
///
/// ## Wire Format
/// Backups and the remote document carry prices in taka, so the JSON form
/// is a plain number in major units. Whole amounts are written as integers
/// and fractional ones as floats; reading rounds to the nearest poisha.
/// ```text
/// Money::from_minor(1050)  ◄──►  10.5
/// Money::from_minor(10000) ◄──►  100
/// null                      ──►  Money::zero()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// let price = Money::from_minor(1099); // ৳10.99
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole taka.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -৳5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-taka portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the poisha portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Converts a major-unit amount, rounding to the nearest poisha.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 range.
    pub fn from_major_f64(major: f64) -> Option<Money> {
        let minor = (major * 100.0).round();
        if !minor.is_finite() || minor < i64::MIN as f64 || minor >= i64::MAX as f64 {
            return None;
        }
        Some(Money(minor as i64))
    }

    /// Divides by a positive quantity, rounding half away from zero.
    ///
    /// Used to turn a batch cost into a unit cost. Returns `None` when
    /// `qty` is not positive.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// // ৳250.00 for 5 units → ৳50.00 each
    /// let unit = Money::from_major(250).divide_by_quantity(5).unwrap();
    /// assert_eq!(unit, Money::from_major(50));
    ///
    /// // ৳10.00 for 3 units → ৳3.33 each (3.333.. rounds down)
    /// let unit = Money::from_minor(1000).divide_by_quantity(3).unwrap();
    /// assert_eq!(unit.minor(), 333);
    /// ```
    pub fn divide_by_quantity(&self, qty: i64) -> Option<Money> {
        if qty <= 0 {
            return None;
        }
        let value = self.0 as i128;
        let qty = qty as i128;
        let half = qty / 2;
        let rounded = if value >= 0 {
            (value + half) / qty
        } else {
            (value - half) / qty
        };
        Some(Money(rounded as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with the taka sign.
///
/// ## Note
/// This is for logs and the CLI. The external UI formats for its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}৳{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.0 as f64 / 100.0)
        }
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in taka")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Money)
            .ok_or_else(|| E::custom(format!("amount {v} is out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_major_f64(v).ok_or_else(|| E::custom(format!("amount {v} is out of range")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "৳10.99");
        assert_eq!(Money::from_minor(500).to_string(), "৳5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-৳5.50");
        assert_eq!(Money::zero().to_string(), "৳0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!((-a).minor(), -1000);
    }

    #[test]
    fn test_sum() {
        let values = [Money::from_minor(1), Money::from_minor(2), Money::from_minor(3)];
        let total: Money = values.iter().sum();
        assert_eq!(total.minor(), 6);
    }

    #[test]
    fn test_divide_by_quantity_rounding() {
        assert_eq!(Money::from_minor(1000).divide_by_quantity(3), Some(Money::from_minor(333)));
        assert_eq!(Money::from_minor(1001).divide_by_quantity(2), Some(Money::from_minor(501)));
        assert_eq!(Money::from_minor(-1001).divide_by_quantity(2), Some(Money::from_minor(-501)));
        assert_eq!(Money::from_minor(1000).divide_by_quantity(0), None);
        assert_eq!(Money::from_minor(1000).divide_by_quantity(-4), None);
    }

    #[test]
    fn test_serializes_in_major_units() {
        assert_eq!(serde_json::to_string(&Money::from_minor(27000)).unwrap(), "270");
        assert_eq!(serde_json::to_string(&Money::from_minor(1050)).unwrap(), "10.5");
        assert_eq!(serde_json::to_string(&Money::from_minor(-199)).unwrap(), "-1.99");
    }

    #[test]
    fn test_deserializes_integers_floats_and_null() {
        let whole: Money = serde_json::from_str("100").unwrap();
        assert_eq!(whole.minor(), 10000);
        let fractional: Money = serde_json::from_str("10.5").unwrap();
        assert_eq!(fractional.minor(), 1050);
        let negative: Money = serde_json::from_str("-20").unwrap();
        assert_eq!(negative.minor(), -2000);
        // 0.1 + 0.2 style float noise rounds to the nearest poisha
        let noisy: Money = serde_json::from_str("0.30000000000000004").unwrap();
        assert_eq!(noisy.minor(), 30);
        let missing: Money = serde_json::from_str("null").unwrap();
        assert!(missing.is_zero());
        assert!(serde_json::from_str::<Money>("\"12\"").is_err());
        assert!(serde_json::from_str::<Money>("1e300").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(
            Money::from_minor(300).checked_multiply_quantity(3),
            Some(Money::from_minor(900))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_multiply_quantity(2), None);
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
        assert_eq!(
            Money::from_minor(1).checked_add(Money::from_minor(2)),
            Some(Money::from_minor(3))
        );
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
        assert_eq!(Money::from_minor(-550).abs().minor(), 550);
    }
}
