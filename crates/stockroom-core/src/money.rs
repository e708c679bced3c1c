//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + one rounding step                        │
//! │    line tax = 1999 cents × 825 bps  = 16_491_750 (1/10000 cent units)  │
//! │    Σ over lines stays exact in i128                                    │
//! │    round once when the figure is persisted → 1649 cents                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line.cents(), 3297);
//! assert_eq!(line.to_string(), "32.97");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Denominator of a basis-point scaled amount (1 bp = 1/10000).
pub const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: an over-sized flat discount can push a bill total
///   below zero, and that value must be representable
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as a bare integer** of cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
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
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, or `None` if the product leaves `i64`.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(unit_price.checked_multiply_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `self × rate` without rounding, in 1/10000-cent units.
    ///
    /// Callers accumulate these exact values and round once with
    /// [`Money::from_bps_scaled`].
    #[inline]
    pub fn scaled_by(&self, rate: TaxRate) -> i128 {
        self.0 as i128 * rate.bps() as i128
    }

    /// Rounds a 1/10000-cent amount to whole cents, half away from zero.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_bps_scaled(8_250).cents(), 1);   // 0.825 → 1
    /// assert_eq!(Money::from_bps_scaled(4_999).cents(), 0);
    /// assert_eq!(Money::from_bps_scaled(-5_000).cents(), -1);
    /// ```
    pub fn from_bps_scaled(scaled: i128) -> Self {
        let half = BPS_SCALE / 2;
        let cents = if scaled >= 0 {
            (scaled + half) / BPS_SCALE
        } else {
            -((-scaled + half) / BPS_SCALE)
        };
        Money(cents as i64)
    }

    /// Returns `rate` percent of this amount, rounded to cents.
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    /// use stockroom_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(5000);
    /// assert_eq!(subtotal.percentage(TaxRate::from_bps(1000)).cents(), 500);
    /// ```
    pub fn percentage(&self, rate: TaxRate) -> Money {
        Money::from_bps_scaled(self.scaled_by(rate))
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub fn floor_at_zero(self) -> Money {
        Money(self.0.max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering with two places and no currency symbol.
///
/// Currency symbols are a presentation concern of the app configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((b - a).cents(), -750);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 1500);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = Money::from_cents(i64::MAX / 2 + 1);

        assert_eq!(Money::from_cents(1000).checked_multiply_quantity(3).map(|m| m.cents()), Some(3000));
        assert_eq!(big.checked_multiply_quantity(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::zero().checked_sub(big).map(|m| m.is_negative()), Some(true));
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(Money::from_bps_scaled(5_000).cents(), 1);
        assert_eq!(Money::from_bps_scaled(14_999).cents(), 1);
        assert_eq!(Money::from_bps_scaled(15_000).cents(), 2);
        assert_eq!(Money::from_bps_scaled(25_000).cents(), 3);
        assert_eq!(Money::from_bps_scaled(-15_000).cents(), -2);
    }

    #[test]
    fn test_percentage() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage(TaxRate::from_bps(825)).cents(), 83);

        // 19.99 at 5% = 0.9995 → 1.00
        let amount = Money::from_cents(1999);
        assert_eq!(amount.percentage(TaxRate::from_bps(500)).cents(), 100);
    }

    #[test]
    fn test_scaled_values_accumulate_without_loss() {
        // Three lines of 0.10 at 5% each carry 0.005 of tax.
        // Rounded per line that would be 3 cents; rounded once it is 2.
        let line = Money::from_cents(10);
        let rate = TaxRate::from_bps(500);
        let exact: i128 = (0..3).map(|_| line.scaled_by(rate)).sum();
        assert_eq!(Money::from_bps_scaled(exact).cents(), 2);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-1).floor_at_zero(), Money::zero());
        assert_eq!(Money::from_cents(7).floor_at_zero().cents(), 7);
    }
}
