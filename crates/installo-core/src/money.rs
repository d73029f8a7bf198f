//! # Money and Rate Types
//!
//! Integer-only monetary arithmetic for Installo.
//!
//! ## Why No Floating Point?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Splitting 15,000,000 across three partners with f64 shares:           │
//! │                                                                         │
//! │     15_000_000 × (1/3) = 4_999_999.999999999 → round → 5_000_000       │
//! │     three times        = 15_000_000 ... or 14_999_999, or 15_000_001   │
//! │                                                                         │
//! │  Every split that leaks a unit shows up later as reconciliation drift. │
//! │  Money is an i64 count of the smallest reporting unit; every ratio is  │
//! │  computed with a 128-bit intermediate and an explicit rounding rule.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest reporting unit used by the business.
///
/// Signed so that deltas (withdrawals, corrections) can be expressed, but
/// every persisted balance is expected to be non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from currency units.
    ///
    /// ## Example
    /// ```rust
    /// use installo_core::money::Money;
    ///
    /// let price = Money::from_units(22_000_000);
    /// assert_eq!(price.units(), 22_000_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the raw unit count.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Zero.
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

    /// Floors the value at zero.
    ///
    /// Used wherever a balance is a soft floor (available capital).
    #[inline]
    pub const fn floor_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Applies a rate and rounds half away from zero.
    ///
    /// ## Implementation
    /// `(amount × bps ± 5000) / 10000` in i128, so `round(x × rate)` never
    /// overflows and never touches a float.
    ///
    /// ## Example
    /// ```rust
    /// use installo_core::money::{Money, Rate};
    ///
    /// let balance = Money::from_units(15_000_000);
    /// let interest = balance.apply_rate(Rate::from_bps(400));
    /// assert_eq!(interest.units(), 600_000);
    ///
    /// // 12_345 × 4% = 493.8 → 494
    /// assert_eq!(Money::from_units(12_345).apply_rate(Rate::from_bps(400)).units(), 494);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let half = if product < 0 { -5000 } else { 5000 };
        Money::from_units(((product + half) / 10000) as i64)
    }

    /// Integer division rounded up to the next multiple of `step`.
    ///
    /// `ceil_div_to_step(12_000_000, 5, 1000)` is the monthly payment of a
    /// 12,000,000 plan over 5 months quoted in thousands.
    ///
    /// ## Example
    /// ```rust
    /// use installo_core::money::Money;
    ///
    /// let payable = Money::from_units(11_200_000);
    /// assert_eq!(payable.ceil_div_to_step(3, 1000).units(), 3_734_000);
    /// ```
    pub fn ceil_div_to_step(&self, divisor: i64, step: i64) -> Money {
        let unit = divisor.max(1) as i128 * step.max(1) as i128;
        let value = self.0 as i128;
        let steps = if value <= 0 {
            value / unit
        } else {
            (value + unit - 1) / unit
        };
        Money::from_units((steps * step.max(1) as i128) as i64)
    }

    /// Splits into `parts` pieces that sum exactly to `self`.
    ///
    /// Each piece is `floor(self / parts)`; the remainder is handed out one
    /// unit at a time to the first pieces. Negative values are not split.
    ///
    /// ## Example
    /// ```rust
    /// use installo_core::money::Money;
    ///
    /// let pieces = Money::from_units(10).spread(3);
    /// let units: Vec<i64> = pieces.iter().map(|m| m.units()).collect();
    /// assert_eq!(units, vec![4, 3, 3]);
    /// ```
    pub fn spread(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let parts_i = parts as i64;
        let base = self.0.max(0) / parts_i;
        let remainder = self.0.max(0) % parts_i;
        (0..parts_i)
            .map(|i| Money(base + if i < remainder { 1 } else { 0 }))
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Groups thousands with commas: `15,000,000`.
///
/// For logs and error messages; the UI formats for its own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            write!(f, "{}", grouped)
        }
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// An interest rate in basis points (1 bp = 0.01%).
///
/// 400 bps = 4% per month, 800 bps = 8% over a whole custom plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (`8.5` → 850 bps).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage (display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(15_000_000).to_string(), "15,000,000");
        assert_eq!(Money::from_units(999).to_string(), "999");
        assert_eq!(Money::from_units(1000).to_string(), "1,000");
        assert_eq!(Money::from_units(-2_500).to_string(), "-2,500");
        assert_eq!(Money::zero().to_string(), "0");
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // 10 × 4% = 0.4 → 0
        assert_eq!(Money::from_units(10).apply_rate(Rate::from_bps(400)).units(), 0);
        // 13 × 4% = 0.52 → 1
        assert_eq!(Money::from_units(13).apply_rate(Rate::from_bps(400)).units(), 1);
        // 125 × 4% = 5.0
        assert_eq!(Money::from_units(125).apply_rate(Rate::from_bps(400)).units(), 5);
        // 1_000_000 × 8% = 80_000
        assert_eq!(
            Money::from_units(1_000_000).apply_rate(Rate::from_bps(800)).units(),
            80_000
        );
    }

    #[test]
    fn test_apply_rate_negative_is_symmetric() {
        let pos = Money::from_units(13).apply_rate(Rate::from_bps(400));
        let neg = Money::from_units(-13).apply_rate(Rate::from_bps(400));
        assert_eq!(pos, -neg);
    }

    #[test]
    fn test_ceil_div_to_step() {
        let payable = Money::from_units(12_000_000);
        assert_eq!(payable.ceil_div_to_step(5, 1000).units(), 2_400_000);

        let payable = Money::from_units(1_001);
        assert_eq!(payable.ceil_div_to_step(2, 1000).units(), 1_000);

        let payable = Money::from_units(10);
        assert_eq!(payable.ceil_div_to_step(3, 1).units(), 4);
    }

    #[test]
    fn test_spread_sums_exactly() {
        let amount = Money::from_units(15_000_001);
        let pieces = amount.spread(10);
        assert_eq!(pieces.len(), 10);
        assert_eq!(pieces.iter().sum::<Money>(), amount);
        assert_eq!(pieces[0].units(), 1_500_001);
        assert_eq!(pieces[9].units(), 1_500_000);
    }

    #[test]
    fn test_floor_zero() {
        assert_eq!(Money::from_units(-5).floor_zero(), Money::zero());
        assert_eq!(Money::from_units(5).floor_zero().units(), 5);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(8.0).bps(), 800);
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
        assert_eq!(Rate::from_bps(400).to_string(), "4.00%");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(400);
        assert_eq!((a + b).units(), 1400);
        assert_eq!((a - b).units(), 600);
        assert_eq!((b * 3).units(), 1200);

        let mut c = a;
        c += b;
        c -= Money::from_units(100);
        assert_eq!(c.units(), 1300);
    }
}
