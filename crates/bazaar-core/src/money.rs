//! # Money Module
//!
//! Provides the `Money` type for monetary values and `TaxRate` for the
//! sales tax applied at checkout.
//!
//! ## Floating Point, Rounded Only For Display
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HOW AMOUNTS FLOW                                                       │
//! │                                                                         │
//! │  Product.price (f64) ──► discount ──► × quantity ──► Σ subtotal         │
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                          subtotal × 10% = tax           │
//! │                                          subtotal + tax = total         │
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                          Display: "990.00"              │
//! │                                                                         │
//! │  No rounding happens between the steps above. Per-line float error     │
//! │  is tolerated because nothing reconciles these figures downstream;     │
//! │  two-decimal rounding is applied when a value is shown.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::Money;
//!
//! let price = Money::from_amount(500.0);
//! let discounted = price.apply_percentage_discount(10.0);
//! assert_eq!(discounted.amount(), 450.0);
//!
//! let line = discounted * 2;
//! assert_eq!(line.to_string(), "900.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in major currency units (e.g. rupees).
///
/// ## Design Decisions
/// - **f64**: amounts come from user-entered decimal prices and are only
///   ever displayed, never reconciled
/// - **Single field tuple struct**: zero-cost wrapper, serializes as a bare
///   number
/// - **No `Eq`/`Ord`**: floats are compared through [`Money::approx_eq`]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(f64);

impl Money {
    /// Tolerance used by [`Money::approx_eq`].
    pub const EPSILON: f64 = 1e-9;

    /// Creates a Money value from an amount in major units.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_amount(10.99);
    /// assert_eq!(price.amount(), 10.99);
    /// ```
    #[inline]
    pub const fn from_amount(amount: f64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount, unrounded.
    #[inline]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0.0)
    }

    /// Checks if the value is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Returns the amount rounded half away from zero to two decimals.
    ///
    /// Presentation only: never feed the result back into a calculation.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// assert_eq!(Money::from_amount(10.456).rounded(), 10.46);
    /// assert_eq!(Money::from_amount(3.0).rounded(), 3.0);
    /// ```
    pub fn rounded(&self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }

    /// Compares two amounts within [`Money::EPSILON`].
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() < Self::EPSILON
    }

    /// Calculates tax on this amount.
    ///
    /// ## Formula
    /// `amount × bps / 10000`, no intermediate rounding.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_amount(240.0);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(tax.amount(), 24.0);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Returns the price left after taking `percent` off.
    ///
    /// ## Formula
    /// `amount × (1 − percent / 100)`
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_amount(100.0);
    /// assert_eq!(price.apply_percentage_discount(20.0).amount(), 80.0);
    /// ```
    pub fn apply_percentage_discount(&self, percent: f64) -> Money {
        Money(self.0 * (1.0 - percent / 100.0))
    }

    /// Returns the amount that `percent` takes off this price.
    ///
    /// ## Formula
    /// `amount × (percent / 100)`
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_amount(100.0);
    /// assert_eq!(price.percentage_of(20.0).amount(), 20.0);
    /// ```
    pub fn percentage_of(&self, percent: f64) -> Money {
        Money(self.0 * (percent / 100.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two-decimal display, no currency symbol.
///
/// Currency formatting with a symbol lives in the app configuration.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
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

/// Multiplication by a unit count.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty as f64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 1000 bps = 10%.
/// Keeping the rate integral makes it trivially comparable and
/// configurable from an environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for configuration input).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a multiplier (1000 bps → 0.1).
    #[inline]
    pub fn fraction(&self) -> f64 {
        f64::from(self.0) / 10_000.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_two_decimals() {
        assert_eq!(Money::from_amount(10.999).to_string(), "11.00");
        assert_eq!(Money::from_amount(5.0).to_string(), "5.00");
        assert_eq!(Money::from_amount(0.0).to_string(), "0.00");
        assert_eq!(Money::from_amount(1234.5).to_string(), "1234.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_amount(10.0);
        let b = Money::from_amount(2.5);

        assert_eq!((a + b).amount(), 12.5);
        assert_eq!((a - b).amount(), 7.5);
        assert_eq!((a * 3).amount(), 30.0);

        let mut c = a;
        c += b;
        c -= Money::from_amount(0.5);
        assert_eq!(c.amount(), 12.0);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1.0, 2.0, 3.5]
            .into_iter()
            .map(Money::from_amount)
            .sum();
        assert_eq!(total.amount(), 6.5);
    }

    #[test]
    fn test_discount_helpers() {
        let price = Money::from_amount(500.0);
        assert_eq!(price.apply_percentage_discount(10.0).amount(), 450.0);
        assert_eq!(price.percentage_of(10.0).amount(), 50.0);
        assert_eq!(price.apply_percentage_discount(0.0).amount(), 500.0);
        assert_eq!(price.percentage_of(0.0).amount(), 0.0);
    }

    #[test]
    fn test_tax_calculation() {
        let subtotal = Money::from_amount(900.0);
        let tax = subtotal.calculate_tax(TaxRate::from_bps(1000));
        assert!(tax.approx_eq(Money::from_amount(90.0)));
    }

    /// Unrounded intermediate values are kept; rounding is display-only.
    #[test]
    fn test_no_mid_calculation_rounding() {
        let third = Money::from_amount(10.0 / 3.0);
        let tripled = third * 3;

        assert!(tripled.approx_eq(Money::from_amount(10.0)));
        assert_eq!(third.to_string(), "3.33");
        assert_ne!(third.amount(), third.rounded());
    }

    #[test]
    fn test_tax_rate_conversions() {
        let rate = TaxRate::from_percentage(10.0);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.fraction() - 0.1).abs() < f64::EPSILON);
        assert!((rate.percentage() - 10.0).abs() < f64::EPSILON);
        assert_eq!(TaxRate::default(), TaxRate::zero());
    }

    #[test]
    fn test_zero_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::from_amount(0.01).is_positive());
    }
}
