//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A kirana shop bills in rupees and paise:                               │
//! │    ₹80.00 × 3 at 5% GST = ₹252.00, every time, on every till           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise)                              │
//! │    24000 paise × 10500 / 10000 = 25200 paise, exactly                  │
//! │    Rounding happens once, at a documented point, half-up               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Points
//! ```text
//! ┌──────────────────────────┬────────────────────────────────────────────┐
//! │ Value                    │ Rounded to                                 │
//! ├──────────────────────────┼────────────────────────────────────────────┤
//! │ Sale subtotal            │ exact (never rounded)                      │
//! │ Sale tax (stored)        │ minor unit, half-up                        │
//! │ Sale total               │ whole major unit, half-up, from the EXACT  │
//! │                          │ subtotal × (1 + rate), not subtotal + tax  │
//! │ Payroll amount           │ whole major unit, half-up                  │
//! │ Payroll daily rate       │ minor unit, half-up (display only)         │
//! └──────────────────────────┴────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::money::Money;
//!
//! // Create from minor units (preferred)
//! let price = Money::from_minor(4550); // 45.50
//!
//! // Arithmetic operations
//! let doubled = price * 2_i64;                   // 91.00
//! let total = price + Money::from_major(5);     // 50.50
//! assert_eq!(total.to_string(), "50.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Minor units per major unit (paise per rupee).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Rounding Helper
// =============================================================================

/// Divides `numerator / denominator` rounding half-up (towards +∞ at .5).
///
/// Equivalent to `floor(n / d + 0.5)` for a positive denominator, which is
/// the rounding every till-side total in the shop is expected to follow.
#[inline]
pub(crate) fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (paise).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for net losses and refunds
/// - **Single field tuple struct**: Serializes as a bare integer in documents
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// Product.sales_price ──► SaleItem.price (snapshot) ──► Sale.subtotal
///                                                          │
///                       TaxRate (settings) ──► Sale.tax ◄──┤
///                                                          ▼
///                                                      Sale.total ──► DailyReport
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (paise).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let price = Money::from_minor(4550);
    /// assert_eq!(price.minor(), 4550);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units (rupees).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(80).minor(), 8000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated towards zero).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1099).major(), 10);
    /// assert_eq!(Money::from_minor(-550).major(), -5);
    /// ```
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let unit_price = Money::from_major(80);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_major(240));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates tax at `rate`, rounded half-up to the minor unit.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    /// use kirana_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_major(240);
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(500)); // 5%
    /// assert_eq!(tax, Money::from_major(12));
    ///
    /// // 10.00 at 8.25% = 0.825 → 0.83
    /// let tax = Money::from_minor(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.minor(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large day totals from overflowing the multiplication
        let tax = div_round_half_up(self.0 as i128 * rate.bps() as i128, 10_000);
        Money(tax as i64)
    }

    /// Computes the grand total `subtotal × (1 + rate)`, rounded half-up to a
    /// whole major unit.
    ///
    /// The product is taken exactly before rounding, so the stored
    /// (minor-rounded) tax never leaks a second rounding into the total.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart subtotal: 240.00
    ///      │
    ///      ▼
    /// grand_total(5%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// 240.00 × 1.05 = 252.00 → rounds to 252.00
    /// ```
    pub fn grand_total(&self, rate: TaxRate) -> Money {
        let scaled = self.0 as i128 * (10_000 + rate.bps() as i128);
        let major = div_round_half_up(scaled, 10_000 * MINOR_PER_MAJOR as i128);
        Money::from_major(major as i64)
    }

    /// Computes `self × numerator / denominator`, rounded half-up to a whole
    /// major unit.
    ///
    /// Used for pro-rating a monthly salary over attendance. Returns zero for
    /// a non-positive denominator.
    pub fn prorate_to_major(&self, numerator: i64, denominator: i64) -> Money {
        if denominator <= 0 {
            return Money::zero();
        }
        let scaled = self.0 as i128 * numerator as i128;
        let major = div_round_half_up(scaled, denominator as i128 * MINOR_PER_MAJOR as i128);
        Money::from_major(major as i64)
    }

    /// Divides by `divisor`, rounded half-up to the minor unit.
    ///
    /// Returns zero for a non-positive divisor.
    pub fn divide_rounded(&self, divisor: i64) -> Money {
        if divisor <= 0 {
            return Money::zero();
        }
        Money(div_round_half_up(self.0 as i128, divisor as i128) as i64)
    }

    /// Parses a human-entered decimal amount (`"45"`, `"12.5"`, `"1,200.00"`).
    ///
    /// Thousands separators and a leading rupee sign are ignored. Digits past
    /// the second decimal place round half-up into the minor unit.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("1,200.50").unwrap().minor(), 120050);
    /// assert_eq!(Money::parse_decimal("12.5").unwrap().minor(), 1250);
    /// assert!(Money::parse_decimal("twelve").is_err());
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("'{}' {}", input, reason),
        };

        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();

        let (negative, body) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (whole, fraction) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("is empty"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("is not a number"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("is too large"))?
        };

        // First two fraction digits are paise, the third decides rounding
        let digits: Vec<i64> = fraction
            .chars()
            .take(3)
            .map(|c| c as i64 - '0' as i64)
            .collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).map(|d| *d >= 5).unwrap_or(false);

        let minor = whole_value
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| invalid("is too large"))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`"252.00"`, `"-5.50"`).
///
/// ## Note
/// The currency symbol is a presentation concern and is added by the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

/// Default money is zero.
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

/// Multiplication by quantity.
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
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_and_major() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
        assert_eq!(Money::from_major(252).minor(), 25200);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!((-a).minor(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_checkout_scenario_tax_and_total() {
        // 80 × 3 at 5% GST → subtotal 240, tax 12, total 252
        let subtotal = Money::from_major(80).multiply_quantity(3);
        let rate = TaxRate::from_percentage(5.0);

        assert_eq!(subtotal, Money::from_major(240));
        assert_eq!(subtotal.calculate_tax(rate), Money::from_major(12));
        assert_eq!(subtotal.grand_total(rate), Money::from_major(252));
    }

    #[test]
    fn test_grand_total_rounds_half_up_to_major() {
        // 10.50 × 1.00 = 10.50 → 11
        assert_eq!(
            Money::from_minor(1050).grand_total(TaxRate::zero()),
            Money::from_major(11)
        );
        // 10.49 → 10
        assert_eq!(
            Money::from_minor(1049).grand_total(TaxRate::zero()),
            Money::from_major(10)
        );
        // 99.00 at 18% = 116.82 → 117
        assert_eq!(
            Money::from_major(99).grand_total(TaxRate::from_bps(1800)),
            Money::from_major(117)
        );
    }

    #[test]
    fn test_grand_total_uses_exact_product_not_rounded_tax() {
        // 0.10 at 5% → tax 0.005 rounds to 0.01, but the exact total is
        // 0.105 which rounds to 0 major units
        let subtotal = Money::from_minor(10);
        let rate = TaxRate::from_bps(500);
        assert_eq!(subtotal.calculate_tax(rate).minor(), 1);
        assert_eq!(subtotal.grand_total(rate), Money::zero());
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        let amount = Money::from_minor(1000);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(825)).minor(), 83);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(1000)).minor(), 100);
    }

    #[test]
    fn test_prorate_payroll_example() {
        // 9000 over 30 days, 22.5 days present (45 half-days) → 6750
        let salary = Money::from_major(9000);
        assert_eq!(salary.prorate_to_major(45, 60), Money::from_major(6750));
        assert_eq!(salary.divide_rounded(30), Money::from_major(300));
    }

    #[test]
    fn test_prorate_rounds_half_up() {
        // 1000 / 30 × 1.5 = 50.0; 1000 / 31 × 1 = 32.258 → 32
        let salary = Money::from_major(1000);
        assert_eq!(salary.prorate_to_major(3, 60), Money::from_major(50));
        assert_eq!(salary.prorate_to_major(2, 62), Money::from_major(32));
        // 1 / 2 = 0.5 → 1
        assert_eq!(Money::from_major(1).prorate_to_major(1, 2), Money::from_major(1));
        assert_eq!(salary.prorate_to_major(1, 0), Money::zero());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("45").unwrap().minor(), 4500);
        assert_eq!(Money::parse_decimal(" 12.5 ").unwrap().minor(), 1250);
        assert_eq!(Money::parse_decimal("1,200.00").unwrap().minor(), 120000);
        assert_eq!(Money::parse_decimal("₹99.99").unwrap().minor(), 9999);
        assert_eq!(Money::parse_decimal("0.125").unwrap().minor(), 13);
        assert_eq!(Money::parse_decimal("-5.5").unwrap().minor(), -550);
        assert_eq!(Money::parse_decimal(".75").unwrap().minor(), 75);
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(Money::parse_decimal("").is_err());
        assert!(Money::parse_decimal("abc").is_err());
        assert!(Money::parse_decimal("1.2.3").is_err());
        assert!(Money::parse_decimal("99999999999999999999").is_err());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(-100).is_negative());
        assert_eq!(Money::from_minor(-100).abs().minor(), 100);
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Money::from_minor(25200)).unwrap();
        assert_eq!(json, "25200");
    }
}
