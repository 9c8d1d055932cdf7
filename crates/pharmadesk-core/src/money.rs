//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing bill lines as floats:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A split payment of ₹60.00 + ₹40.00 can then fail a ₹100.00 check.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    ₹10.00 × 2 + ₹15.00 × 3 = 2000 + 4500 = 6500 paise, exactly.        │
//! │    Only the boundary (parse / display) ever sees a decimal point.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmadesk_core::money::Money;
//!
//! let price = Money::parse("10.50").unwrap();
//! assert_eq!(price.paise(), 1050);
//!
//! let line_total = price.multiply_quantity(2);
//! assert_eq!(line_total.to_string(), "₹21.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Tolerance used when reconciling split payments: one paisa (₹0.01).
pub const PAYMENT_TOLERANCE: Money = Money::from_paise(1);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts may be negative (a surcharge), price
///   differences may be negative (buying above MRP)
/// - **Single field tuple struct**: serializes as a bare integer on the wire
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.unit_price × quantity ──► line_total ──┐                      │
/// │                                                  ▼                      │
/// │                               aggregate() ──► subtotal − discount       │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │                     final_amount ──► reconcile_payment(cash, upi)       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts only the rupee part carries the sign:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees_paise(12, 34).paise(), 1234);
    /// assert_eq!(Money::from_rupees_paise(-5, 50).paise(), -550);
    /// ```
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// Validated lines never get near saturation, see
    /// [`crate::validation::MAX_ITEM_QUANTITY`].
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(1500);
    /// assert_eq!(unit_price.multiply_quantity(3).paise(), 4500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity, `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Parses a decimal rupee string such as `"65"`, `"60.5"` or `"-5.00"`.
    ///
    /// ## Rules
    /// - Optional leading `+` or `-`
    /// - Digits, optionally followed by `.` and at most two digits
    /// - Surrounding whitespace is ignored
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// assert_eq!(Money::parse("60.5").unwrap().paise(), 6050);
    /// assert_eq!(Money::parse("-5").unwrap().paise(), -500);
    /// assert!(Money::parse("1.234").is_err());
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, digits) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(ValidationError::invalid_format("amount", "no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("'{}' is not a decimal number", s),
            ));
        }
        if frac.len() > 2 {
            return Err(ValidationError::invalid_format(
                "amount",
                "at most two decimal places are allowed",
            ));
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| ValidationError::invalid_format("amount", "value too large"))?
        };
        let paise: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let total = rupees
            .checked_mul(100)
            .and_then(|r| r.checked_add(paise))
            .ok_or_else(|| ValidationError::invalid_format("amount", "value too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }

    /// Parses like [`Money::parse`] but treats absent or unparseable input as zero.
    ///
    /// Used for catalog MRP in purchase entry, where a missing MRP must not
    /// block the line.
    pub fn parse_lenient(input: Option<&str>) -> Money {
        input
            .and_then(|s| Money::parse(s).ok())
            .unwrap_or_else(Money::zero)
    }

    /// Returns `bps` basis points of this amount, rounded half away from zero.
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// // 2.5% of ₹100.00
    /// assert_eq!(Money::from_paise(10000).percentage(250).paise(), 250);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        Money(round_div(self.0 as i128 * bps as i128, 10_000))
    }

    /// Subtracts `bps` basis points from this amount.
    pub fn apply_percentage_discount(&self, bps: u32) -> Money {
        *self - self.percentage(bps)
    }

    /// Expresses this amount as basis points of `whole`, rounded half up.
    ///
    /// Returns 0 when `whole` is zero.
    ///
    /// ```rust
    /// use pharmadesk_core::money::Money;
    ///
    /// // ₹50 of ₹1,200 = 4.17%
    /// let bps = Money::from_paise(5000).percentage_of(Money::from_paise(120000));
    /// assert_eq!(bps, 417);
    /// ```
    pub fn percentage_of(&self, whole: Money) -> i64 {
        if whole.is_zero() {
            return 0;
        }
        round_div(self.0 as i128 * 10_000, whole.0 as i128)
    }

    /// Splits `total` across `weights` in proportion, so the parts sum to `total`.
    ///
    /// ## Algorithm (largest remainder)
    /// ```text
    /// total = ₹100.00, weights = [1, 1, 1]
    ///   floors     = [33.33, 33.33, 33.33]   (sum 99.99)
    ///   leftover   = 1 paisa → goes to the largest remainder (first on ties)
    ///   result     = [33.34, 33.33, 33.33]
    /// ```
    ///
    /// When every weight is zero the split is equal.
    pub fn split_proportionally(total: Money, weights: &[Money]) -> Vec<Money> {
        let n = weights.len();
        if n == 0 {
            return Vec::new();
        }

        let sign: i128 = if total.is_negative() { -1 } else { 1 };
        let amount = total.0.unsigned_abs() as i128;
        let weights: Vec<i128> = weights.iter().map(|w| w.0.max(0) as i128).collect();
        let weight_sum: i128 = weights.iter().sum();

        let (mut parts, remainders): (Vec<i128>, Vec<i128>) = if weight_sum == 0 {
            (vec![amount / n as i128; n], vec![0; n])
        } else {
            weights
                .iter()
                .map(|w| ((amount * w) / weight_sum, (amount * w) % weight_sum))
                .unzip()
        };

        let mut leftover = amount - parts.iter().sum::<i128>();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));
        for idx in order.iter().cycle() {
            if leftover <= 0 {
                break;
            }
            parts[*idx] += 1;
            leftover -= 1;
        }

        parts.into_iter().map(|p| Money((p * sign) as i64)).collect()
    }
}

/// Integer division rounding half away from zero.
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let half = denominator.abs() / 2;
    let adjusted = if (numerator < 0) != (denominator < 0) {
        numerator - half * denominator.signum()
    } else {
        numerator + half * denominator.signum()
    };
    (adjusted / denominator) as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `₹12.34` / `-₹5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| Money(acc.0.saturating_add(m.0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(6500).to_string(), "₹65.00");
        assert_eq!(Money::from_paise(5).to_string(), "₹0.05");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("65").unwrap().paise(), 6500);
        assert_eq!(Money::parse("65.5").unwrap().paise(), 6550);
        assert_eq!(Money::parse(" 0.01 ").unwrap().paise(), 1);
        assert_eq!(Money::parse(".75").unwrap().paise(), 75);
        assert_eq!(Money::parse("-5.00").unwrap().paise(), -500);
        assert_eq!(Money::parse("+3").unwrap().paise(), 300);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(Money::parse(""), Err(ValidationError::Required { .. })));
        assert!(Money::parse("-").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("12a").is_err());
        assert!(Money::parse("1.2.3").is_err());
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(Money::parse_lenient(Some("100")).paise(), 10000);
        assert_eq!(Money::parse_lenient(Some("n/a")), Money::zero());
        assert_eq!(Money::parse_lenient(None), Money::zero());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);
        assert_eq!((-a).paise(), -1000);
        assert_eq!(vec![a, b, b].into_iter().sum::<Money>().paise(), 2000);
    }

    #[test]
    fn test_overflow_saturates_or_reports() {
        let huge = Money::from_paise(i64::MAX / 2);

        assert_eq!(huge.multiply_quantity(3).paise(), i64::MAX);
        assert!(huge.checked_multiply_quantity(3).is_none());
        assert_eq!(huge.checked_multiply_quantity(1), Some(huge));
        assert!(huge.checked_add(huge).is_some());
        assert!(huge.checked_add(huge + Money::from_paise(2)).is_none());
        assert_eq!(vec![huge, huge, huge].into_iter().sum::<Money>().paise(), i64::MAX);
        assert_eq!((Money::from_paise(i64::MIN) - huge).paise(), i64::MIN);
        assert_eq!((-Money::from_paise(i64::MIN)).paise(), i64::MAX);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_paise(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_paise(7).clamp_non_negative().paise(), 7);
    }

    #[test]
    fn test_percentage() {
        let amount = Money::from_paise(10000);
        assert_eq!(amount.percentage(1000).paise(), 1000);
        assert_eq!(amount.apply_percentage_discount(1000).paise(), 9000);
        // 3.33% of ₹1.00 = 3.33 paise → 3
        assert_eq!(Money::from_paise(100).percentage(333).paise(), 3);
        // 5% of ₹0.10 = 0.5 paise → rounds away from zero
        assert_eq!(Money::from_paise(10).percentage(500).paise(), 1);
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(Money::from_paise(500).percentage_of(Money::from_paise(10000)), 500);
        assert_eq!(Money::from_paise(100).percentage_of(Money::zero()), 0);
        // 1/3 = 33.33%
        assert_eq!(Money::from_paise(100).percentage_of(Money::from_paise(300)), 3333);
    }

    #[test]
    fn test_split_proportionally_sums_to_total() {
        let parts = Money::split_proportionally(
            Money::from_paise(10000),
            &[Money::from_paise(1), Money::from_paise(1), Money::from_paise(1)],
        );
        assert_eq!(
            parts,
            vec![
                Money::from_paise(3334),
                Money::from_paise(3333),
                Money::from_paise(3333)
            ]
        );
    }

    #[test]
    fn test_split_proportionally_weighted() {
        let parts = Money::split_proportionally(
            Money::from_paise(9000),
            &[Money::from_paise(20000), Money::from_paise(10000)],
        );
        assert_eq!(parts, vec![Money::from_paise(6000), Money::from_paise(3000)]);
    }

    #[test]
    fn test_split_proportionally_zero_weights_is_equal() {
        let parts = Money::split_proportionally(
            Money::from_paise(101),
            &[Money::zero(), Money::zero()],
        );
        assert_eq!(parts, vec![Money::from_paise(51), Money::from_paise(50)]);
        assert!(Money::split_proportionally(Money::from_paise(5), &[]).is_empty());
    }
}
