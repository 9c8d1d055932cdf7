//! # Bill Aggregator
//!
//! The single place where subtotal, discount and payable amount are derived.
//!
//! ```text
//! lines ──► Σ line_total ──► subtotal
//!                               │
//!              discount ──►  subtotal − discount ──► max(·, 0) ──► final_amount
//!           (signed: < 0 is a surcharge)
//! ```
//!
//! Pure and cheap: callers re-run it after every draft mutation instead of
//! caching any of its outputs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::line_item::BillLine;
use crate::money::Money;

/// Output of [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillTotals {
    pub subtotal: Money,
    /// The discount as given, sign preserved.
    pub discount_applied: Money,
    /// Never negative.
    pub final_amount: Money,
}

/// Sums `lines` and applies `discount`.
///
/// ```rust
/// use pharmadesk_core::aggregate::aggregate;
/// use pharmadesk_core::line_item::{LineCandidate, LineItem, LineItems};
/// use pharmadesk_core::money::Money;
///
/// let mut lines: LineItems<LineItem> = LineItems::new();
/// lines.add_line(LineCandidate::new("Paracetamol", 2, Money::from_paise(1000))).unwrap();
///
/// let totals = aggregate(&lines, Money::from_paise(500));
/// assert_eq!(totals.final_amount.paise(), 1500);
/// ```
pub fn aggregate<'a, L, I>(lines: I, discount: Money) -> BillTotals
where
    L: BillLine + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let subtotal: Money = lines.into_iter().map(BillLine::line_total).sum();
    BillTotals {
        subtotal,
        discount_applied: discount,
        final_amount: (subtotal - discount).clamp_non_negative(),
    }
}
