//! # Split-Payment Reconciler
//!
//! Decides the cash and UPI components of a pharmacy payment.
//!
//! ## Modes
//! ```text
//! ┌──────────┬──────────────────────────┬─────────────────────────────────┐
//! │ Mode     │ cash / upi               │ Check                           │
//! ├──────────┼──────────────────────────┼─────────────────────────────────┤
//! │ Cash     │ final / 0   (auto-fill)  │ none                            │
//! │ Upi      │ 0 / final   (auto-fill)  │ none                            │
//! │ Both     │ operator enters both     │ |cash + upi − final| ≤ ₹0.01    │
//! │ unset    │ -                        │ submission blocked              │
//! └──────────┴──────────────────────────┴─────────────────────────────────┘
//! ```
//!
//! A mismatch in `Both` is reported, never corrected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, PAYMENT_TOLERANCE};
use crate::types::PaymentMode;
use crate::validation::validate_amount;

/// A reconciled payment, ready to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSplit {
    pub mode: PaymentMode,
    pub cash: Money,
    pub upi: Money,
}

/// Reconciles the entered amounts against `final_amount`.
///
/// For `Cash` and `Upi` the entered amounts are ignored and the auto-filled
/// split is returned.
///
/// ```rust
/// use pharmadesk_core::money::Money;
/// use pharmadesk_core::payment::reconcile_payment;
/// use pharmadesk_core::types::PaymentMode;
///
/// let r = |p| Money::from_paise(p);
/// assert!(reconcile_payment(Some(PaymentMode::Both), r(10000), r(6000), r(4000)).is_ok());
/// assert!(reconcile_payment(Some(PaymentMode::Both), r(10000), r(6000), r(3900)).is_err());
/// ```
pub fn reconcile_payment(
    mode: Option<PaymentMode>,
    final_amount: Money,
    cash: Money,
    upi: Money,
) -> CoreResult<PaymentSplit> {
    let mode = mode.ok_or_else(|| ValidationError::required("payment_mode"))?;

    match mode {
        PaymentMode::Cash | PaymentMode::Upi => Ok(auto_fill(mode, final_amount)),
        PaymentMode::Both => {
            validate_amount("cash_amount", cash)?;
            validate_amount("upi_amount", upi)?;

            let actual = cash + upi;
            if (actual - final_amount).abs() > PAYMENT_TOLERANCE {
                return Err(CoreError::PaymentMismatch {
                    expected: final_amount,
                    actual,
                });
            }
            Ok(PaymentSplit { mode, cash, upi })
        }
    }
}

/// The split a single-channel mode implies. `Both` keeps nothing and
/// returns zeros.
fn auto_fill(mode: PaymentMode, final_amount: Money) -> PaymentSplit {
    let (cash, upi) = match mode {
        PaymentMode::Cash => (final_amount, Money::zero()),
        PaymentMode::Upi => (Money::zero(), final_amount),
        PaymentMode::Both => (Money::zero(), Money::zero()),
    };
    PaymentSplit { mode, cash, upi }
}

// =============================================================================
// Payment Entry
// =============================================================================

/// The payment fields of a draft as the operator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentEntry {
    pub mode: Option<PaymentMode>,
    pub cash: Money,
    pub upi: Money,
}

impl PaymentEntry {
    /// Switches mode. `Cash` and `Upi` overwrite both amounts immediately.
    pub fn set_mode(&mut self, mode: Option<PaymentMode>, final_amount: Money) {
        self.mode = mode;
        self.refresh(final_amount);
    }

    /// Re-applies the auto-fill after the payable amount changed.
    pub fn refresh(&mut self, final_amount: Money) {
        if let Some(mode @ (PaymentMode::Cash | PaymentMode::Upi)) = self.mode {
            let split = auto_fill(mode, final_amount);
            self.cash = split.cash;
            self.upi = split.upi;
        }
    }

    pub fn reconcile(&self, final_amount: Money) -> CoreResult<PaymentSplit> {
        reconcile_payment(self.mode, final_amount, self.cash, self.upi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(rupees: i64) -> Money {
        Money::from_rupees_paise(rupees, 0)
    }

    #[test]
    fn test_both_exact_split_ok() {
        let split = reconcile_payment(Some(PaymentMode::Both), r(100), r(60), r(40)).unwrap();
        assert_eq!((split.cash, split.upi), (r(60), r(40)));
    }

    #[test]
    fn test_both_mismatch() {
        assert_eq!(
            reconcile_payment(Some(PaymentMode::Both), r(100), r(60), r(39)),
            Err(CoreError::PaymentMismatch {
                expected: r(100),
                actual: r(99)
            })
        );
    }

    #[test]
    fn test_both_within_tolerance() {
        let final_amount = r(100);
        assert!(reconcile_payment(
            Some(PaymentMode::Both),
            final_amount,
            Money::from_paise(5999),
            r(40)
        )
        .is_ok());
        assert!(reconcile_payment(
            Some(PaymentMode::Both),
            final_amount,
            Money::from_paise(5998),
            r(40)
        )
        .is_err());
    }

    #[test]
    fn test_both_rejects_negative_components() {
        let err = reconcile_payment(Some(PaymentMode::Both), r(100), r(110), r(-10)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustNotBeNegative { .. })
        ));
    }

    #[test]
    fn test_both_rejects_oversized_components() {
        let err = reconcile_payment(
            Some(PaymentMode::Both),
            r(100),
            Money::from_paise(i64::MAX),
            Money::from_paise(i64::MAX),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_single_modes_auto_fill() {
        let split = reconcile_payment(Some(PaymentMode::Cash), r(60), r(1), r(2)).unwrap();
        assert_eq!((split.cash, split.upi), (r(60), Money::zero()));

        let split = reconcile_payment(Some(PaymentMode::Upi), r(60), r(1), r(2)).unwrap();
        assert_eq!((split.cash, split.upi), (Money::zero(), r(60)));
    }

    #[test]
    fn test_unset_mode_blocks() {
        let err = reconcile_payment(None, r(60), r(60), Money::zero()).unwrap_err();
        assert_eq!(err, CoreError::Validation(ValidationError::required("payment_mode")));
    }

    #[test]
    fn test_mode_switch_overwrites_manual_entry() {
        let mut entry = PaymentEntry::default();
        entry.set_mode(Some(PaymentMode::Both), r(60));
        entry.cash = r(25);
        entry.upi = r(35);
        assert!(entry.reconcile(r(60)).is_ok());

        entry.set_mode(Some(PaymentMode::Upi), r(60));
        assert_eq!((entry.cash, entry.upi), (Money::zero(), r(60)));

        entry.set_mode(Some(PaymentMode::Cash), r(60));
        assert_eq!((entry.cash, entry.upi), (r(60), Money::zero()));
    }

    #[test]
    fn test_refresh_follows_final_amount() {
        let mut entry = PaymentEntry::default();
        entry.set_mode(Some(PaymentMode::Cash), r(60));
        entry.refresh(r(75));
        assert_eq!(entry.cash, r(75));

        entry.set_mode(Some(PaymentMode::Both), r(75));
        entry.cash = r(10);
        entry.refresh(r(80));
        assert_eq!(entry.cash, r(10));
    }
}
