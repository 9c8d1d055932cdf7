//! # Supplier Bills and Payments
//!
//! Bill totals for inbound purchases and the one-way unpaid → paid transition.
//!
//! ## Bill Figures
//! ```text
//! bill_total   = bill_amount + tax_amount − discount_amount
//! discount_bps = discount_amount / bill_amount × 10000   (only when DiscountInBill::Yes)
//! ```
//!
//! ## Payment Transition
//! ```text
//! ┌──────────┐   mark_paid(mode, amount?, details)   ┌──────────┐
//! │  Unpaid  │ ────────────────────────────────────► │   Paid   │
//! └──────────┘   payment_date = server's today       └──────────┘
//!                amount_paid defaults to bill_total      terminal
//! ```
//!
//! ## Bulk Settlement
//! ```text
//! bills [₹1,000, ₹500], payment discount 2%, paid ₹1,470
//!   discount  = [₹20.00, ₹10.00]
//!   final     = [₹980.00, ₹490.00]
//!   paid      = ₹1,470 split over final amounts → [₹980.00, ₹490.00]
//!   details  += " | Payment Discount: ₹20.00"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ids;
use crate::line_item::{LineItems, PurchaseCandidate, PurchaseLineItem};
use crate::money::Money;
use crate::types::{DiscountInBill, SupplierBill, SupplierPaymentMode};
use crate::validation::{validate_amount, validate_required, ValidationResult};

/// Upper bound for a payment discount, in basis points (100%).
pub const MAX_DISCOUNT_BPS: u32 = 10_000;

// =============================================================================
// Bill Figures
// =============================================================================

/// bill + tax − discount.
#[inline]
pub fn bill_total(bill_amount: Money, tax_amount: Money, discount_amount: Money) -> Money {
    bill_amount + tax_amount - discount_amount
}

/// In-bill discount as basis points of the bill amount.
///
/// Zero when the supplier gave no in-bill discount or the bill amount is zero.
///
/// ```rust
/// use pharmadesk_core::money::Money;
/// use pharmadesk_core::supplier_bill::discount_bps;
/// use pharmadesk_core::types::DiscountInBill;
///
/// let bps = discount_bps(DiscountInBill::Yes, Money::from_paise(5000), Money::from_paise(100000));
/// assert_eq!(bps, 500);
/// assert_eq!(discount_bps(DiscountInBill::No, Money::from_paise(5000), Money::from_paise(100000)), 0);
/// ```
pub fn discount_bps(flag: DiscountInBill, discount_amount: Money, bill_amount: Money) -> i64 {
    match flag {
        DiscountInBill::Yes if bill_amount.is_positive() => discount_amount.percentage_of(bill_amount),
        _ => 0,
    }
}

// =============================================================================
// Submission
// =============================================================================

/// A purchase entry as posted to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierBillSubmission {
    pub bill_no: String,
    #[ts(as = "String")]
    pub bill_date: NaiveDate,
    #[ts(as = "String")]
    pub delivery_date: NaiveDate,
    pub agency: String,
    pub bill_amount: Money,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub discount_in_bill: DiscountInBill,
    #[serde(default)]
    pub discount_amount: Money,
    pub lines: Vec<PurchaseCandidate>,
}

impl SupplierBillSubmission {
    /// `<bill_no>-<YYMMDD>`.
    pub fn bill_id(&self) -> String {
        ids::bill_id(self.bill_no.trim(), self.bill_date)
    }

    pub fn bill_total(&self) -> Money {
        bill_total(self.bill_amount, self.tax_amount, self.discount_amount)
    }

    pub fn discount_bps(&self) -> i64 {
        discount_bps(self.discount_in_bill, self.discount_amount, self.bill_amount)
    }

    /// Checks the header, then rebuilds the lines through `add_line`.
    pub fn validate(&self) -> CoreResult<LineItems<PurchaseLineItem>> {
        self.validate_header()?;

        if self.lines.is_empty() {
            return Err(CoreError::EmptyBill);
        }

        let mut lines = LineItems::new();
        for candidate in &self.lines {
            lines.add_line(candidate.clone())?;
        }
        Ok(lines)
    }

    fn validate_header(&self) -> ValidationResult<()> {
        validate_required("bill_no", &self.bill_no)?;
        validate_required("agency", &self.agency)?;

        for (field, amount) in [
            ("bill_amount", self.bill_amount),
            ("tax_amount", self.tax_amount),
            ("discount_amount", self.discount_amount),
        ] {
            validate_amount(field, amount)?;
        }
        Ok(())
    }
}

// =============================================================================
// Single Payment
// =============================================================================

/// Operator input for settling one bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarkPaidRequest {
    pub mode: SupplierPaymentMode,
    /// Defaults to the bill total.
    #[serde(default)]
    pub amount_paid: Option<Money>,
    #[serde(default)]
    pub transaction_details: Option<String>,
}

/// The fields written at the unpaid → paid transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRecord {
    pub bill_id: String,
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub mode: SupplierPaymentMode,
    pub amount_paid: Money,
    pub transaction_details: String,
}

/// Plans the transition for `bill`. `today` is the server's date.
pub fn mark_paid(
    bill: &SupplierBill,
    request: &MarkPaidRequest,
    today: NaiveDate,
) -> CoreResult<PaymentRecord> {
    if bill.is_paid() {
        return Err(CoreError::BillAlreadyPaid {
            bill_id: bill.bill_id.clone(),
        });
    }

    let amount_paid = request.amount_paid.unwrap_or_else(|| bill.bill_total());
    validate_amount("amount_paid", amount_paid)?;

    Ok(PaymentRecord {
        bill_id: bill.bill_id.clone(),
        payment_date: today,
        mode: request.mode,
        amount_paid,
        transaction_details: request
            .transaction_details
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    })
}

// =============================================================================
// Bulk Payment
// =============================================================================

/// Operator input for settling several bills with one transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkPaymentRequest {
    pub bill_ids: Vec<String>,
    pub mode: SupplierPaymentMode,
    /// Settlement discount in basis points.
    #[serde(default)]
    pub discount_bps: u32,
    pub amount_paid: Money,
    #[serde(default)]
    pub transaction_details: Option<String>,
    /// Bank date of the settlement.
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
}

/// One bill's share of a bulk settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BulkAllocation {
    pub bill_id: String,
    pub payment_discount: Money,
    pub final_amount: Money,
    pub amount_paid: Money,
    pub transaction_details: String,
}

/// Splits one settlement across `bills`.
///
/// `amount_paid` is shared in proportion to each bill's discounted amount,
/// so the allocations always sum to `amount_paid`.
pub fn plan_bulk_payment(
    bills: &[SupplierBill],
    discount_bps: u32,
    amount_paid: Money,
    details: &str,
) -> CoreResult<Vec<BulkAllocation>> {
    if bills.is_empty() {
        return Err(ValidationError::required("bill_ids").into());
    }
    if discount_bps > MAX_DISCOUNT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount_bps".to_string(),
            min: 0,
            max: MAX_DISCOUNT_BPS as i64,
        }
        .into());
    }
    validate_amount("amount_paid", amount_paid)?;
    if let Some(paid) = bills.iter().find(|b| b.is_paid()) {
        return Err(CoreError::BillAlreadyPaid {
            bill_id: paid.bill_id.clone(),
        });
    }

    let discounts: Vec<Money> = bills
        .iter()
        .map(|b| b.bill_total().clamp_non_negative().percentage(discount_bps))
        .collect();
    let finals: Vec<Money> = bills
        .iter()
        .zip(&discounts)
        .map(|(b, d)| (b.bill_total() - *d).clamp_non_negative())
        .collect();
    let shares = Money::split_proportionally(amount_paid, &finals);

    let details = details.trim();
    let allocations = bills
        .iter()
        .zip(discounts)
        .zip(finals)
        .zip(shares)
        .map(|(((bill, discount), final_amount), share)| {
            let mut text = details.to_string();
            if discount.is_positive() {
                text.push_str(&format!(" | Payment Discount: {}", discount));
                let existing = Money::from_paise(bill.discount_amount_paise);
                if bill.discount_in_bill == DiscountInBill::Yes && existing.is_positive() {
                    text.push_str(&format!(" (Additional to existing {})", existing));
                }
            }
            BulkAllocation {
                bill_id: bill.bill_id.clone(),
                payment_discount: discount,
                final_amount,
                amount_paid: share,
                transaction_details: text,
            }
        })
        .collect();

    Ok(allocations)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{BillLine, LineCandidate};
    use crate::types::PaymentStatus;

    fn r(rupees: i64) -> Money {
        Money::from_rupees_paise(rupees, 0)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bill(id: &str, total: i64) -> SupplierBill {
        SupplierBill {
            bill_id: id.to_string(),
            bill_no: id.to_string(),
            bill_date: date(2024, 10, 1),
            delivery_date: date(2024, 10, 2),
            agency: "Sri Sai Agencies".to_string(),
            bill_amount_paise: total,
            tax_amount_paise: 0,
            discount_in_bill: DiscountInBill::No,
            discount_amount_paise: 0,
            discount_bps: 0,
            bill_total_paise: total,
            payment_status: PaymentStatus::Unpaid,
            payment_date: None,
            payment_mode: None,
            amount_paid_paise: None,
            transaction_details: None,
        }
    }

    fn submission() -> SupplierBillSubmission {
        SupplierBillSubmission {
            bill_no: "INV-77".into(),
            bill_date: date(2024, 10, 5),
            delivery_date: date(2024, 10, 6),
            agency: "Sri Sai Agencies".into(),
            bill_amount: r(1000),
            tax_amount: r(120),
            discount_in_bill: DiscountInBill::Yes,
            discount_amount: r(50),
            lines: vec![PurchaseCandidate {
                line: LineCandidate::new("Paracetamol", 100, r(8)),
                catalog_mrp: r(10),
            }],
        }
    }

    #[test]
    fn test_bill_total() {
        assert_eq!(bill_total(r(1000), r(120), r(50)), r(1070));
        assert_eq!(submission().bill_total(), r(1070));
    }

    #[test]
    fn test_discount_bps() {
        assert_eq!(submission().discount_bps(), 500);
        assert_eq!(discount_bps(DiscountInBill::Yes, r(50), Money::zero()), 0);
        assert_eq!(discount_bps(DiscountInBill::Yes, r(50), r(1200)), 417);
    }

    #[test]
    fn test_submission_bill_id() {
        assert_eq!(submission().bill_id(), "INV-77-241005");
    }

    #[test]
    fn test_submission_validate() {
        let lines = submission().validate().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.get(1).unwrap().price_difference(), r(2));
        assert_eq!(lines.get(1).unwrap().line_total(), r(800));

        let mut empty = submission();
        empty.lines.clear();
        assert_eq!(empty.validate().unwrap_err(), CoreError::EmptyBill);

        let mut no_agency = submission();
        no_agency.agency = " ".into();
        assert!(matches!(
            no_agency.validate(),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let mut bad_line = submission();
        bad_line.lines[0].line.quantity = 0;
        assert!(bad_line.validate().is_err());
    }

    #[test]
    fn test_submission_rejects_oversized_values() {
        let mut huge_line = submission();
        huge_line.lines[0].line.quantity = i64::MAX;
        assert!(matches!(
            huge_line.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let mut huge_tax = submission();
        huge_tax.tax_amount = Money::from_paise(i64::MAX);
        assert!(matches!(
            huge_tax.validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_mark_paid_defaults_amount_to_total() {
        let request = MarkPaidRequest {
            mode: SupplierPaymentMode::Cheque,
            amount_paid: None,
            transaction_details: Some(" CHQ 001234 ".into()),
        };
        let record = mark_paid(&bill("B1", 150000), &request, date(2024, 11, 1)).unwrap();
        assert_eq!(record.amount_paid.paise(), 150000);
        assert_eq!(record.payment_date, date(2024, 11, 1));
        assert_eq!(record.transaction_details, "CHQ 001234");
    }

    #[test]
    fn test_mark_paid_is_one_way() {
        let mut paid = bill("B1", 1000);
        paid.payment_status = PaymentStatus::Paid;
        let request = MarkPaidRequest {
            mode: SupplierPaymentMode::Cash,
            amount_paid: None,
            transaction_details: None,
        };
        assert_eq!(
            mark_paid(&paid, &request, date(2024, 11, 1)),
            Err(CoreError::BillAlreadyPaid {
                bill_id: "B1".into()
            })
        );
    }

    #[test]
    fn test_plan_bulk_payment() {
        let bills = vec![bill("B1", 100000), bill("B2", 50000)];
        let plan = plan_bulk_payment(&bills, 200, r(1470), "NEFT 998").unwrap();

        assert_eq!(plan[0].payment_discount, r(20));
        assert_eq!(plan[0].final_amount, r(980));
        assert_eq!(plan[0].amount_paid, r(980));
        assert_eq!(plan[1].amount_paid, r(490));
        assert_eq!(plan[0].transaction_details, "NEFT 998 | Payment Discount: ₹20.00");
        let total: Money = plan.iter().map(|a| a.amount_paid).sum();
        assert_eq!(total, r(1470));
    }

    #[test]
    fn test_plan_bulk_payment_without_discount_keeps_details() {
        let plan = plan_bulk_payment(&[bill("B1", 1000)], 0, r(10), "cash").unwrap();
        assert_eq!(plan[0].transaction_details, "cash");
        assert_eq!(plan[0].amount_paid, r(10));
    }

    #[test]
    fn test_plan_bulk_payment_mentions_existing_discount() {
        let mut b = bill("B1", 100000);
        b.discount_in_bill = DiscountInBill::Yes;
        b.discount_amount_paise = 5000;
        let plan = plan_bulk_payment(&[b], 100, r(990), "").unwrap();
        assert_eq!(
            plan[0].transaction_details,
            " | Payment Discount: ₹10.00 (Additional to existing ₹50.00)"
        );
    }

    #[test]
    fn test_plan_bulk_payment_rejects() {
        assert!(plan_bulk_payment(&[], 0, r(1), "").is_err());
        assert!(plan_bulk_payment(&[bill("B1", 1)], 10_001, r(1), "").is_err());

        let mut paid = bill("B2", 1000);
        paid.payment_status = PaymentStatus::Paid;
        assert!(matches!(
            plan_bulk_payment(&[bill("B1", 1000), paid], 0, r(20), ""),
            Err(CoreError::BillAlreadyPaid { .. })
        ));
    }
}
