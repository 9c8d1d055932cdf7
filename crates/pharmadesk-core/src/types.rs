//! # Domain Types
//!
//! Core domain types used throughout PharmaDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Medicine     │   │     Invoice     │   │  SupplierBill   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  invoice_id PM… │   │  bill_id no-date│       │
//! │  │  mrp / ptr      │   │  uhid           │   │  agency         │       │
//! │  │  current_stock  │   │  final_amount   │   │  bill_total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PaymentMode    │   │ PaymentStatus   │   │SupplierPayment- │       │
//! │  │  ─────────────  │   │  ─────────────  │   │     Mode        │       │
//! │  │  Cash           │   │  Unpaid ──► Paid│   │  ─────────────  │       │
//! │  │  Upi            │   │  (one-way)      │   │  Cash, Cheque   │       │
//! │  │  Both           │   └─────────────────┘   │  BankTransfer   │       │
//! │  └─────────────────┘                         │  Upi            │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closed Enumerations
//! Payment modes, return reasons and the discount-in-bill flag are enums,
//! never free strings. An unset payment mode on a draft is `Option::None`.
//!
//! ## Stored Money
//! Row types keep amounts as `*_paise: i64` columns and expose `Money`
//! accessors, so they map straight onto SQLite INTEGER columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::stock::StockSnapshot;

// =============================================================================
// Payment Mode (pharmacy invoice)
// =============================================================================

/// How a patient pays a pharmacy invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    /// Whole amount in cash.
    Cash,
    /// Whole amount over UPI.
    Upi,
    /// Split between cash and UPI, entered by the operator.
    Both,
}

impl PaymentMode {
    /// Whether the cash channel carries money in this mode.
    pub fn uses_cash(&self) -> bool {
        matches!(self, PaymentMode::Cash | PaymentMode::Both)
    }

    /// Whether the UPI channel carries money in this mode.
    pub fn uses_upi(&self) -> bool {
        matches!(self, PaymentMode::Upi | PaymentMode::Both)
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Upi => "UPI",
            PaymentMode::Both => "Both",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Supplier Payment Mode
// =============================================================================

/// How a supplier bill was settled.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SupplierPaymentMode {
    Cash,
    BankTransfer,
    Cheque,
    Upi,
}

impl fmt::Display for SupplierPaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SupplierPaymentMode::Cash => "Cash",
            SupplierPaymentMode::BankTransfer => "Bank Transfer",
            SupplierPaymentMode::Cheque => "Cheque",
            SupplierPaymentMode::Upi => "UPI",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment lifecycle of a supplier bill.
///
/// ```text
/// Unpaid ──mark_paid──► Paid   (terminal, no way back)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

/// Status filter for supplier bill listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillStatusFilter {
    Unpaid,
    Paid,
    All,
}

impl BillStatusFilter {
    /// The status to match, or `None` for all bills.
    pub fn status(&self) -> Option<PaymentStatus> {
        match self {
            BillStatusFilter::Unpaid => Some(PaymentStatus::Unpaid),
            BillStatusFilter::Paid => Some(PaymentStatus::Paid),
            BillStatusFilter::All => None,
        }
    }
}

impl Default for BillStatusFilter {
    fn default() -> Self {
        BillStatusFilter::Unpaid
    }
}

// =============================================================================
// Discount In Bill
// =============================================================================

/// Whether the supplier printed a discount on the bill itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountInBill {
    Yes,
    No,
}

impl Default for DiscountInBill {
    fn default() -> Self {
        DiscountInBill::No
    }
}

// =============================================================================
// Return Reason
// =============================================================================

/// Why stock went back to the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Expired,
    Damaged,
    WrongItem,
    Excess,
    Other,
}

// =============================================================================
// Patient Types
// =============================================================================

/// Kind of clinic visit recorded at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
    /// Out-patient consultation.
    Op,
    /// A named procedure.
    Procedure,
}

/// Which column a patient search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PatientSearchField {
    /// Case-insensitive substring.
    Name,
    /// Substring.
    Phone,
    /// Exact.
    Uhid,
    /// Exact visit date, `YYYY-MM-DD`.
    Date,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Patient {
    /// Unique hospital id, e.g. `2410R001`.
    pub uhid: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One visit row joined with its patient, as listed on the registration desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PatientVisit {
    pub visit_id: i64,
    pub uhid: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    pub kind: VisitKind,
    pub procedure_name: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub amount_paid_paise: i64,
}

impl PatientVisit {
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_paise(self.amount_paid_paise)
    }
}

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the pharmacy catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    pub id: i64,

    /// Display identity, unique ignoring case.
    pub name: String,

    /// Maximum retail price in paise.
    pub mrp_paise: i64,

    /// Price to retailer in paise.
    pub ptr_paise: i64,

    pub company: Option<String>,

    /// Dosage form, e.g. `Tablets`, `Syrup`.
    pub medicine_type: String,

    pub current_stock: i64,

    #[ts(as = "Option<String>")]
    pub last_delivery_date: Option<NaiveDate>,
}

impl Medicine {
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_paise(self.mrp_paise)
    }

    #[inline]
    pub fn ptr(&self) -> Money {
        Money::from_paise(self.ptr_paise)
    }

    /// Freezes the current stock level for the Stock Validator.
    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot::new(&self.name, self.current_stock)
    }
}

/// What the billing screens fetch when a medicine is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MedicineDetails {
    pub name: String,
    pub mrp_paise: i64,
    pub ptr_paise: i64,
    pub current_stock: i64,
    pub medicine_type: String,
    pub company: Option<String>,
    /// Batch of the most recent delivery, if any.
    pub batch_no: Option<String>,
}

impl MedicineDetails {
    #[inline]
    pub fn mrp(&self) -> Money {
        Money::from_paise(self.mrp_paise)
    }

    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot::new(&self.name, self.current_stock)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A submitted pharmacy invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    /// `PM` + YY + day-of-year + daily sequence.
    pub invoice_id: String,
    pub uhid: String,
    pub patient_name: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    pub subtotal_paise: i64,
    /// Signed: negative is a surcharge.
    pub discount_paise: i64,
    pub final_amount_paise: i64,
    pub payment_mode: PaymentMode,
    pub cash_paise: i64,
    pub upi_paise: i64,
    pub comments: Option<String>,
    /// Operator who submitted the invoice.
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_paise(self.final_amount_paise)
    }
}

/// One line of a submitted invoice, in print order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceLine {
    /// Invoice id + 2-digit line number.
    pub sale_line_id: String,
    pub invoice_id: String,
    pub line_no: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price_paise: i64,
    pub line_total_paise: i64,
    /// Cumulative total up to and including this line.
    pub running_total_paise: i64,
    pub batch_no: Option<String>,
    pub expiry: Option<String>,
}

impl InvoiceLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_paise(self.line_total_paise)
    }
}

/// An invoice together with its lines, for reprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceWithLines {
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

// =============================================================================
// Supplier Bill
// =============================================================================

/// An inbound supplier bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierBill {
    /// `<bill_no>-<YYMMDD>`.
    pub bill_id: String,
    pub bill_no: String,
    #[ts(as = "String")]
    pub bill_date: NaiveDate,
    #[ts(as = "String")]
    pub delivery_date: NaiveDate,
    pub agency: String,
    pub bill_amount_paise: i64,
    pub tax_amount_paise: i64,
    pub discount_in_bill: DiscountInBill,
    pub discount_amount_paise: i64,
    /// Discount as basis points of the bill amount.
    pub discount_bps: i64,
    /// bill_amount + tax_amount − discount_amount.
    pub bill_total_paise: i64,
    pub payment_status: PaymentStatus,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    pub payment_mode: Option<SupplierPaymentMode>,
    pub amount_paid_paise: Option<i64>,
    pub transaction_details: Option<String>,
}

impl SupplierBill {
    #[inline]
    pub fn bill_total(&self) -> Money {
        Money::from_paise(self.bill_total_paise)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// A delivered purchase line, recorded against a supplier bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockDelivery {
    pub id: i64,
    pub bill_id: String,
    pub medicine_name: String,
    pub quantity: i64,
    pub batch_no: Option<String>,
    /// `YYYY-MM` or `YYYY-MM-DD`.
    pub expiry: Option<String>,
    pub unit_price_paise: i64,
    pub mrp_paise: i64,
    /// MRP − unit price at entry time.
    pub price_difference_paise: i64,
    #[ts(as = "String")]
    pub delivery_date: NaiveDate,
}

/// Stock sent back to a supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SupplierReturn {
    pub id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub agency: String,
    pub reason: ReturnReason,
    pub batch_no: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub return_date: NaiveDate,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_channels() {
        assert!(PaymentMode::Cash.uses_cash());
        assert!(!PaymentMode::Cash.uses_upi());
        assert!(PaymentMode::Upi.uses_upi());
        assert!(PaymentMode::Both.uses_cash() && PaymentMode::Both.uses_upi());
    }

    #[test]
    fn test_payment_mode_serde() {
        assert_eq!(serde_json::to_string(&PaymentMode::Upi).unwrap(), "\"upi\"");
        let mode: SupplierPaymentMode = serde_json::from_str("\"bank_transfer\"").unwrap();
        assert_eq!(mode, SupplierPaymentMode::BankTransfer);
        assert!(serde_json::from_str::<PaymentMode>("\"card\"").is_err());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(PaymentMode::Upi.to_string(), "UPI");
        assert_eq!(SupplierPaymentMode::BankTransfer.to_string(), "Bank Transfer");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
        assert_eq!(BillStatusFilter::default(), BillStatusFilter::Unpaid);
        assert_eq!(DiscountInBill::default(), DiscountInBill::No);
    }

    #[test]
    fn test_bill_status_filter() {
        assert_eq!(BillStatusFilter::Paid.status(), Some(PaymentStatus::Paid));
        assert_eq!(BillStatusFilter::All.status(), None);
    }

    #[test]
    fn test_return_reason_serde() {
        let reason: ReturnReason = serde_json::from_str("\"wrong_item\"").unwrap();
        assert_eq!(reason, ReturnReason::WrongItem);
    }

    #[test]
    fn test_medicine_snapshot() {
        let medicine = Medicine {
            id: 1,
            name: "Paracetamol".into(),
            mrp_paise: 1000,
            ptr_paise: 800,
            company: None,
            medicine_type: "Tablets".into(),
            current_stock: 5,
            last_delivery_date: None,
        };
        let snap = medicine.snapshot();
        assert_eq!(snap.current_stock, 5);
        assert_eq!(snap.medicine_name, "Paracetamol");
        assert_eq!(medicine.mrp().paise(), 1000);
    }
}
