//! # Bill Drafts
//!
//! In-progress bills owned by one operator session.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       BillDraft Lifecycle                               │
//! │                                                                         │
//! │   new() ──► add_line / remove_line / set_discount / set_payment_mode    │
//! │                 │            (totals re-derived after every change)     │
//! │                 ▼                                                       │
//! │   prepare_submission()  ── ValidationError / InsufficientStock /        │
//! │                 │           PaymentMismatch: draft untouched            │
//! │                 ▼                                                       │
//! │   submit(&gateway).await                                                │
//! │        ├── Ok(receipt) ──────────► draft cleared                        │
//! │        ├── Transport   ──────────► draft kept, operator retries         │
//! │        └── Rejected    ──────────► draft kept, server message shown     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Submission is all-or-nothing. There is no automatic retry.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::aggregate::{aggregate, BillTotals};
use crate::error::{CoreError, CoreResult};
use crate::line_item::{
    BillLine, LineCandidate, LineId, LineItem, LineItems, PurchaseCandidate, PurchaseLineItem,
};
use crate::money::Money;
use crate::patient::PatientInfo;
use crate::payment::{reconcile_payment, PaymentEntry, PaymentSplit};
use crate::stock::StockSnapshot;
use crate::supplier_bill::{bill_total, SupplierBillSubmission};
use crate::validation::validate_discount;
use crate::types::{DiscountInBill, PaymentMode};

// =============================================================================
// Wire Types
// =============================================================================

/// The atomic invoice request: every line goes in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceSubmission {
    pub patient: PatientInfo,
    pub lines: Vec<LineCandidate>,
    #[serde(default)]
    pub discount: Money,
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub cash_amount: Money,
    #[serde(default)]
    pub upi_amount: Money,
    #[serde(default)]
    pub comments: Option<String>,
}

/// A submission that passed every local rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInvoice {
    pub lines: LineItems<LineItem>,
    pub totals: BillTotals,
    pub payment: PaymentSplit,
}

impl InvoiceSubmission {
    /// Rebuilds the lines, aggregates and reconciles the payment.
    ///
    /// The server runs this on every request; the draft runs it before
    /// sending.
    pub fn validate(&self) -> CoreResult<ValidatedInvoice> {
        self.patient.validate()?;

        if self.lines.is_empty() {
            return Err(CoreError::EmptyBill);
        }
        validate_discount(self.discount)?;

        let mut lines = LineItems::new();
        for candidate in &self.lines {
            lines.add_line(candidate.clone())?;
        }

        let totals = aggregate(&lines, self.discount);
        let payment = reconcile_payment(
            self.payment_mode,
            totals.final_amount,
            self.cash_amount,
            self.upi_amount,
        )?;

        Ok(ValidatedInvoice {
            lines,
            totals,
            payment,
        })
    }
}

/// What the server confirms for an accepted invoice.
///
/// `final_amount` here is authoritative over any locally computed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceReceipt {
    pub invoice_id: String,
    pub uhid: String,
    pub subtotal: Money,
    pub discount: Money,
    pub final_amount: Money,
    pub cash_amount: Money,
    pub upi_amount: Money,
}

// =============================================================================
// Gateway
// =============================================================================

/// Failure reported by an [`InvoiceGateway`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No confirmed answer from the server.
    #[error("{0}")]
    Transport(String),

    /// The server answered and refused.
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },
}

impl From<GatewayError> for CoreError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(message) => CoreError::Transport { message },
            GatewayError::Rejected { message, .. } => CoreError::Rejected { message },
        }
    }
}

/// Where a finished draft is sent.
///
/// Implemented over HTTP by `pharmadesk-client`.
pub trait InvoiceGateway {
    fn submit_invoice(
        &self,
        submission: &InvoiceSubmission,
    ) -> impl Future<Output = Result<InvoiceReceipt, GatewayError>> + Send;
}

// =============================================================================
// Bill Draft
// =============================================================================

/// A pharmacy bill being built at the counter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillDraft {
    patient: PatientInfo,
    lines: LineItems<LineItem>,
    discount: Money,
    payment: PaymentEntry,
    comments: Option<String>,
}

impl BillDraft {
    pub fn new() -> Self {
        BillDraft::default()
    }

    pub fn patient(&self) -> &PatientInfo {
        &self.patient
    }

    pub fn set_patient(&mut self, patient: PatientInfo) {
        self.patient = patient;
    }

    pub fn set_comments(&mut self, comments: Option<String>) {
        self.comments = comments.filter(|c| !c.trim().is_empty());
    }

    pub fn lines(&self) -> &LineItems<LineItem> {
        &self.lines
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn payment(&self) -> &PaymentEntry {
        &self.payment
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds a line after checking it against `stock`, when a snapshot is known.
    ///
    /// Rejected candidates leave the draft unchanged.
    pub fn add_line(
        &mut self,
        candidate: LineCandidate,
        stock: Option<&StockSnapshot>,
    ) -> CoreResult<LineId> {
        candidate.validate()?;
        if let Some(snapshot) = stock {
            snapshot.check(candidate.quantity)?;
        }
        let id = self.lines.add_line(candidate)?;
        self.refresh_payment();
        Ok(id)
    }

    pub fn remove_line(&mut self, id: LineId) -> bool {
        let removed = self.lines.remove_line(id);
        self.refresh_payment();
        removed
    }

    /// Signed: a negative discount is a surcharge.
    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount;
        self.refresh_payment();
    }

    pub fn set_payment_mode(&mut self, mode: Option<PaymentMode>) {
        let final_amount = self.totals().final_amount;
        self.payment.set_mode(mode, final_amount);
    }

    /// Manual cash entry. Overwritten again while the mode is single-channel.
    pub fn set_cash(&mut self, cash: Money) {
        self.payment.cash = cash;
        self.refresh_payment();
    }

    /// Manual UPI entry. Overwritten again while the mode is single-channel.
    pub fn set_upi(&mut self, upi: Money) {
        self.payment.upi = upi;
        self.refresh_payment();
    }

    pub fn totals(&self) -> BillTotals {
        aggregate(&self.lines, self.discount)
    }

    fn refresh_payment(&mut self) {
        let final_amount = self.totals().final_amount;
        self.payment.refresh(final_amount);
    }

    /// Runs every local rule and builds the request. No network.
    pub fn prepare_submission(&self) -> CoreResult<InvoiceSubmission> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyBill);
        }
        self.patient.validate()?;

        let split = self.payment.reconcile(self.totals().final_amount)?;

        Ok(InvoiceSubmission {
            patient: self.patient.clone(),
            lines: self.lines.iter().map(line_candidate).collect(),
            discount: self.discount,
            payment_mode: Some(split.mode),
            cash_amount: split.cash,
            upi_amount: split.upi,
            comments: self.comments.clone(),
        })
    }

    /// Sends the draft. Cleared on success, kept on any failure.
    pub async fn submit<G: InvoiceGateway>(&mut self, gateway: &G) -> CoreResult<InvoiceReceipt> {
        let submission = self.prepare_submission()?;
        let receipt = gateway.submit_invoice(&submission).await?;
        self.clear();
        Ok(receipt)
    }

    /// Discards everything, as after a successful submission.
    pub fn clear(&mut self) {
        *self = BillDraft::default();
    }
}

fn line_candidate(line: &LineItem) -> LineCandidate {
    LineCandidate {
        item_name: line.item_name().to_string(),
        quantity: line.quantity(),
        unit_price: line.unit_price(),
        batch_no: line.batch_no().map(str::to_string),
        expiry: line.expiry().map(str::to_string),
    }
}

// =============================================================================
// Purchase Draft
// =============================================================================

/// Header figures of a purchase entry, as printed on the supplier's bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseHeader {
    pub bill_no: String,
    #[ts(as = "String")]
    pub bill_date: chrono::NaiveDate,
    #[ts(as = "String")]
    pub delivery_date: chrono::NaiveDate,
    pub agency: String,
    pub bill_amount: Money,
    pub tax_amount: Money,
    pub discount_in_bill: DiscountInBill,
    pub discount_amount: Money,
}

/// A supplier bill being keyed in at the store room.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseDraft {
    header: PurchaseHeader,
    lines: LineItems<PurchaseLineItem>,
}

impl PurchaseDraft {
    pub fn new(header: PurchaseHeader) -> Self {
        PurchaseDraft {
            header,
            lines: LineItems::new(),
        }
    }

    pub fn header(&self) -> &PurchaseHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut PurchaseHeader {
        &mut self.header
    }

    pub fn lines(&self) -> &LineItems<PurchaseLineItem> {
        &self.lines
    }

    pub fn add_line(&mut self, candidate: PurchaseCandidate) -> CoreResult<LineId> {
        self.lines.add_line(candidate)
    }

    pub fn remove_line(&mut self, id: LineId) -> bool {
        self.lines.remove_line(id)
    }

    /// Σ quantity × purchase price, for comparing against the printed bill amount.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(BillLine::line_total).sum()
    }

    /// bill + tax − discount, as the server will store it.
    pub fn bill_total(&self) -> Money {
        bill_total(
            self.header.bill_amount,
            self.header.tax_amount,
            self.header.discount_amount,
        )
    }

    /// Builds and validates the request body.
    pub fn to_submission(&self) -> CoreResult<SupplierBillSubmission> {
        let submission = SupplierBillSubmission {
            bill_no: self.header.bill_no.clone(),
            bill_date: self.header.bill_date,
            delivery_date: self.header.delivery_date,
            agency: self.header.agency.clone(),
            bill_amount: self.header.bill_amount,
            tax_amount: self.header.tax_amount,
            discount_in_bill: self.header.discount_in_bill,
            discount_amount: self.header.discount_amount,
            lines: self
                .lines
                .iter()
                .map(|l| PurchaseCandidate {
                    line: line_candidate(l.line()),
                    catalog_mrp: l.catalog_mrp(),
                })
                .collect(),
        };
        submission.validate()?;
        Ok(submission)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
