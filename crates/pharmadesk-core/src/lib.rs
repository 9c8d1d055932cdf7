//! # pharmadesk-core: Pure Billing Logic for PharmaDesk
//!
//! This crate is the **heart** of PharmaDesk. It contains the billing rules
//! of the pharmacy counter and the store room as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmaDesk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Operator side (pharmadesk-client)                  │   │
//! │  │   SessionContext ──► PharmacyClient ──► BillDraft::submit       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    /api/invoices, /api/supplier-bills, /api/reports/stock ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ pharmadesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ line_item │  │ aggregate │  │  payment  │  │   stock   │  │   │
//! │  │   │ LineItems │  │ BillTotals│  │ reconcile │  │ validate  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   draft   │  │ supplier_ │  │    ids    │  │  report   │  │   │
//! │  │   │ BillDraft │  │   bill    │  │ UHID, PM… │  │ StockRow  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                pharmadesk-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money in paise (no floating point!)
//! - [`line_item`] - Bill lines with stable local ids
//! - [`stock`] - Stock Validator
//! - [`aggregate`] - Bill Aggregator
//! - [`payment`] - Split-Payment Reconciler
//! - [`price`] - Price-Difference Annotator
//! - [`supplier_bill`] - Supplier bill totals and the payment transition
//! - [`draft`] - BillDraft / PurchaseDraft lifecycle and the gateway seam
//! - [`ids`] - UHID, invoice and bill ids
//! - [`report`] - Stock report classification
//! - [`patient`], [`catalog`], [`returns`] - Request types with validation
//! - [`types`] - Persisted domain types
//! - [`error`] - Domain error types
//! - [`validation`] - Field validators
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Totals are derived, never stored alongside their inputs
//! 2. **No I/O**: The one async seam is the [`draft::InvoiceGateway`] trait
//! 3. **Integer Money**: All monetary values are paise (i64)
//! 4. **Closed Enums**: Payment modes and reasons are never free strings
//!
//! ## Example Usage
//!
//! ```rust
//! use pharmadesk_core::draft::BillDraft;
//! use pharmadesk_core::line_item::LineCandidate;
//! use pharmadesk_core::{Money, PaymentMode};
//!
//! let mut draft = BillDraft::new();
//! draft.add_line(LineCandidate::new("Paracetamol", 2, Money::from_paise(1000)), None).unwrap();
//! draft.add_line(LineCandidate::new("Amoxicillin", 3, Money::from_paise(1500)), None).unwrap();
//! draft.set_discount(Money::from_paise(500));
//! draft.set_payment_mode(Some(PaymentMode::Cash));
//!
//! assert_eq!(draft.totals().final_amount.to_string(), "₹60.00");
//! assert_eq!(draft.payment().cash.paise(), 6000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod catalog;
pub mod draft;
pub mod error;
pub mod ids;
pub mod line_item;
pub mod money;
pub mod patient;
pub mod payment;
pub mod price;
pub mod report;
pub mod returns;
pub mod stock;
pub mod supplier_bill;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pharmadesk_core::Money` instead of
// `use pharmadesk_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, PAYMENT_TOLERANCE};
pub use types::*;
