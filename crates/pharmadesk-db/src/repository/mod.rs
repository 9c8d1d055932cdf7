//! # Repository Module
//!
//! Database repository implementations for PharmaDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().create(&submission, operator, now)              │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── core: submission.validate()   (pure rules)                        │
//! │  └── SQL: one transaction          (invoice, lines, stock)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write re-runs the pharmadesk-core rules before touching SQL, so a
//! request that skipped the client-side checks is still rejected.
//!
//! ## Available Repositories
//!
//! - [`MedicineRepository`](medicine::MedicineRepository) - Catalog, prices, stock snapshots
//! - [`PatientRepository`](patient::PatientRepository) - Registration, visits, search
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice submission and reprint
//! - [`SupplierBillRepository`](supplier_bill::SupplierBillRepository) - Purchases and payments
//! - [`ReturnRepository`](returns::ReturnRepository) - Returns to agencies
//! - [`ReportRepository`](report::ReportRepository) - Stock report
//! - [`UserRepository`](user::UserRepository) - Operator accounts

pub mod invoice;
pub mod medicine;
pub mod patient;
pub mod report;
pub mod returns;
pub mod supplier_bill;
pub mod user;
