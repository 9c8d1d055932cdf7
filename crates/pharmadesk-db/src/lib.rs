//! # pharmadesk-db: Database Layer for PharmaDesk
//!
//! This crate provides database access for the PharmaDesk server.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmaDesk Data Flow                             │
//! │                                                                         │
//! │  axum handler (POST /api/invoices)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  pharmadesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ MedicineRepo   │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │   │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ SupplierBill…  │   │              │  │   │
//! │  │   │ Management    │    │ ReportRepo …   │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (pharmadesk.db)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharmadesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pharmadesk.db")).await?;
//! let receipt = db.invoices().create(&submission, "counter1", Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::medicine::MedicineRepository;
pub use repository::patient::PatientRepository;
pub use repository::report::ReportRepository;
pub use repository::returns::ReturnRepository;
pub use repository::supplier_bill::{BillQuery, SupplierBillRepository};
pub use repository::user::{User, UserRepository};
