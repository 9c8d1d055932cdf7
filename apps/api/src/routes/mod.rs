//! # Routes
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open        GET  /health                                               │
//! │              POST /api/auth/login                                       │
//! │                                                                         │
//! │  Session     GET  /api/auth/verify          POST /api/auth/logout       │
//! │                                                                         │
//! │              POST /api/patients             GET  /api/patients/today    │
//! │              GET  /api/patients/search      GET  /api/patients/next-uhid│
//! │              GET  /api/patients/{uhid}                                  │
//! │                                                                         │
//! │              GET|POST /api/medicines        GET  /api/medicines/{id}    │
//! │              GET  /api/medicines/names      GET  /api/medicines/types   │
//! │              GET  /api/medicines/details    GET  /api/medicines/stock   │
//! │              PUT  /api/medicines/{id}/price                             │
//! │                                                                         │
//! │              GET|POST /api/invoices         GET  /api/invoices/last     │
//! │              GET  /api/invoices/{invoice_id}                            │
//! │                                                                         │
//! │              GET|POST /api/supplier-bills   GET  .../agencies           │
//! │              GET  /api/supplier-bills/{bill_id}                         │
//! │              POST /api/supplier-bills/{bill_id}/pay                     │
//! │              POST /api/supplier-bills/bulk-pay   (bulk payers only)     │
//! │                                                                         │
//! │              GET|POST /api/returns                                      │
//! │              GET  /api/reports/stock        GET  .../stock/filters      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, post, put};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

pub mod auth;
pub mod health;
pub mod invoices;
pub mod medicines;
pub mod patients;
pub mod reports;
pub mod returns;
pub mod supplier_bills;

/// `Json` whose rejection is an [`ApiError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejection is an [`ApiError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// All routes, without middleware.
pub fn router() -> Router<AppState> {
    let auth = Router::new()
        .route("/login", post(auth::login))
        .route("/verify", get(auth::verify))
        .route("/logout", post(auth::logout));

    let patients = Router::new()
        .route("/", post(patients::register))
        .route("/today", get(patients::today))
        .route("/search", get(patients::search))
        .route("/next-uhid", get(patients::next_uhid))
        .route("/{uhid}", get(patients::get_patient));

    let medicines = Router::new()
        .route("/", get(medicines::list).post(medicines::create))
        .route("/names", get(medicines::names))
        .route("/types", get(medicines::types))
        .route("/details", get(medicines::details))
        .route("/stock", get(medicines::stock))
        .route("/{id}", get(medicines::get_medicine))
        .route("/{id}/price", put(medicines::update_price));

    let invoices = Router::new()
        .route("/", get(invoices::list).post(invoices::create))
        .route("/last", get(invoices::last))
        .route("/{invoice_id}", get(invoices::get_invoice));

    let supplier_bills = Router::new()
        .route("/", get(supplier_bills::list).post(supplier_bills::create))
        .route("/agencies", get(supplier_bills::agencies))
        .route("/bulk-pay", post(supplier_bills::bulk_pay))
        .route("/{bill_id}", get(supplier_bills::get_bill))
        .route("/{bill_id}/pay", post(supplier_bills::mark_paid));

    let returns = Router::new().route("/", get(returns::list).post(returns::create));

    let reports = Router::new()
        .route("/stock", get(reports::stock))
        .route("/stock/filters", get(reports::filter_options));

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/patients", patients)
        .nest("/medicines", medicines)
        .nest("/invoices", invoices)
        .nest("/supplier-bills", supplier_bills)
        .nest("/returns", returns)
        .nest("/reports", reports);

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
}
