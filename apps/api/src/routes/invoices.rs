//! Invoice submission and reprint.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use pharmadesk_core::draft::{InvoiceReceipt, InvoiceSubmission};
use pharmadesk_core::{Invoice, InvoiceWithLines};
use serde::Deserialize;
use tracing::info;

use super::{AppJson, AppQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DateParam {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Accepts the whole bill or nothing. The receipt's amounts are the ones
/// the counter must show.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    AppJson(submission): AppJson<InvoiceSubmission>,
) -> ApiResult<(StatusCode, Json<InvoiceReceipt>)> {
    let receipt = state
        .db
        .invoices()
        .create(&submission, &session.operator, state.clock.now())
        .await?;

    info!(
        invoice_id = %receipt.invoice_id,
        final_amount = %receipt.final_amount,
        operator = %session.operator,
        "Invoice accepted"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn last(State(state): State<AppState>, _session: Session) -> ApiResult<Json<InvoiceWithLines>> {
    state
        .db
        .invoices()
        .last()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Invoice", "last"))
}

/// Invoices of one day, today by default.
pub async fn list(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<DateParam>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let date = params.date.unwrap_or_else(|| state.clock.today());
    Ok(Json(state.db.invoices().list_on(date).await?))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    _session: Session,
    Path(invoice_id): Path<String>,
) -> ApiResult<Json<InvoiceWithLines>> {
    state
        .db
        .invoices()
        .get(&invoice_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Invoice", invoice_id))
}
