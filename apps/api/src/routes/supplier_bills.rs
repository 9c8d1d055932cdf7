//! Supplier bills: entry, listing and payment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pharmadesk_core::supplier_bill::{
    BulkAllocation, BulkPaymentRequest, MarkPaidRequest, SupplierBillSubmission,
};
use pharmadesk_core::{StockDelivery, SupplierBill};
use pharmadesk_db::BillQuery;
use serde::Serialize;
use tracing::{info, warn};

use super::{AppJson, AppQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// A bill with the stock it delivered.
#[derive(Debug, Serialize)]
pub struct BillDetail {
    pub bill: SupplierBill,
    pub deliveries: Vec<StockDelivery>,
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    AppJson(submission): AppJson<SupplierBillSubmission>,
) -> ApiResult<(StatusCode, Json<SupplierBill>)> {
    let bill = state.db.supplier_bills().create(&submission).await?;
    info!(
        bill_id = %bill.bill_id,
        agency = %bill.agency,
        bill_total = %bill.bill_total(),
        operator = %session.operator,
        "Supplier bill entered"
    );
    Ok((StatusCode::CREATED, Json(bill)))
}

/// Unpaid bills unless `status` says otherwise.
pub async fn list(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(query): AppQuery<BillQuery>,
) -> ApiResult<Json<Vec<SupplierBill>>> {
    Ok(Json(state.db.supplier_bills().list(&query).await?))
}

pub async fn agencies(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.supplier_bills().agencies().await?))
}

pub async fn get_bill(
    State(state): State<AppState>,
    _session: Session,
    Path(bill_id): Path<String>,
) -> ApiResult<Json<BillDetail>> {
    let repo = state.db.supplier_bills();
    let bill = repo
        .get(&bill_id)
        .await?
        .ok_or_else(|| ApiError::not_found("SupplierBill", bill_id.clone()))?;
    let deliveries = repo.deliveries(&bill_id).await?;
    Ok(Json(BillDetail { bill, deliveries }))
}

/// Unpaid → paid. The payment date is the server's today.
pub async fn mark_paid(
    State(state): State<AppState>,
    session: Session,
    Path(bill_id): Path<String>,
    AppJson(request): AppJson<MarkPaidRequest>,
) -> ApiResult<Json<SupplierBill>> {
    let bill = state
        .db
        .supplier_bills()
        .mark_paid(&bill_id, &request, state.clock.today())
        .await?;
    info!(bill_id = %bill.bill_id, operator = %session.operator, "Bill marked paid");
    Ok(Json(bill))
}

pub async fn bulk_pay(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<BulkPaymentRequest>,
) -> ApiResult<Json<Vec<BulkAllocation>>> {
    if !state.config.can_bulk_pay(&session.operator) {
        warn!(operator = %session.operator, "Bulk payment refused");
        return Err(ApiError::Forbidden(format!(
            "{} may not settle bills in bulk",
            session.operator
        )));
    }

    let allocations = state.db.supplier_bills().bulk_pay(&request).await?;
    info!(
        bills = allocations.len(),
        amount_paid = %request.amount_paid,
        operator = %session.operator,
        "Bulk payment recorded"
    );
    Ok(Json(allocations))
}
