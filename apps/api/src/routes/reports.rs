//! Stock report.

use axum::extract::State;
use axum::Json;
use pharmadesk_core::report::{StockFilter, StockFilterOptions, StockReport};

use super::AppQuery;
use crate::auth::Session;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn stock(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(filter): AppQuery<StockFilter>,
) -> ApiResult<Json<StockReport>> {
    let report = state
        .db
        .reports()
        .stock_report(filter, state.clock.today())
        .await?;
    Ok(Json(report))
}

pub async fn filter_options(
    State(state): State<AppState>,
    _session: Session,
) -> ApiResult<Json<StockFilterOptions>> {
    Ok(Json(state.db.reports().filter_options().await?))
}
