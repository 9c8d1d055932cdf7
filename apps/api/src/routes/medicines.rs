//! Medicine catalog: lookups for the billing screen and price maintenance.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pharmadesk_core::catalog::{NewMedicine, PriceUpdate};
use pharmadesk_core::stock::StockSnapshot;
use pharmadesk_core::{Medicine, MedicineDetails};
use serde::Deserialize;
use tracing::info;

use super::{AppJson, AppQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NameParam {
    pub name: String,
}

pub async fn list(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<Medicine>>> {
    Ok(Json(state.db.medicines().list().await?))
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    AppJson(medicine): AppJson<NewMedicine>,
) -> ApiResult<(StatusCode, Json<Medicine>)> {
    let created = state.db.medicines().insert(&medicine).await?;
    info!(id = created.id, name = %created.name, operator = %session.operator, "Medicine added");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn names(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.medicines().names().await?))
}

pub async fn types(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.medicines().types().await?))
}

pub async fn details(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<NameParam>,
) -> ApiResult<Json<MedicineDetails>> {
    state
        .db
        .medicines()
        .details(&params.name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Medicine", params.name))
}

pub async fn stock(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<NameParam>,
) -> ApiResult<Json<StockSnapshot>> {
    state
        .db
        .medicines()
        .stock_snapshot(&params.name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Medicine", params.name))
}

pub async fn get_medicine(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Medicine>> {
    state
        .db
        .medicines()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Medicine", id.to_string()))
}

pub async fn update_price(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    AppJson(update): AppJson<PriceUpdate>,
) -> ApiResult<Json<Medicine>> {
    let updated = state.db.medicines().update_price(id, &update).await?;
    info!(
        id = updated.id,
        mrp_paise = updated.mrp_paise,
        ptr_paise = updated.ptr_paise,
        operator = %session.operator,
        "Medicine price updated"
    );
    Ok(Json(updated))
}
