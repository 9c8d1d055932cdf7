//! Registration desk: visits, search and UHID preview.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pharmadesk_core::patient::PatientRegistration;
use pharmadesk_core::{Patient, PatientSearchField, PatientVisit, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AppJson, AppQuery};
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub field: PatientSearchField,
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct NameParam {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UhidPreview {
    pub uhid: String,
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    AppJson(registration): AppJson<PatientRegistration>,
) -> ApiResult<(StatusCode, Json<PatientVisit>)> {
    let visit = state
        .db
        .patients()
        .register(&registration, state.clock.now_utc())
        .await?;

    info!(
        uhid = %visit.uhid,
        visit_id = visit.visit_id,
        operator = %session.operator,
        "Patient registered"
    );
    Ok((StatusCode::CREATED, Json(visit)))
}

/// Visits registered on the server's current date.
pub async fn today(State(state): State<AppState>, _session: Session) -> ApiResult<Json<Vec<PatientVisit>>> {
    let visits = state.db.patients().visits_on(state.clock.today()).await?;
    Ok(Json(visits))
}

pub async fn search(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<SearchParams>,
) -> ApiResult<Json<Vec<PatientVisit>>> {
    let visits = state.db.patients().search(params.field, &params.q).await?;
    Ok(Json(visits))
}

pub async fn next_uhid(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<NameParam>,
) -> ApiResult<Json<UhidPreview>> {
    if params.name.trim().is_empty() {
        return Err(ValidationError::required("name").into());
    }
    let uhid = state
        .db
        .patients()
        .preview_uhid(&params.name, state.clock.today())
        .await?;
    Ok(Json(UhidPreview { uhid }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    _session: Session,
    Path(uhid): Path<String>,
) -> ApiResult<Json<Patient>> {
    state
        .db
        .patients()
        .get(&uhid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Patient", uhid))
}
