//! Returns to agencies.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pharmadesk_core::returns::ReturnRequest;
use pharmadesk_core::SupplierReturn;
use serde::Deserialize;

use super::{AppJson, AppQuery};
use crate::auth::Session;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AgencyParam {
    #[serde(default)]
    pub agency: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    AppJson(request): AppJson<ReturnRequest>,
) -> ApiResult<(StatusCode, Json<SupplierReturn>)> {
    let stored = state.db.returns().create(&request, &session.operator).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn list(
    State(state): State<AppState>,
    _session: Session,
    AppQuery(params): AppQuery<AgencyParam>,
) -> ApiResult<Json<Vec<SupplierReturn>>> {
    Ok(Json(state.db.returns().list(params.agency.as_deref()).await?))
}
