//! Login, verify and logout.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pharmadesk_core::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppJson;
use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub operator: String,
    pub display_name: String,
    /// Unix timestamp.
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct OperatorInfo {
    pub operator: String,
    pub display_name: String,
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ValidationError::required("username").into());
    }
    if request.password.is_empty() {
        return Err(ValidationError::required("password").into());
    }

    let user = state
        .db
        .users()
        .verify_credentials(username, &request.password)
        .await?
        .ok_or_else(|| {
            warn!(username = %username, "Login refused");
            ApiError::Unauthorized("Invalid username or password".to_string())
        })?;

    let issued = state.jwt.issue(&user.username)?;
    info!(operator = %user.username, "Operator logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        operator: user.username,
        display_name: user.display_name,
        expires_at: issued.expires_at,
    }))
}

/// Echoes the operator behind the token, if the account is still active.
pub async fn verify(State(state): State<AppState>, session: Session) -> ApiResult<Json<OperatorInfo>> {
    let user = state
        .db
        .users()
        .get(&session.operator)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::Unauthorized("Account is no longer active".to_string()))?;

    Ok(Json(OperatorInfo {
        operator: user.username,
        display_name: user.display_name,
    }))
}

/// Tokens are stateless; the client drops its copy.
pub async fn logout(session: Session) -> StatusCode {
    info!(operator = %session.operator, jti = %session.claims.jti, "Operator logged out");
    StatusCode::NO_CONTENT
}
