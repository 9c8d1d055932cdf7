//! # API Error Types
//!
//! Every failure leaves the server as `{ "code": "...", "message": "..." }`.
//!
//! ## Code Map
//! ```text
//! ┌──────────────────────┬────────┬──────────────────────────────────────────┐
//! │ code                 │ status │ raised by                                │
//! ├──────────────────────┼────────┼──────────────────────────────────────────┤
//! │ VALIDATION_ERROR     │ 400    │ ValidationError, EmptyBill, bad body     │
//! │ UNAUTHORIZED         │ 401    │ missing/invalid token, bad login         │
//! │ FORBIDDEN            │ 403    │ bulk payment by a non-bulk payer         │
//! │ NOT_FOUND            │ 404    │ DbError::NotFound                        │
//! │ CONFLICT             │ 409    │ duplicate id/name, bill already paid     │
//! │ INSUFFICIENT_STOCK   │ 409    │ stock guard on invoice or return         │
//! │ PAYMENT_MISMATCH     │ 422    │ split payment does not reconcile         │
//! │ DATABASE_ERROR       │ 500    │ connection, query, migration failures    │
//! │ INTERNAL             │ 500    │ anything else                            │
//! └──────────────────────┴────────┴──────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pharmadesk_core::{CoreError, Money, ValidationError};
use pharmadesk_db::DbError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Bad request body or query string.
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{0}")]
    Conflict(String),

    /// ## When This Occurs
    /// - An invoice line asks for more than the shelf holds at commit time
    /// - A supplier return exceeds the current stock
    #[error("Insufficient stock: available {available}, requested {requested}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Payment mismatch: expected {expected}, got {actual}")]
    PaymentMismatch { expected: Money, actual: Money },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape of an error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            ApiError::PaymentMismatch { .. } => "PAYMENT_MISMATCH",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::InsufficientStock { .. } => StatusCode::CONFLICT,
            ApiError::PaymentMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::Validation(e),
            CoreError::EmptyBill => ApiError::BadRequest(err.to_string()),
            CoreError::InsufficientStock {
                available,
                requested,
            } => ApiError::InsufficientStock {
                available,
                requested,
            },
            CoreError::PaymentMismatch { expected, actual } => {
                ApiError::PaymentMismatch { expected, actual }
            }
            CoreError::BillAlreadyPaid { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Transport { .. } | CoreError::Rejected { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => {
                ApiError::Conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => ApiError::Conflict(message),
            DbError::Rule(core) => core.into(),
            DbError::Internal(message) => ApiError::Internal(message),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
