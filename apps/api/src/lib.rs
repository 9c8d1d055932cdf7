//! # PharmaDesk API
//!
//! REST server for the pharmacy counter and the store room.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  client ──► TraceLayer ──► CorsLayer ──► Router ──► Session extractor   │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                     route handler                       │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                   pharmadesk-db repositories            │
//! │                                   (rules from pharmadesk-core)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors leave as `{ "code", "message" }`, see [`error::ApiError`].

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use state::{AppState, Clock};

/// Builds the full application with middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    routes::router()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        info!("No CORS origins configured, allowing any origin");
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
