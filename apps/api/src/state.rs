//! Shared application state.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use pharmadesk_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Where "now" comes from. Invoice ids, visit lists and payment dates all
/// depend on the server's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Local wall clock of the server.
    System,
    /// A pinned local time.
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Local date and time.
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Timestamp for `created_at` columns.
    pub fn now_utc(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => at.and_utc(),
        }
    }
}

/// Everything a handler can reach.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.token_hours);
        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
