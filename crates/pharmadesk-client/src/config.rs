//! # Client Configuration
//!
//! Where the API lives and how long to wait for it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMADESK_API_URL=http://192.168.1.20:8080                        │
//! │     PHARMADESK_TIMEOUT_SECS=15                                         │
//! │                                                                         │
//! │  2. Default Values (lowest priority)                                   │
//! │     http://localhost:8080/, 30 s                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for [`PharmacyClient`](crate::PharmacyClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Server root. Always ends with `/`.
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("pharmadesk-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Config for a server root, with default timeout and user agent.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let config = ClientConfig {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: default_user_agent(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads from `PHARMADESK_API_URL` / `PHARMADESK_TIMEOUT_SECS`.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over any variable source.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let url = get("PHARMADESK_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = ClientConfig::new(&url)?;

        if let Some(secs) = get("PHARMADESK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("PHARMADESK_TIMEOUT_SECS is not a number: '{}'", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        debug!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "Client config loaded");
        Ok(config)
    }

    /// Rejects non-HTTP schemes and a zero timeout.
    pub fn validate(&self) -> ClientResult<()> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ClientError::Config(format!(
                    "API URL must be http or https, got '{}'",
                    other
                )))
            }
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(self.base_url.to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Parses a server root and makes sure relative joins stay under it.
fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
