//! # API Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PHARMADESK_PORT=9090                                               │
//! │     JWT_SECRET=...                                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else $PHARMADESK_CONFIG, else                     │
//! │     ~/.config/pharmadesk/api.toml (Linux)                              │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:8080, pharmadesk.db, 24 h tokens                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//! cors_origins = ["http://localhost:5173"]
//!
//! [database]
//! path = "/var/lib/pharmadesk/pharmadesk.db"
//! max_connections = 5
//!
//! [auth]
//! jwt_secret = "at-least-sixteen-characters"
//! token_hours = 24
//! bulk_payers = ["store1", "owner"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Secret used when nothing else is configured. Accepted by validation so a
/// fresh checkout runs, and logged loudly at startup.
pub const DEV_JWT_SECRET: &str = "pharmadesk-dev-secret";

const MIN_SECRET_LEN: usize = 16;

/// Longest accepted session lifetime (30 days).
pub const MAX_TOKEN_HOURS: i64 = 720;

// =============================================================================
// Config Error
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("pharmadesk.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Token lifetime in hours.
    #[serde(default = "default_token_hours")]
    pub token_hours: i64,

    /// Operators allowed to settle several supplier bills at once.
    #[serde(default)]
    pub bulk_payers: Vec<String>,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_hours() -> i64 {
    24
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_hours: default_token_hours(),
            bulk_payers: Vec::new(),
        }
    }
}

// =============================================================================
// API Configuration
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (api.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.or_else(|| std::env::var("PHARMADESK_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            // A path the operator named must exist.
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading API config from file");
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Applies `PHARMADESK_*` / `JWT_SECRET` overrides from `get`.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(addr) = get("PHARMADESK_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = get("PHARMADESK_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PHARMADESK_PORT".to_string()))?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(path) = get("PHARMADESK_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(hours) = get("PHARMADESK_TOKEN_HOURS") {
            self.auth.token_hours = hours
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PHARMADESK_TOKEN_HOURS".to_string()))?;
        }

        if let Some(list) = get("PHARMADESK_BULK_PAYERS") {
            self.auth.bulk_payers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port".to_string()));
        }

        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if secret.len() < MIN_SECRET_LEN && secret != DEV_JWT_SECRET {
            return Err(ConfigError::InvalidValue(format!(
                "auth.jwt_secret (must be at least {} characters)",
                MIN_SECRET_LEN
            )));
        }

        if !(1..=MAX_TOKEN_HOURS).contains(&self.auth.token_hours) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.token_hours (must be between 1 and {})",
                MAX_TOKEN_HOURS
            )));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }

        if self.uses_dev_secret() {
            warn!("JWT_SECRET not set, using the development secret");
        }

        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }

    /// Whether `operator` may run bulk supplier payments.
    pub fn can_bulk_pay(&self, operator: &str) -> bool {
        self.auth.bulk_payers.iter().any(|p| p == operator)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pharmadesk", "pharmadesk")
            .map(|dirs| dirs.config_dir().join("api.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.path, PathBuf::from("pharmadesk.db"));
        assert_eq!(config.auth.token_hours, 24);
        assert!(config.uses_dev_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_then_env() {
        let mut config = ApiConfig::from_toml(
            r#"
            [server]
            port = 9000

            [auth]
            jwt_secret = "a-long-enough-secret-value"
            bulk_payers = ["owner"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert!(config.can_bulk_pay("owner"));

        config
            .apply_overrides(vars(&[
                ("PHARMADESK_PORT", "9100"),
                ("PHARMADESK_DB_PATH", "/tmp/pd.db"),
                ("PHARMADESK_BULK_PAYERS", "store1, accounts ,"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.path, PathBuf::from("/tmp/pd.db"));
        assert_eq!(config.auth.bulk_payers, vec!["store1", "accounts"]);
        assert!(!config.can_bulk_pay("owner"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ApiConfig::default();

        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());

        config.auth.jwt_secret = "   ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));

        config.auth.jwt_secret = "a-long-enough-secret-value".to_string();
        config.auth.token_hours = 0;
        assert!(config.validate().is_err());

        config.auth.token_hours = 10_000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.auth.token_hours = MAX_TOKEN_HOURS;
        assert!(config.validate().is_ok());

        config.auth.token_hours = 8;
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = ApiConfig::default();
        assert!(matches!(
            config.apply_overrides(vars(&[("PHARMADESK_PORT", "eighty")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(config
            .apply_overrides(vars(&[("PHARMADESK_TOKEN_HOURS", "1.5")]))
            .is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ApiConfig::from_toml("[server]\nport = \"x\""),
            Err(ConfigError::Parse { .. })
        ));
    }
}
