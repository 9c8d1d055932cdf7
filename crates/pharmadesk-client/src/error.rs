//! # Client Error Types
//!
//! Error types for calls made from the operator side.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Server Answer       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Config         │  │  Transport      │  │  Unauthorized (401)     │ │
//! │  │  InvalidUrl     │  │  Decode         │  │  Api (other 4xx)        │ │
//! │  │                 │  │  (5xx included) │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  NotAuthenticated: no token in the session, nothing was sent            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transport failure is never a success. Only a 2xx body that decodes
//! counts as a confirmed answer.

use pharmadesk_core::draft::GatewayError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong between the operator and the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Base URL could not be parsed or extended.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The session holds no token; the request was not sent.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The server refused the token or the credentials.
    ///
    /// ## When This Occurs
    /// - Token expired or signed with a rotated secret
    /// - Wrong username or password at login
    ///
    /// For authenticated calls the session is invalidated before this is
    /// returned.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// No confirmed answer from the server.
    ///
    /// ## When This Occurs
    /// - Connection refused, DNS failure, timeout
    /// - Server answered 5xx
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 2xx answer whose body could not be read.
    #[error("Unreadable response: {0}")]
    Decode(String),

    // =========================================================================
    // Server Rejections
    // =========================================================================
    /// The server answered with a 4xx and an error body.
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidUrl(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

/// Maps onto the draft's two outcomes: keep-and-retry or show-the-message.
impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { code, message, .. } => GatewayError::Rejected { code, message },
            ClientError::Unauthorized(message) => GatewayError::Rejected {
                code: "UNAUTHORIZED".to_string(),
                message,
            },
            ClientError::NotAuthenticated => GatewayError::Rejected {
                code: "UNAUTHORIZED".to_string(),
                message: ClientError::NotAuthenticated.to_string(),
            },
            other => GatewayError::Transport(other.to_string()),
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true when the server's verdict is unknown.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Decode(_))
    }

    /// Returns true when the operator has to log in again.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::Unauthorized(_)
        )
    }

    /// The server's error code, when the server gave one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            ClientError::Unauthorized(_) => Some("UNAUTHORIZED"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_mapping() {
        let rejected: GatewayError = ClientError::Api {
            status: 409,
            code: "INSUFFICIENT_STOCK".into(),
            message: "Insufficient stock: available 5, requested 6".into(),
        }
        .into();
        assert!(matches!(
            rejected,
            GatewayError::Rejected { ref code, .. } if code == "INSUFFICIENT_STOCK"
        ));

        let transport: GatewayError = ClientError::Transport("connection refused".into()).into();
        assert!(matches!(transport, GatewayError::Transport(_)));

        let decode: GatewayError = ClientError::Decode("expected value".into()).into();
        assert!(matches!(decode, GatewayError::Transport(_)));

        let login: GatewayError = ClientError::NotAuthenticated.into();
        assert!(matches!(login, GatewayError::Rejected { .. }));
    }

    #[test]
    fn test_categories() {
        assert!(ClientError::Transport("timeout".into()).is_transport());
        assert!(!ClientError::Unauthorized("expired".into()).is_transport());
        assert!(ClientError::Unauthorized("expired".into()).needs_login());
        assert_eq!(
            ClientError::Api {
                status: 404,
                code: "NOT_FOUND".into(),
                message: "x".into()
            }
            .code(),
            Some("NOT_FOUND")
        );
    }
}
