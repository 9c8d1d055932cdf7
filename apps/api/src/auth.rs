//! JWT authentication module.
//!
//! Issues HS256 tokens at login and turns a `Bearer` header back into a
//! [`Session`] for every protected handler.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MAX_TOKEN_HOURS;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (operator username)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager. The lifetime is clamped to
    /// `1..=MAX_TOKEN_HOURS`.
    pub fn new(secret: &str, lifetime_hours: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs: lifetime_hours.clamp(1, MAX_TOKEN_HOURS) * 3600,
        }
    }

    /// Generate a token for `operator`.
    pub fn issue(&self, operator: &str) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: operator.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Session Extractor
// =============================================================================

/// The authenticated operator of a request.
///
/// Adding this to a handler's arguments makes the route require a valid
/// `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct Session {
    pub operator: String,
    pub claims: Claims,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))?;

        let claims = state.jwt.validate_token(token)?;
        Ok(Session {
            operator: claims.sub.clone(),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-0123456789", 24);
        let issued = manager.issue("counter1").unwrap();

        let claims = manager.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, "counter1");
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_huge_lifetime_is_clamped() {
        let manager = JwtManager::new("test-secret-0123456789", i64::MAX);
        let issued = manager.issue("counter1").unwrap();

        let claims = manager.validate_token(&issued.token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_HOURS * 3600);
    }

    #[test]
    fn test_tokens_are_unique() {
        let manager = JwtManager::new("test-secret-0123456789", 1);
        let a = manager.issue("counter1").unwrap();
        let b = manager.issue("counter1").unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("first-secret-0123456789", 1);
        let verifier = JwtManager::new("second-secret-0123456789", 1);
        let issued = issuer.issue("counter1").unwrap();

        let err = verifier.validate_token(&issued.token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
