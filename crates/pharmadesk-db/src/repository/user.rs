//! # User Repository
//!
//! Operator accounts. Passwords are stored as argon2 PHC strings and never
//! leave this module in plain form.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// An operator account (without the password hash).
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository for operator accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an operator with a freshly hashed password.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Username taken
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> DbResult<User> {
        let username = username.trim();
        let hash = hash_password(password)?;

        debug!(username = %username, "Creating operator");

        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, display_name, is_active, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            "#,
        )
        .bind(username)
        .bind(hash)
        .bind(display_name.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(username))?;

        self.get(username)
            .await?
            .ok_or_else(|| DbError::not_found("User", username))
    }

    /// Gets an operator by username.
    pub async fn get(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, display_name, is_active, created_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks a login. Returns the user only for an active account with a
    /// matching password.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT password_hash FROM users WHERE username = ?1 AND is_active = 1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some((hash,)) = row else {
            return Ok(None);
        };

        if !verify_password(password, &hash) {
            warn!(username = %username.trim(), "Password mismatch");
            return Ok(None);
        }

        self.get(username).await
    }

    /// Whether any operator exists (the seed binary skips creation if so).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
