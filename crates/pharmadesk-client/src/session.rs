//! # Operator Session
//!
//! The explicit session object handed to [`PharmacyClient`](crate::PharmacyClient)
//! at process start. Nothing in this crate reads a token from anywhere else.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │   SessionContext::new(on_invalidate)        (process start)             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   login() ──► establish(token, operator)                                │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   every call: Authorization: Bearer <token>                             │
//! │        │                                                                │
//! │        ├── 401 ──► invalidate(): token cleared, on_invalidate() fired   │
//! │        │            (UI shows the login screen)                         │
//! │        │                                                                │
//! │        └── logout() ──► clear(): token cleared, no callback             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

type InvalidateFn = dyn Fn() + Send + Sync;

#[derive(Debug, Clone, Default)]
struct Credentials {
    token: Option<String>,
    operator: Option<String>,
}

/// Token, operator and the invalidation callback for one operator.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionContext {
    credentials: Arc<RwLock<Credentials>>,
    on_invalidate: Arc<InvalidateFn>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Creates an empty session. `on_invalidate` runs whenever the server
    /// refuses the token.
    pub fn new(on_invalidate: impl Fn() + Send + Sync + 'static) -> Self {
        SessionContext {
            credentials: Arc::new(RwLock::new(Credentials::default())),
            on_invalidate: Arc::new(on_invalidate),
        }
    }

    /// A session with no callback, for tools and tests.
    pub fn detached() -> Self {
        Self::new(|| {})
    }

    /// Stores the token issued at login.
    pub async fn establish(&self, token: impl Into<String>, operator: impl Into<String>) {
        let operator = operator.into();
        info!(operator = %operator, "Session established");

        let mut credentials = self.credentials.write().await;
        credentials.token = Some(token.into());
        credentials.operator = Some(operator);
    }

    pub async fn token(&self) -> Option<String> {
        self.credentials.read().await.token.clone()
    }

    pub async fn operator(&self) -> Option<String> {
        self.credentials.read().await.operator.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.read().await.token.is_some()
    }

    /// Drops the token without notifying anyone (operator logged out).
    pub async fn clear(&self) {
        let mut credentials = self.credentials.write().await;
        *credentials = Credentials::default();
        debug!("Session cleared");
    }

    /// Drops the token and fires the callback (server refused it).
    pub async fn invalidate(&self) {
        let previous = {
            let mut credentials = self.credentials.write().await;
            std::mem::take(&mut *credentials)
        };
        info!(operator = ?previous.operator, "Session invalidated");
        (self.on_invalidate)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_establish_and_clear() {
        let session = SessionContext::detached();
        assert!(!session.is_authenticated().await);

        session.establish("tok-1", "counter1").await;
        assert_eq!(session.token().await.as_deref(), Some("tok-1"));
        assert_eq!(session.operator().await.as_deref(), Some("counter1"));

        session.clear().await;
        assert!(session.token().await.is_none());
        assert!(session.operator().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_fires_callback() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let session = SessionContext::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.establish("tok-1", "counter1").await;
        session.clear().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        session.establish("tok-2", "counter1").await;
        let shared = session.clone();
        shared.invalidate().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!session.is_authenticated().await);
    }
}
