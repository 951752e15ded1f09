//! Session resolution against the identity service.
//!
//! The identity service itself lives outside the backend. The backend only
//! needs two things from it: turning a request's session token into a
//! [`Session`], and periodically renewing the backend's own service session.
//! Both go through the [`IdentityProvider`] trait.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

const IDENTITY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::identity");

/// User identifier assigned to the single-player session.
pub const LOCAL_USER_ID: &str = "local";

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user_id: String,
    expires_at: Option<SystemTime>,
}

impl Session {
    /// Builds a session that expires at `expires_at`.
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        expires_at: SystemTime,
    ) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Builds the non-expiring single-player session.
    #[must_use]
    pub fn local(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: LOCAL_USER_ID.to_owned(),
            expires_at: None,
        }
    }

    /// Token the client presented.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Authenticated user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Expiry instant; `None` for sessions that never expire.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Returns `true` once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Errors reported by an identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity service could not be reached.
    #[error("identity service unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },
    /// The identity service refused the request.
    #[error("identity service rejected the request: {message}")]
    Rejected {
        /// Failure description.
        message: String,
    },
}

/// Client for the identity service.
pub trait IdentityProvider: Send + Sync {
    /// Resolves a session token.
    ///
    /// Returns `Ok(None)` when the token names no session. Requests without
    /// a token are treated as anonymous and never reach the provider.
    ///
    /// # Errors
    ///
    /// Fails when the identity service cannot answer.
    fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError>;

    /// Fetches or extends the backend's own service session.
    ///
    /// # Errors
    ///
    /// Fails when the identity service cannot answer.
    fn renew_service_session(&self) -> Result<(), IdentityError>;
}

/// Single-player identity: every token maps to the local user and nothing
/// touches the network.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalIdentity;

impl IdentityProvider for LocalIdentity {
    fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError> {
        Ok(Some(Session::local(token)))
    }

    fn renew_service_session(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// In-memory session store for multiplayer backends.
///
/// Sessions are issued and revoked explicitly. Renewal prunes expired
/// entries.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session`, replacing any session with the same token.
    pub fn issue(&self, session: Session) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.token.clone(), session);
    }

    /// Forgets the session for `token`, returning it if present.
    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityProvider for SessionTable {
    fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned())
    }

    fn renew_service_session(&self) -> Result<(), IdentityError> {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        debug!(
            target: IDENTITY_TARGET,
            pruned = before - sessions.len(),
            "expired sessions pruned"
        );
        Ok(())
    }
}
