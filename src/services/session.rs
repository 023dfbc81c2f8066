//! Session service
//!
//! Issues and checks the opaque bearer tokens handed out after a successful
//! PIN verification.

use chrono::{DateTime, Duration, Utc};

use crate::error::PassbookResult;
use crate::models::{Session, SessionToken};
use crate::storage::Storage;

/// Service for session lifecycle
pub struct SessionService<'a> {
    storage: &'a Storage,
    ttl: Duration,
}

impl<'a> SessionService<'a> {
    pub fn new(storage: &'a Storage, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// Issue a new session valid for the configured TTL
    pub fn issue_at(&self, now: DateTime<Utc>) -> PassbookResult<Session> {
        let session = Session::new(SessionToken::generate(), now, self.ttl);
        self.storage.sessions.put(&session)?;
        tracing::debug!("Issued session expiring at {}", session.expires_at);
        Ok(session)
    }

    /// Whether `token` names a live session
    ///
    /// A session past its expiry is rejected even if the store still holds it.
    pub fn validate_at(&self, token: &SessionToken, now: DateTime<Utc>) -> PassbookResult<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        Ok(self
            .storage
            .sessions
            .get(token)?
            .is_some_and(|session| session.is_active_at(now)))
    }

    /// Delete a session; unknown or empty tokens are a no-op
    pub fn revoke(&self, token: &SessionToken) -> PassbookResult<()> {
        if token.is_empty() {
            return Ok(());
        }
        if self.storage.sessions.delete(token)? {
            tracing::info!("Session revoked");
        }
        Ok(())
    }
}
