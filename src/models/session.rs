//! Authenticated session model

use chrono::{DateTime, Duration, Utc};

use super::SessionToken;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: SessionToken, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// A session is usable strictly before its expiry instant
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new(SessionToken::generate(), now, Duration::hours(24));
        assert!(session.is_active_at(now));
        assert!(session.is_active_at(now + Duration::hours(23)));
        assert!(!session.is_active_at(now + Duration::hours(24)));
    }
}
