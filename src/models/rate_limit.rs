//! Failed-attempt counter model

use chrono::{DateTime, Utc};

/// Where the counter sits in the Normal → Warning → Locked progression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitState {
    Normal,
    Warning,
    Locked,
}

/// Failed PIN attempts inside the current window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub attempts: u32,
    /// End of an active or past lockout
    pub locked_until: Option<DateTime<Utc>>,
    /// When the store may purge the counter
    pub expires_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RateLimitEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The lock end, if a lock is still in force at `now`
    pub fn active_lock(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.locked_until.filter(|until| *until > now)
    }

    pub fn state(
        &self,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout_attempts: u32,
    ) -> RateLimitState {
        if self.active_lock(now).is_some() || self.attempts >= lockout_attempts {
            RateLimitState::Locked
        } else if self.attempts >= max_attempts {
            RateLimitState::Warning
        } else {
            RateLimitState::Normal
        }
    }
}
