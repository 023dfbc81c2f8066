//! Failed-attempt rate limiter
//!
//! Progresses `Normal -> Warning -> Locked`. The counter lives in a single
//! store item whose `ttl` doubles as the reset: once it passes, the limiter
//! is back to `Normal` whether or not the store has purged the item yet.

use chrono::{DateTime, Duration, Utc};

use crate::config::AuthSettings;
use crate::error::PassbookResult;
use crate::models::{RateLimitEntry, RateLimitState};
use crate::storage::Storage;

/// Thresholds and durations for the limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Failures after which the state is `Warning`
    pub max_attempts: u32,
    /// Failures after which the state is `Locked`
    pub lockout_attempts: u32,
    pub lockout: Duration,
    /// How long each failure keeps the counter alive
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from(&AuthSettings::default())
    }
}

impl From<&AuthSettings> for RateLimitPolicy {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            lockout_attempts: settings.lockout_attempts,
            lockout: Duration::minutes(settings.lockout_minutes),
            window: Duration::minutes(settings.window_minutes),
        }
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Rejected { attempts_remaining: u32 },
    Locked { until: DateTime<Utc> },
}

/// Snapshot for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub state: RateLimitState,
    pub attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

pub struct RateLimiter<'a> {
    storage: &'a Storage,
    policy: RateLimitPolicy,
}

impl<'a> RateLimiter<'a> {
    pub fn new(storage: &'a Storage, policy: RateLimitPolicy) -> Self {
        Self { storage, policy }
    }

    /// The live counter; an expired one is deleted and treated as absent
    fn current(&self, now: DateTime<Utc>) -> PassbookResult<Option<RateLimitEntry>> {
        match self.storage.rate_limits.get()? {
            Some(entry) if entry.is_expired_at(now) => {
                self.storage.rate_limits.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Gate run before any PIN is hashed
    ///
    /// Returns the lock expiry when attempts are currently refused. A counter
    /// at the lockout threshold without an active lock gets locked here.
    pub fn check_at(&self, now: DateTime<Utc>) -> PassbookResult<Option<DateTime<Utc>>> {
        let Some(entry) = self.current(now)? else {
            return Ok(None);
        };
        if let Some(until) = entry.active_lock(now) {
            return Ok(Some(until));
        }
        if entry.attempts >= self.policy.lockout_attempts {
            return self.lock(now, entry.attempts).map(Some);
        }
        Ok(None)
    }

    /// Count a failed verification
    pub fn record_failure_at(&self, now: DateTime<Utc>) -> PassbookResult<FailureOutcome> {
        // Drop a stale counter so the new failure starts a fresh window
        self.current(now)?;

        let entry = self
            .storage
            .rate_limits
            .record_failure(now, self.policy.window)?;

        if entry.attempts >= self.policy.lockout_attempts {
            let until = self.lock(now, entry.attempts)?;
            return Ok(FailureOutcome::Locked { until });
        }

        let attempts_remaining = self.policy.max_attempts.saturating_sub(entry.attempts);
        if entry.attempts >= self.policy.max_attempts {
            tracing::warn!(
                "Failed PIN attempt {} of {} before lockout",
                entry.attempts,
                self.policy.lockout_attempts
            );
        } else {
            tracing::info!("Failed PIN attempt {}", entry.attempts);
        }
        Ok(FailureOutcome::Rejected { attempts_remaining })
    }

    /// Forget all failures after a success; errors are logged, not returned
    pub fn reset(&self) {
        if let Err(e) = self.storage.rate_limits.clear() {
            tracing::warn!("Failed to clear rate limit after successful PIN: {}", e);
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PassbookResult<RateLimitStatus> {
        let status = match self.storage.rate_limits.get()? {
            Some(entry) if !entry.is_expired_at(now) => RateLimitStatus {
                state: entry.state(now, self.policy.max_attempts, self.policy.lockout_attempts),
                attempts: entry.attempts,
                locked_until: entry.active_lock(now),
            },
            _ => RateLimitStatus {
                state: RateLimitState::Normal,
                attempts: 0,
                locked_until: None,
            },
        };
        Ok(status)
    }

    fn lock(&self, now: DateTime<Utc>, attempts: u32) -> PassbookResult<DateTime<Utc>> {
        let until = now + self.policy.lockout;
        self.storage.rate_limits.lock(until, now)?;
        tracing::warn!("PIN entry locked until {} after {} failed attempts", until, attempts);
        Ok(until)
    }
}
