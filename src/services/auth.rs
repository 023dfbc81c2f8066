//! PIN authentication service
//!
//! Owns the credential lifecycle (setup, verify, change) and ties the rate
//! limiter and session service together. Verification order:
//!
//! 1. refuse while a lockout is active, without hashing anything
//! 2. `PinNotSetup` if no credential exists
//! 3. hash and compare; a miss counts toward the lockout
//! 4. on success clear the counter (best effort) and issue a session

use chrono::{DateTime, Duration, Utc};

use super::rate_limit::{FailureOutcome, RateLimitPolicy, RateLimitStatus, RateLimiter};
use super::session::SessionService;
use crate::config::AuthSettings;
use crate::crypto::{PinHash, SecurePin};
use crate::error::{PassbookError, PassbookResult};
use crate::models::{Credential, Session, SessionToken};
use crate::storage::Storage;

/// Outcome of a PIN verification that did not fail outright
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified { token: SessionToken },
    Rejected { attempts_remaining: u32 },
    Locked { until: DateTime<Utc> },
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// Convert to the token on success, or the matching error
    pub fn into_result(self) -> PassbookResult<SessionToken> {
        match self {
            Self::Verified { token } => Ok(token),
            Self::Rejected { attempts_remaining } => {
                Err(PassbookError::RateLimited { attempts_remaining })
            }
            Self::Locked { until } => Err(PassbookError::Locked { until }),
        }
    }
}

/// What `auth status` reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub pin_set: bool,
    pub rate_limit: RateLimitStatus,
}

/// Service for PIN authentication
pub struct AuthService<'a> {
    storage: &'a Storage,
    settings: AuthSettings,
}

impl<'a> AuthService<'a> {
    pub fn new(storage: &'a Storage, settings: &AuthSettings) -> Self {
        Self {
            storage,
            settings: settings.clone(),
        }
    }

    fn limiter(&self) -> RateLimiter<'a> {
        RateLimiter::new(self.storage, RateLimitPolicy::from(&self.settings))
    }

    fn sessions(&self) -> SessionService<'a> {
        SessionService::new(self.storage, Duration::hours(self.settings.session_ttl_hours))
    }

    /// Whether a PIN has been configured
    pub fn is_setup(&self) -> PassbookResult<bool> {
        Ok(self.storage.credentials.get()?.is_some())
    }

    pub fn status(&self) -> PassbookResult<AuthStatus> {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> PassbookResult<AuthStatus> {
        Ok(AuthStatus {
            pin_set: self.is_setup()?,
            rate_limit: self.limiter().status_at(now)?,
        })
    }

    /// Configure the PIN for the first time
    pub fn setup_pin(&self, pin: &SecurePin) -> PassbookResult<()> {
        self.setup_pin_at(pin, Utc::now())
    }

    pub fn setup_pin_at(&self, pin: &SecurePin, now: DateTime<Utc>) -> PassbookResult<()> {
        if self.is_setup()? {
            return Err(PassbookError::PinAlreadySet);
        }
        pin.validate()?;

        let hash = PinHash::create(pin.as_bytes(), self.settings.pin_hash)?;
        self.storage.credentials.put(&Credential::new(hash, now))?;
        tracing::info!("PIN configured");
        Ok(())
    }

    /// Check a PIN, issuing a session on success
    pub fn verify_pin(&self, pin: &SecurePin) -> PassbookResult<VerifyOutcome> {
        self.verify_pin_at(pin, Utc::now())
    }

    pub fn verify_pin_at(
        &self,
        pin: &SecurePin,
        now: DateTime<Utc>,
    ) -> PassbookResult<VerifyOutcome> {
        let limiter = self.limiter();
        if let Some(until) = limiter.check_at(now)? {
            tracing::warn!("PIN attempt refused, locked until {}", until);
            return Ok(VerifyOutcome::Locked { until });
        }

        let credential = self
            .storage
            .credentials
            .get()?
            .ok_or(PassbookError::PinNotSetup)?;

        if !credential.pin_hash.verify(pin.as_bytes())? {
            return Ok(match limiter.record_failure_at(now)? {
                FailureOutcome::Rejected { attempts_remaining } => {
                    VerifyOutcome::Rejected { attempts_remaining }
                }
                FailureOutcome::Locked { until } => VerifyOutcome::Locked { until },
            });
        }

        limiter.reset();
        let Session { token, .. } = self.sessions().issue_at(now)?;
        tracing::info!("PIN verified, session issued");
        Ok(VerifyOutcome::Verified { token })
    }

    /// Replace the PIN after checking the current one
    ///
    /// The check is a full verification, so failures count toward the
    /// lockout. Any outcome but success is reported as `InvalidPin`.
    pub fn change_pin(&self, current: &SecurePin, new: &SecurePin) -> PassbookResult<()> {
        self.change_pin_at(current, new, Utc::now())
    }

    pub fn change_pin_at(
        &self,
        current: &SecurePin,
        new: &SecurePin,
        now: DateTime<Utc>,
    ) -> PassbookResult<()> {
        new.validate()?;

        let token = match self.verify_pin_at(current, now)? {
            VerifyOutcome::Verified { token } => token,
            _ => return Err(PassbookError::InvalidPin),
        };
        // The verification's session only authorized this change
        self.sessions().revoke(&token)?;

        let mut credential = self
            .storage
            .credentials
            .get()?
            .ok_or(PassbookError::PinNotSetup)?;
        credential.replace_hash(PinHash::create(new.as_bytes(), self.settings.pin_hash)?, now);
        self.storage.credentials.put(&credential)?;
        tracing::info!("PIN changed");
        Ok(())
    }

    /// The check the transport runs before any ledger operation
    pub fn validate_session(&self, token: &SessionToken) -> PassbookResult<bool> {
        self.sessions().validate_at(token, Utc::now())
    }

    /// Like [`validate_session`](Self::validate_session) but as an error
    pub fn require_session(&self, token: &SessionToken) -> PassbookResult<()> {
        self.require_session_at(token, Utc::now())
    }

    pub fn require_session_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> PassbookResult<()> {
        if self.sessions().validate_at(token, now)? {
            Ok(())
        } else {
            Err(PassbookError::InvalidSession)
        }
    }

    /// End a session
    pub fn logout(&self, token: &SessionToken) -> PassbookResult<()> {
        self.sessions().revoke(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PinHashParams;
    use crate::error::ValidationError;
    use chrono::TimeZone;

    fn settings() -> AuthSettings {
        AuthSettings {
            pin_hash: PinHashParams {
                memory_kib: 1024,
                time_cost: 1,
                parallelism: 1,
            },
            ..AuthSettings::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn pin(s: &str) -> SecurePin {
        SecurePin::from(s)
    }

    fn setup(storage: &Storage) -> AuthService<'_> {
        let auth = AuthService::new(storage, &settings());
        auth.setup_pin_at(&pin("1234"), t0()).unwrap();
        auth
    }

    #[test]
    fn test_setup_then_verify() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);
        assert!(auth.is_setup().unwrap());

        let token = auth.verify_pin_at(&pin("1234"), t0()).unwrap().into_result().unwrap();
        assert!(auth.require_session_at(&token, t0()).is_ok());

        for wrong in ["1235", "0000", "123456", "4321"] {
            assert!(!auth.verify_pin_at(&pin(wrong), t0()).unwrap().is_verified());
        }
    }

    #[test]
    fn test_stored_hash_uses_phc_format() {
        let storage = Storage::in_memory();
        setup(&storage);
        let encoded = storage.credentials.get().unwrap().unwrap().pin_hash.to_string();
        assert!(encoded.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert!(!encoded.contains("1234"));
    }

    #[test]
    fn test_setup_errors() {
        let storage = Storage::in_memory();
        let auth = AuthService::new(&storage, &settings());

        let err = auth.setup_pin_at(&pin("12"), t0()).unwrap_err();
        assert!(matches!(err, PassbookError::Validation(ValidationError::PinTooShort)));
        let err = auth.setup_pin_at(&pin("12a4"), t0()).unwrap_err();
        assert!(matches!(err, PassbookError::Validation(ValidationError::PinNotNumeric)));

        auth.setup_pin_at(&pin("1234"), t0()).unwrap();
        let err = auth.setup_pin_at(&pin("5678"), t0()).unwrap_err();
        assert!(matches!(err, PassbookError::PinAlreadySet));
    }

    #[test]
    fn test_verify_without_setup() {
        let storage = Storage::in_memory();
        let auth = AuthService::new(&storage, &settings());
        assert!(matches!(
            auth.verify_pin_at(&pin("1234"), t0()),
            Err(PassbookError::PinNotSetup)
        ));
    }

    #[test]
    fn test_lockout_refuses_even_correct_pin() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);

        for _ in 0..10 {
            auth.verify_pin_at(&pin("9999"), t0()).unwrap();
        }

        let outcome = auth.verify_pin_at(&pin("1234"), t0()).unwrap();
        match &outcome {
            VerifyOutcome::Locked { until } => assert!(*until >= t0() + Duration::minutes(30)),
            other => panic!("expected lockout, got {:?}", other),
        }
        assert!(matches!(
            outcome.into_result(),
            Err(PassbookError::Locked { .. })
        ));

        // No attempt consumed while locked
        assert_eq!(storage.rate_limits.get().unwrap().unwrap().attempts, 10);
    }

    #[test]
    fn test_success_resets_counter() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);

        for _ in 0..3 {
            auth.verify_pin_at(&pin("9999"), t0()).unwrap();
        }
        assert!(auth.verify_pin_at(&pin("1234"), t0()).unwrap().is_verified());

        assert_eq!(
            auth.verify_pin_at(&pin("9999"), t0()).unwrap(),
            VerifyOutcome::Rejected {
                attempts_remaining: 4
            }
        );
    }

    #[test]
    fn test_change_pin() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);
        let created_at = storage.credentials.get().unwrap().unwrap().created_at;

        let later = t0() + Duration::hours(1);
        auth.change_pin_at(&pin("1234"), &pin("567890"), later).unwrap();

        let credential = storage.credentials.get().unwrap().unwrap();
        assert_eq!(credential.created_at, created_at);
        assert_eq!(credential.updated_at, later);

        assert!(!auth.verify_pin_at(&pin("1234"), later).unwrap().is_verified());
        assert!(auth.verify_pin_at(&pin("567890"), later).unwrap().is_verified());
    }

    #[test]
    fn test_change_pin_revokes_authorizing_session() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);

        auth.change_pin_at(&pin("1234"), &pin("4321"), t0()).unwrap();
        let live = storage
            .store()
            .scan(&|key, _| key.pk.starts_with(crate::storage::keys::SESSION_PREFIX))
            .unwrap();
        assert!(live.is_empty());
    }

    #[test]
    fn test_change_pin_failures() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);

        // New PIN checked before the current one is tried
        let err = auth.change_pin_at(&pin("9999"), &pin("12"), t0()).unwrap_err();
        assert!(matches!(err, PassbookError::Validation(ValidationError::PinTooShort)));
        assert!(storage.rate_limits.get().unwrap().is_none());

        let err = auth.change_pin_at(&pin("9999"), &pin("5678"), t0()).unwrap_err();
        assert!(matches!(err, PassbookError::InvalidPin));
        assert_eq!(storage.rate_limits.get().unwrap().unwrap().attempts, 1);
    }

    #[test]
    fn test_logout_invalidates_session() {
        let storage = Storage::in_memory();
        let auth = setup(&storage);
        let token = auth.verify_pin_at(&pin("1234"), t0()).unwrap().into_result().unwrap();

        auth.logout(&token).unwrap();
        assert!(matches!(
            auth.require_session_at(&token, t0()),
            Err(PassbookError::InvalidSession)
        ));
    }
}
