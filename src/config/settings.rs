//! User settings for Passbook
//!
//! Stored as `config.json` in the base directory. Every field has a serde
//! default, so a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};

use super::paths::PassbookPaths;
use crate::crypto::PinHashParams;
use crate::error::{PassbookError, PassbookResult};
use crate::models::Money;
use crate::storage::file_io::load_json_or_default;

/// Environment variable that overrides the monthly allowance
pub const MONTHLY_ALLOWANCE_ENV: &str = "PASSBOOK_MONTHLY_ALLOWANCE";

/// Page size when none is requested
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page any listing returns
pub const MAX_PAGE_SIZE: usize = 100;

/// Upper bound for every configured lockout, window and session length
pub const MAX_DURATION_DAYS: i64 = 366;

/// PIN and session policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Failures before responses start counting down
    pub max_attempts: u32,
    /// Failures that trigger a lockout
    pub lockout_attempts: u32,
    pub lockout_minutes: i64,
    /// How long a failure is remembered
    pub window_minutes: i64,
    pub session_ttl_hours: i64,
    /// Argon2id cost for newly hashed PINs
    pub pin_hash: PinHashParams,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_attempts: 10,
            lockout_minutes: 30,
            window_minutes: 15,
            session_ttl_hours: 24,
            pin_hash: PinHashParams::default(),
        }
    }
}

/// User settings for Passbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Allowance granted to each newly created month
    #[serde(default = "default_monthly_allowance")]
    pub monthly_allowance: Money,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    #[serde(default)]
    pub auth: AuthSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_monthly_allowance() -> Money {
    Money::from_cents(10000)
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_currency() -> String {
    "$".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            monthly_allowance: default_monthly_allowance(),
            default_page_size: default_page_size(),
            currency_symbol: default_currency(),
            auth: AuthSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk (defaults if absent), then apply environment overrides
    pub fn load(paths: &PassbookPaths) -> PassbookResult<Self> {
        let mut settings: Settings = load_json_or_default(paths.settings_file())
            .map_err(|e| PassbookError::Config(format!("Failed to load settings: {}", e)))?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from a variable lookup (the process environment in practice)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> PassbookResult<()> {
        if let Some(raw) = lookup(MONTHLY_ALLOWANCE_ENV).filter(|v| !v.trim().is_empty()) {
            self.monthly_allowance = Money::parse(&raw).map_err(|e| {
                PassbookError::Config(format!("{}: {}", MONTHLY_ALLOWANCE_ENV, e))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> PassbookResult<()> {
        if self.monthly_allowance.is_negative() {
            return Err(PassbookError::Config("monthly_allowance must not be negative".into()));
        }
        let auth = &self.auth;
        if auth.max_attempts == 0 || auth.lockout_attempts < auth.max_attempts {
            return Err(PassbookError::Config(
                "auth.lockout_attempts must be at least auth.max_attempts (and both positive)"
                    .into(),
            ));
        }
        let max_minutes = MAX_DURATION_DAYS * 24 * 60;
        let durations_ok = (1..=max_minutes).contains(&auth.lockout_minutes)
            && (1..=max_minutes).contains(&auth.window_minutes)
            && (1..=MAX_DURATION_DAYS * 24).contains(&auth.session_ttl_hours);
        if !durations_ok {
            return Err(PassbookError::Config(format!(
                "auth durations must be positive and at most {} days",
                MAX_DURATION_DAYS
            )));
        }
        Ok(())
    }

    /// Clamp a requested page size to `1..=100`, falling back to the default
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        clamp_page_size(requested.unwrap_or(self.default_page_size))
    }
}

pub fn clamp_page_size(requested: usize) -> usize {
    requested.clamp(1, MAX_PAGE_SIZE)
}
