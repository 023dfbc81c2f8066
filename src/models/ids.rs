//! Identifier types
//!
//! Expense ids and session tokens are strings on the wire, but wrapping them
//! keeps them from being mixed up with periods or descriptions.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Width of the zero-padded nanosecond prefix, wide enough for any `i64` timestamp
const NANOS_WIDTH: usize = 20;

/// Length of the random suffix that separates ids minted in the same nanosecond
const SUFFIX_LEN: usize = 8;

/// Identifier of an expense within its month
///
/// Format: `<20-digit unix nanos>#<8 hex chars>`. Lexicographic order of ids
/// is creation order, which is what the store's sort-key ordering relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// Mint a new id for an expense created at `at`
    pub fn generate(at: DateTime<Utc>) -> Self {
        let nanos =
            i128::from(at.timestamp()) * 1_000_000_000 + i128::from(at.timestamp_subsec_nanos());
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{:0width$}#{}",
            nanos,
            &suffix[..SUFFIX_LEN],
            width = NANOS_WIDTH
        ))
    }

    /// Wrap an id supplied by a caller; unknown ids simply won't be found
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpenseId {
    fn from(raw: &str) -> Self {
        Self::from_raw(raw)
    }
}

/// Opaque bearer token for an authenticated session
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Number of random bytes behind each token
    pub const ENTROPY_BYTES: usize = 32;

    /// Generate an unguessable token from the OS random source
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken([REDACTED {} chars])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expense_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let id = ExpenseId::generate(at);
        let (nanos, suffix) = id.as_str().split_once('#').unwrap();
        assert_eq!(nanos.len(), NANOS_WIDTH);
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert_eq!(nanos.parse::<i128>().unwrap(), 1_772_366_400_000_000_000);
    }

    #[test]
    fn test_expense_ids_sort_by_creation_time() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::nanoseconds(1);
        assert!(ExpenseId::generate(earlier) < ExpenseId::generate(later));
    }

    #[test]
    fn test_same_instant_ids_are_unique() {
        let at = Utc::now();
        assert_ne!(ExpenseId::generate(at), ExpenseId::generate(at));
    }

    #[test]
    fn test_session_token_shape() {
        let token = SessionToken::generate();
        // 32 bytes of base64 without padding
        assert_eq!(token.as_str().len(), 43);
        assert!(!token.as_str().contains(['+', '/', '=']));
        assert_ne!(token, SessionToken::generate());
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::from_raw("secret-value");
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
