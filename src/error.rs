//! Error types for Passbook
//!
//! Errors are grouped by kind rather than by the component that raised them,
//! so the transport layer (the CLI here) can map each kind to a status
//! without knowing which service produced it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Money, MoneyParseError};

/// Caller-input problems. Never worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("PIN must be 4-6 digits")]
    PinTooShort,

    #[error("PIN must contain only digits")]
    PinNotNumeric,

    #[error("PINs do not match")]
    PinMismatch,

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("{0}")]
    MalformedAmount(String),

    #[error("Amount out of range")]
    AmountOutOfRange,

    #[error("Description too long (max {max} characters)")]
    DescriptionTooLong { max: usize },

    #[error("No changes provided")]
    NoChanges,

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Funds amount must be positive")]
    FundsNotPositive,

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),
}

impl From<MoneyParseError> for ValidationError {
    fn from(err: MoneyParseError) -> Self {
        Self::MalformedAmount(err.to_string())
    }
}

/// The main error type for Passbook operations
#[derive(Error, Debug)]
pub enum PassbookError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Bad caller input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    #[error("PIN already set up")]
    PinAlreadySet,

    /// Insufficient funds
    #[error("Insufficient funds in {period}: need {needed}, have {available}")]
    InsufficientFunds {
        period: String,
        needed: Money,
        available: Money,
    },

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("PIN not set up")]
    PinNotSetup,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Invalid PIN, {attempts_remaining} attempts remaining before lockout")]
    RateLimited { attempts_remaining: u32 },

    #[error("Too many failed attempts, locked until {until}")]
    Locked { until: DateTime<Utc> },

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Credential hashing or hash parsing failed
    #[error("Credential error: {0}")]
    Credential(String),
}

impl PassbookError {
    /// Create a "not found" error for month ledgers
    pub fn month_not_found(period: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Month",
            identifier: period.into(),
        }
    }

    /// Create a "not found" error for expenses
    pub fn expense_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense",
            identifier: identifier.into(),
        }
    }

    /// Create a "month already exists" error
    pub fn month_exists(period: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: "Month",
            identifier: period.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a conflict with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::PinAlreadySet)
    }

    /// Check if this is an authentication failure
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidPin
                | Self::PinNotSetup
                | Self::InvalidSession
                | Self::RateLimited { .. }
                | Self::Locked { .. }
        )
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound { .. } => 3,
            Self::Duplicate { .. } | Self::PinAlreadySet => 4,
            Self::InsufficientFunds { .. } => 5,
            Self::InvalidPin | Self::PinNotSetup | Self::InvalidSession => 6,
            Self::RateLimited { .. } | Self::Locked { .. } => 7,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for PassbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PassbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Passbook operations
pub type PassbookResult<T> = Result<T, PassbookError>;
