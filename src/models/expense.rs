//! Expense record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExpenseId, Money, Period};
use crate::error::ValidationError;

/// Maximum description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Description used when the caller leaves it blank
pub const DEFAULT_DESCRIPTION: &str = "Expense";

/// A single spending entry within a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub period: Period,
    pub amount: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Build a new expense, minting its id from `now`
    ///
    /// Inputs must already have passed [`validate_amount`] and
    /// [`normalize_description`].
    pub fn new(period: Period, amount: Money, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ExpenseId::generate(now),
            period,
            amount,
            description,
            created_at: now,
        }
    }
}

/// Expense amounts must be strictly positive
pub fn validate_amount(amount: Money) -> Result<Money, ValidationError> {
    if amount.is_positive() {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount)
    }
}

/// Trim, enforce the length cap, and substitute the placeholder for blanks
pub fn normalize_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_LEN,
        });
    }
    if trimmed.is_empty() {
        Ok(DEFAULT_DESCRIPTION.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
