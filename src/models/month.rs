//! Month ledger model
//!
//! One summary record per period. The numeric fields are denormalized
//! counters kept in step with the expense records of the month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, Period};
use crate::error::ValidationError;

/// Per-period summary of funds in and out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthLedger {
    pub period: Period,
    /// Carried over from the previous period's ending value at creation
    pub starting_balance: Money,
    pub allowance_added: Money,
    pub total_expenses: Money,
    pub ending_balance: Money,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonthLedger {
    /// A new ledger whose ending value is `starting + allowance`
    pub fn open(
        period: Period,
        starting_balance: Money,
        allowance: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            period,
            starting_balance,
            allowance_added: allowance,
            total_expenses: Money::zero(),
            ending_balance: starting_balance.try_add(allowance)?,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// An all-zero summary for a period that has no stored ledger
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            starting_balance: Money::zero(),
            allowance_added: Money::zero(),
            total_expenses: Money::zero(),
            ending_balance: Money::zero(),
            created_at: None,
            updated_at: None,
        }
    }

    /// What this period contributed on its own: allowance minus spending
    pub fn monthly_saved(&self) -> Result<Money, ValidationError> {
        self.allowance_added.try_sub(self.total_expenses)
    }

    /// The ending value implied by the other counters
    pub fn expected_ending(&self) -> Result<Money, ValidationError> {
        self.starting_balance
            .try_add(self.allowance_added)?
            .try_sub(self.total_expenses)
    }

    pub fn can_cover(&self, amount: Money) -> bool {
        self.ending_balance >= amount
    }
}
