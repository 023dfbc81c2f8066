//! Consistency report
//!
//! Recomputes every derived counter from the expense records and lists
//! where the stored values disagree. Read-only: repairs are left to the
//! operator.

use std::collections::BTreeSet;

use crate::error::PassbookResult;
use crate::models::{Money, Period};
use crate::storage::{keys, Storage};

/// A month whose stored counters disagree with its expenses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthDrift {
    pub period: Period,
    pub recorded_expenses: Money,
    pub actual_expenses: Money,
    pub recorded_ending: Money,
    pub expected_ending: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConsistencyReport {
    pub months_checked: usize,
    pub expenses_checked: usize,
    pub month_drift: Vec<MonthDrift>,
    /// Months holding expenses but no summary
    pub orphaned_periods: Vec<Period>,
    pub recorded_balance: Money,
    /// Sum over months of allowance minus actual expenses
    pub expected_balance: Money,
}

impl ConsistencyReport {
    /// Recorded minus expected balance; `None` if the difference overflows
    pub fn balance_drift(&self) -> Option<Money> {
        self.recorded_balance.checked_sub(self.expected_balance)
    }

    pub fn is_consistent(&self) -> bool {
        self.month_drift.is_empty()
            && self.orphaned_periods.is_empty()
            && self.balance_drift() == Some(Money::zero())
    }
}

pub struct ConsistencyChecker<'a> {
    storage: &'a Storage,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn check(&self) -> PassbookResult<ConsistencyReport> {
        let mut months = self.storage.months.list_all()?;
        months.sort_by_key(|m| m.period);

        let mut report = ConsistencyReport {
            recorded_balance: self.storage.balance.get()?,
            ..ConsistencyReport::default()
        };

        for month in &months {
            let expenses = self.storage.expenses.list_all(month.period)?;
            let actual = Money::try_sum(expenses.iter().map(|e| e.amount))?;
            let expected_ending = month
                .starting_balance
                .try_add(month.allowance_added)?
                .try_sub(actual)?;

            report.months_checked += 1;
            report.expenses_checked += expenses.len();
            report.expected_balance = report
                .expected_balance
                .try_add(month.allowance_added.try_sub(actual)?)?;

            if actual != month.total_expenses || expected_ending != month.ending_balance {
                report.month_drift.push(MonthDrift {
                    period: month.period,
                    recorded_expenses: month.total_expenses,
                    actual_expenses: actual,
                    recorded_ending: month.ending_balance,
                    expected_ending,
                });
            }
        }

        let known: BTreeSet<Period> = months.iter().map(|m| m.period).collect();
        let with_expenses: BTreeSet<Period> = self
            .storage
            .store()
            .scan(&|key, _| key.sk.starts_with(keys::EXPENSE_PREFIX))?
            .iter()
            .filter_map(|r| keys::period_from_pk(&r.key.pk))
            .collect();
        report.orphaned_periods = with_expenses.difference(&known).copied().collect();

        if report.is_consistent() {
            tracing::debug!("Ledger consistent across {} months", report.months_checked);
        } else {
            tracing::warn!(
                "Ledger drift: {} months, {} orphaned, balance recorded {} vs expected {}",
                report.month_drift.len(),
                report.orphaned_periods.len(),
                report.recorded_balance,
                report.expected_balance
            );
        }
        Ok(report)
    }
}
