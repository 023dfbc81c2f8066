//! Ledger service
//!
//! Keeps three separately stored records in agreement: the global balance,
//! each month's summary, and the expense records under it. The store only
//! offers single-item atomic updates, so every mutation is a fixed sequence
//! (expense, then month, then balance) with counters moved by deltas.
//! Nothing is rolled back; a failure part way through is logged with enough
//! detail to repair and shows up in the consistency report.

use chrono::{DateTime, Utc};

use crate::config::settings::{clamp_page_size, DEFAULT_PAGE_SIZE};
use crate::error::{PassbookError, PassbookResult, ValidationError};
use crate::models::expense::{normalize_description, validate_amount};
use crate::models::{Expense, ExpenseId, Money, MonthLedger, Period};
use crate::storage::{
    decode_cursor, decode_month_cursor, encode_cursor, encode_month_cursor, keys, Storage,
};

/// A month summary together with the running balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthResponse {
    pub month: MonthLedger,
    pub total_balance: Money,
}

/// An expense after a mutation, with the balances it left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseResponse {
    pub expense: Expense,
    pub month_balance: Money,
    pub total_balance: Money,
}

/// Fields to change on an existing expense; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges {
    pub amount: Option<Money>,
    pub description: Option<String>,
}

/// One page of a month's detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthData {
    pub month: MonthLedger,
    /// Newest first
    pub expenses: Vec<Expense>,
    pub total_balance: Money,
    /// Present iff more expenses remain
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthListItem {
    pub period: Period,
    pub monthly_saved: Money,
}

/// One page of the month list, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPage {
    pub months: Vec<MonthListItem>,
    pub next_cursor: Option<String>,
}

/// Service for balance, month and expense operations
pub struct LedgerService<'a> {
    storage: &'a Storage,
    monthly_allowance: Money,
}

impl<'a> LedgerService<'a> {
    /// Create a ledger service granting `monthly_allowance` to new months
    pub fn new(storage: &'a Storage, monthly_allowance: Money) -> Self {
        Self {
            storage,
            monthly_allowance,
        }
    }

    pub fn get_balance(&self) -> PassbookResult<Money> {
        self.storage.balance.get()
    }

    /// Open a month with the configured allowance
    ///
    /// The starting balance is copied from the previous month's ending
    /// balance (zero if that month was never opened) and frozen.
    pub fn create_month(&self, period: &str) -> PassbookResult<MonthResponse> {
        self.create_month_at(period, Utc::now())
    }

    pub fn create_month_at(
        &self,
        period: &str,
        now: DateTime<Utc>,
    ) -> PassbookResult<MonthResponse> {
        let period = Period::parse(period)?;
        if self.storage.months.exists(period)? {
            return Err(PassbookError::month_exists(period.to_string()));
        }

        let starting = self
            .storage
            .months
            .get(period.prev())?
            .map(|prev| prev.ending_balance)
            .unwrap_or_default();

        let month = MonthLedger::open(period, starting, self.monthly_allowance, now)?;
        self.storage.months.insert(&month)?;

        let total_balance = self.after_write(
            "create_month",
            period,
            self.monthly_allowance,
            self.storage.balance.adjust(self.monthly_allowance, now),
        )?;

        tracing::info!("Opened month {} with allowance {}", period, self.monthly_allowance);
        Ok(MonthResponse {
            month,
            total_balance,
        })
    }

    /// Add extra funds to an existing month
    pub fn add_funds(&self, period: &str, amount: Money) -> PassbookResult<MonthResponse> {
        self.add_funds_at(period, amount, Utc::now())
    }

    pub fn add_funds_at(
        &self,
        period: &str,
        amount: Money,
        now: DateTime<Utc>,
    ) -> PassbookResult<MonthResponse> {
        if !amount.is_positive() {
            return Err(ValidationError::FundsNotPositive.into());
        }
        let period = Period::parse(period)?;
        if !self.storage.months.exists(period)? {
            return Err(PassbookError::month_not_found(period.to_string()));
        }

        let month = self.storage.months.add_funds(period, amount, now)?;
        let total_balance = self.after_write(
            "add_funds",
            period,
            amount,
            self.storage.balance.adjust(amount, now),
        )?;

        tracing::info!("Added {} to {}", amount, period);
        Ok(MonthResponse {
            month,
            total_balance,
        })
    }

    /// Record an expense against the current month
    pub fn add_expense(&self, amount: Money, description: &str) -> PassbookResult<ExpenseResponse> {
        self.add_expense_at(amount, description, Utc::now())
    }

    pub fn add_expense_at(
        &self,
        amount: Money,
        description: &str,
        now: DateTime<Utc>,
    ) -> PassbookResult<ExpenseResponse> {
        let amount = validate_amount(amount)?;
        let description = normalize_description(description)?;
        let period = Period::containing(now);

        let month = self.ensure_month(period, now)?;
        if !month.can_cover(amount) {
            return Err(insufficient(period, amount, month.ending_balance));
        }

        let expense = Expense::new(period, amount, description, now);
        self.storage.expenses.put(&expense)?;

        let month = self.after_write(
            "add_expense",
            period,
            amount,
            self.storage.months.apply_expense_delta(period, amount, now),
        )?;
        let total_balance = self.after_write(
            "add_expense",
            period,
            amount,
            self.storage.balance.adjust(-amount, now),
        )?;

        tracing::info!("Recorded expense {} of {} in {}", expense.id, amount, period);
        Ok(ExpenseResponse {
            expense,
            month_balance: month.ending_balance,
            total_balance,
        })
    }

    /// Change an expense's amount and/or description
    pub fn update_expense(
        &self,
        period: &str,
        id: &str,
        changes: ExpenseChanges,
    ) -> PassbookResult<ExpenseResponse> {
        self.update_expense_at(period, id, changes, Utc::now())
    }

    pub fn update_expense_at(
        &self,
        period: &str,
        id: &str,
        changes: ExpenseChanges,
        now: DateTime<Utc>,
    ) -> PassbookResult<ExpenseResponse> {
        if changes.amount.is_none() && changes.description.is_none() {
            return Err(ValidationError::NoChanges.into());
        }
        let new_amount = changes.amount.map(validate_amount).transpose()?;
        let new_description = changes
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;

        let period = Period::parse(period)?;
        let id = ExpenseId::from_raw(id);
        let current = self
            .storage
            .expenses
            .get(period, &id)?
            .ok_or_else(|| PassbookError::expense_not_found(id.to_string()))?;

        let updated = Expense {
            amount: new_amount.unwrap_or(current.amount),
            description: new_description.unwrap_or_else(|| current.description.clone()),
            ..current.clone()
        };
        let delta = updated.amount.try_sub(current.amount)?;

        if delta.is_positive() {
            let month = self
                .storage
                .months
                .get(period)?
                .ok_or_else(|| PassbookError::month_not_found(period.to_string()))?;
            if !month.can_cover(delta) {
                return Err(insufficient(period, delta, month.ending_balance));
            }
        }

        self.storage.expenses.put(&updated)?;

        let (month_balance, total_balance) = if delta.is_zero() {
            (self.month_balance(period)?, self.storage.balance.get()?)
        } else {
            let month = self.after_write(
                "update_expense",
                period,
                delta,
                self.storage.months.apply_expense_delta(period, delta, now),
            )?;
            let total = self.after_write(
                "update_expense",
                period,
                delta,
                self.storage.balance.adjust(-delta, now),
            )?;
            (month.ending_balance, total)
        };

        tracing::info!("Updated expense {} in {} (delta {})", updated.id, period, delta);
        Ok(ExpenseResponse {
            expense: updated,
            month_balance,
            total_balance,
        })
    }

    /// Remove an expense and refund its amount
    pub fn delete_expense(&self, period: &str, id: &str) -> PassbookResult<ExpenseResponse> {
        self.delete_expense_at(period, id, Utc::now())
    }

    pub fn delete_expense_at(
        &self,
        period: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> PassbookResult<ExpenseResponse> {
        let period = Period::parse(period)?;
        let id = ExpenseId::from_raw(id);
        let expense = self
            .storage
            .expenses
            .delete(period, &id)?
            .ok_or_else(|| PassbookError::expense_not_found(id.to_string()))?;

        let month = self.after_write(
            "delete_expense",
            period,
            expense.amount,
            self.storage
                .months
                .apply_expense_delta(period, -expense.amount, now),
        )?;
        let total_balance = self.after_write(
            "delete_expense",
            period,
            expense.amount,
            self.storage.balance.adjust(expense.amount, now),
        )?;

        tracing::info!("Deleted expense {} of {} from {}", expense.id, expense.amount, period);
        Ok(ExpenseResponse {
            expense,
            month_balance: month.ending_balance,
            total_balance,
        })
    }

    /// A month's summary and one page of its expenses, newest first
    ///
    /// A month that was never opened reads as an all-zero summary.
    pub fn get_month_data(
        &self,
        period: &str,
        page_size: Option<usize>,
        cursor: Option<&str>,
    ) -> PassbookResult<MonthData> {
        let period = Period::parse(period)?;
        let limit = clamp_page_size(page_size.unwrap_or(DEFAULT_PAGE_SIZE));

        let start = match cursor.filter(|c| !c.is_empty()) {
            Some(token) => {
                let key = decode_cursor(token)?;
                if key.pk != keys::month_pk(period) || !key.sk.starts_with(keys::EXPENSE_PREFIX) {
                    return Err(ValidationError::InvalidCursor(format!(
                        "cursor does not belong to {}",
                        period
                    ))
                    .into());
                }
                Some(key)
            }
            None => None,
        };

        let month = self
            .storage
            .months
            .get(period)?
            .unwrap_or_else(|| MonthLedger::empty(period));
        let (expenses, last_key) = self.storage.expenses.page(period, limit, start.as_ref())?;
        let next_cursor = last_key.as_ref().map(encode_cursor).transpose()?;

        tracing::debug!("Read {} expenses for {}", expenses.len(), period);
        Ok(MonthData {
            month,
            expenses,
            total_balance: self.storage.balance.get()?,
            next_cursor,
        })
    }

    /// Opened months, newest first
    ///
    /// `cursor` is the `next_cursor` of the previous page and must name a
    /// month that exists.
    pub fn list_months(
        &self,
        page_size: Option<usize>,
        cursor: Option<&str>,
    ) -> PassbookResult<MonthPage> {
        let limit = clamp_page_size(page_size.unwrap_or(DEFAULT_PAGE_SIZE));

        let mut months = self.storage.months.list_all()?;
        months.sort_by(|a, b| b.period.cmp(&a.period));

        let start = match cursor.filter(|c| !c.is_empty()) {
            Some(token) => {
                let after = decode_month_cursor(token)?;
                let index = months
                    .iter()
                    .position(|m| m.period == after)
                    .ok_or_else(|| {
                        ValidationError::InvalidCursor(format!("unknown month {}", after))
                    })?;
                index + 1
            }
            None => 0,
        };
        let end = months.len().min(start + limit);
        let page = &months[start..end];

        let next_cursor = match page.last() {
            Some(last) if end < months.len() => Some(encode_month_cursor(last.period)),
            _ => None,
        };

        let months = page
            .iter()
            .map(|m| -> PassbookResult<MonthListItem> {
                Ok(MonthListItem {
                    period: m.period,
                    monthly_saved: m.monthly_saved()?,
                })
            })
            .collect::<PassbookResult<Vec<_>>>()?;

        Ok(MonthPage { months, next_cursor })
    }

    // Expenses may be added to a month nobody opened. Such a month starts
    // empty and gets no allowance.
    fn ensure_month(&self, period: Period, now: DateTime<Utc>) -> PassbookResult<MonthLedger> {
        if let Some(month) = self.storage.months.get(period)? {
            return Ok(month);
        }
        let month = MonthLedger::open(period, Money::zero(), Money::zero(), now)?;
        self.storage.months.insert(&month)?;
        tracing::info!("Opened month {} implicitly with no allowance", period);
        Ok(month)
    }

    fn month_balance(&self, period: Period) -> PassbookResult<Money> {
        Ok(self
            .storage
            .months
            .get(period)?
            .map(|m| m.ending_balance)
            .unwrap_or_default())
    }

    /// Pass a post-first-write result through, logging a failure as a
    /// partially applied mutation
    fn after_write<T>(
        &self,
        operation: &str,
        period: Period,
        amount: Money,
        result: PassbookResult<T>,
    ) -> PassbookResult<T> {
        result.map_err(|e| {
            tracing::error!(
                operation,
                period = %period,
                amount = %amount,
                "Ledger partially updated, run `passbook check`: {}",
                e
            );
            e
        })
    }
}

fn insufficient(period: Period, needed: Money, available: Money) -> PassbookError {
    PassbookError::InsufficientFunds {
        period: period.to_string(),
        needed,
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::testing::FailingStore;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn cents(n: i64) -> Money {
        Money::from_cents(n)
    }

    fn march(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap()
    }

    fn feb(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, 10, 0, 0).unwrap()
    }

    /// February opened with 100.00 and 57.50 spent; ending 42.50
    fn with_february(storage: &Storage) -> LedgerService<'_> {
        let ledger = LedgerService::new(storage, cents(10000));
        ledger.create_month_at("2026-02", feb(1)).unwrap();
        ledger.add_expense_at(cents(5750), "Books", feb(10)).unwrap();
        ledger
    }

    #[test]
    fn test_create_month_carries_previous_ending() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let before = ledger.get_balance().unwrap();

        let created = ledger.create_month_at("2026-03", march(1)).unwrap();
        assert_eq!(created.month.starting_balance, cents(4250));
        assert_eq!(created.month.allowance_added, cents(10000));
        assert_eq!(created.month.ending_balance, cents(14250));
        assert_eq!(created.total_balance, before + cents(10000));
    }

    #[test]
    fn test_create_month_errors() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);

        let err = ledger.create_month_at("2026-02", feb(2)).unwrap_err();
        assert!(err.is_conflict());
        for bad in ["2026-2", "2026-13", "March"] {
            let err = ledger.create_month_at(bad, feb(2)).unwrap_err();
            assert!(matches!(
                err,
                PassbookError::Validation(ValidationError::InvalidPeriod(_))
            ));
        }
    }

    #[test]
    fn test_first_month_starts_from_zero() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        let created = ledger.create_month_at("2025-12", feb(1)).unwrap();
        assert!(created.month.starting_balance.is_zero());
        assert_eq!(created.total_balance, cents(10000));
    }

    #[test]
    fn test_add_funds() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);

        let response = ledger.add_funds_at("2026-02", cents(1000), feb(12)).unwrap();
        assert_eq!(response.month.allowance_added, cents(11000));
        assert_eq!(response.month.ending_balance, cents(5250));
        assert_eq!(response.total_balance, cents(5250));

        assert!(matches!(
            ledger.add_funds_at("2026-02", Money::zero(), feb(12)),
            Err(PassbookError::Validation(ValidationError::FundsNotPositive))
        ));
        assert!(ledger
            .add_funds_at("2026-04", cents(100), feb(12))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        ledger.create_month_at("2026-03", march(1)).unwrap();
        let balance = ledger.get_balance().unwrap();

        let err = ledger.add_expense_at(cents(20000), "Bike", march(2)).unwrap_err();
        match err {
            PassbookError::InsufficientFunds {
                needed, available, ..
            } => {
                assert_eq!(needed, cents(20000));
                assert_eq!(available, cents(14250));
            }
            other => panic!("unexpected error {:?}", other),
        }

        let data = ledger.get_month_data("2026-03", None, None).unwrap();
        assert!(data.expenses.is_empty());
        assert_eq!(data.month.ending_balance, cents(14250));
        assert_eq!(ledger.get_balance().unwrap(), balance);
    }

    #[test]
    fn test_add_expense_validation() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);

        assert!(matches!(
            ledger.add_expense_at(Money::zero(), "x", feb(3)),
            Err(PassbookError::Validation(ValidationError::InvalidAmount))
        ));
        assert!(matches!(
            ledger.add_expense_at(cents(100), &"x".repeat(101), feb(3)),
            Err(PassbookError::Validation(ValidationError::DescriptionTooLong { .. }))
        ));

        let added = ledger.add_expense_at(cents(100), "  ", feb(3)).unwrap();
        assert_eq!(added.expense.description, "Expense");
    }

    #[test]
    fn test_expense_in_unopened_month_needs_funds() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));

        let err = ledger.add_expense_at(cents(100), "Snack", march(5)).unwrap_err();
        assert!(matches!(err, PassbookError::InsufficientFunds { .. }));

        // The month now exists, empty and without allowance
        let month = storage.months.get(Period::parse("2026-03").unwrap()).unwrap().unwrap();
        assert!(month.allowance_added.is_zero());
        assert!(month.ending_balance.is_zero());
        assert!(ledger.create_month_at("2026-03", march(5)).unwrap_err().is_conflict());
    }

    #[test]
    fn test_add_then_delete_restores_balances() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let balance = ledger.get_balance().unwrap();
        let february = Period::parse("2026-02").unwrap();
        let ending = storage.months.get(february).unwrap().unwrap().ending_balance;

        let added = ledger.add_expense_at(cents(1250), "Lunch", feb(20)).unwrap();
        assert_eq!(added.month_balance, ending - cents(1250));
        assert_eq!(added.total_balance, balance - cents(1250));

        let deleted = ledger
            .delete_expense_at("2026-02", added.expense.id.as_str(), feb(21))
            .unwrap();
        assert_eq!(deleted.expense, added.expense);
        assert_eq!(deleted.month_balance, ending);
        assert_eq!(deleted.total_balance, balance);

        assert!(ledger
            .delete_expense_at("2026-02", added.expense.id.as_str(), feb(21))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_description_only_update_keeps_numbers() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let added = ledger.add_expense_at(cents(1000), "Lunch", feb(20)).unwrap();

        let changes = ExpenseChanges {
            description: Some("Team lunch".into()),
            ..Default::default()
        };
        let updated = ledger
            .update_expense_at("2026-02", added.expense.id.as_str(), changes, feb(21))
            .unwrap();

        assert_eq!(updated.expense.description, "Team lunch");
        assert_eq!(updated.expense.amount, cents(1000));
        assert_eq!(updated.expense.created_at, added.expense.created_at);
        assert_eq!(updated.month_balance, added.month_balance);
        assert_eq!(updated.total_balance, added.total_balance);
    }

    #[test]
    fn test_amount_update_moves_counters_by_delta() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let added = ledger.add_expense_at(cents(1000), "Lunch", feb(20)).unwrap();
        let id = added.expense.id.as_str();

        let up = ExpenseChanges {
            amount: Some(cents(1500)),
            ..Default::default()
        };
        let updated = ledger.update_expense_at("2026-02", id, up, feb(21)).unwrap();
        assert_eq!(updated.month_balance, added.month_balance - cents(500));
        assert_eq!(updated.total_balance, added.total_balance - cents(500));

        let down = ExpenseChanges {
            amount: Some(cents(200)),
            ..Default::default()
        };
        let updated = ledger.update_expense_at("2026-02", id, down, feb(21)).unwrap();
        assert_eq!(updated.month_balance, added.month_balance + cents(800));

        let month = storage.months.get(Period::parse("2026-02").unwrap()).unwrap().unwrap();
        assert_eq!(month.total_expenses, cents(5750 + 200));
        assert_eq!(month.ending_balance, month.expected_ending().unwrap());
    }

    #[test]
    fn test_update_errors() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let added = ledger.add_expense_at(cents(1000), "Lunch", feb(20)).unwrap();
        let id = added.expense.id.as_str();

        assert!(matches!(
            ledger.update_expense_at("2026-02", id, ExpenseChanges::default(), feb(21)),
            Err(PassbookError::Validation(ValidationError::NoChanges))
        ));

        let too_much = ExpenseChanges {
            amount: Some(cents(1000) + added.month_balance + cents(1)),
            ..Default::default()
        };
        assert!(matches!(
            ledger.update_expense_at("2026-02", id, too_much, feb(21)),
            Err(PassbookError::InsufficientFunds { .. })
        ));

        let change = ExpenseChanges {
            amount: Some(cents(1)),
            ..Default::default()
        };
        assert!(ledger
            .update_expense_at("2026-02", "00000000000000000000#missing0", change, feb(21))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_validates_fields() {
        let storage = Storage::in_memory();
        let ledger = with_february(&storage);
        let added = ledger.add_expense_at(cents(1000), "Lunch", feb(20)).unwrap();
        let id = added.expense.id.as_str();

        for amount in [Money::zero(), cents(-250)] {
            let changes = ExpenseChanges {
                amount: Some(amount),
                ..Default::default()
            };
            assert!(matches!(
                ledger.update_expense_at("2026-02", id, changes, feb(21)),
                Err(PassbookError::Validation(ValidationError::InvalidAmount))
            ));
        }

        let long = ExpenseChanges {
            description: Some("x".repeat(101)),
            ..Default::default()
        };
        assert!(matches!(
            ledger.update_expense_at("2026-02", id, long, feb(21)),
            Err(PassbookError::Validation(ValidationError::DescriptionTooLong { .. }))
        ));

        // Nothing above touched the record
        let stored = storage
            .expenses
            .get(added.expense.period, &added.expense.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, added.expense);

        let blank = ExpenseChanges {
            description: Some("   ".into()),
            ..Default::default()
        };
        let updated = ledger.update_expense_at("2026-02", id, blank, feb(21)).unwrap();
        assert_eq!(updated.expense.description, "Expense");
        assert_eq!(updated.expense.amount, cents(1000));
    }

    #[test]
    fn test_amount_increase_needs_month_summary() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        let period = Period::parse("2026-05").unwrap();
        let expense = Expense::new(period, cents(300), "Stamps".into(), march(2));
        storage.expenses.put(&expense).unwrap();

        let changes = ExpenseChanges {
            amount: Some(cents(400)),
            ..Default::default()
        };
        let err = ledger
            .update_expense_at("2026-05", expense.id.as_str(), changes, march(3))
            .unwrap_err();
        assert!(matches!(
            err,
            PassbookError::NotFound {
                entity_type: "Month",
                ..
            }
        ));
        let stored = storage.expenses.get(period, &expense.id).unwrap().unwrap();
        assert_eq!(stored.amount, cents(300));
    }

    #[test]
    fn test_carry_over_overflow_is_rejected() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        ledger.create_month_at("2026-02", feb(1)).unwrap();
        ledger
            .add_funds_at("2026-02", cents(i64::MAX - 15000), feb(2))
            .unwrap();

        assert!(matches!(
            ledger.create_month_at("2026-03", march(1)),
            Err(PassbookError::Validation(ValidationError::AmountOutOfRange))
        ));
        assert!(storage
            .months
            .get(Period::parse("2026-03").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_month_data_pages_newest_first() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        ledger.create_month_at("2026-03", march(1)).unwrap();
        let ids: Vec<_> = (1..=5)
            .map(|day| {
                ledger
                    .add_expense_at(cents(100), "Snack", march(day))
                    .unwrap()
                    .expense
                    .id
            })
            .collect();

        let first = ledger.get_month_data("2026-03", Some(2), None).unwrap();
        let first_ids: Vec<_> = first.expenses.iter().map(|e| e.id.clone()).collect();
        assert_eq!(first_ids, vec![ids[4].clone(), ids[3].clone()]);
        assert_eq!(first.total_balance, cents(9500));

        let second = ledger
            .get_month_data("2026-03", Some(2), first.next_cursor.as_deref())
            .unwrap();
        let third = ledger
            .get_month_data("2026-03", Some(2), second.next_cursor.as_deref())
            .unwrap();
        assert_eq!(third.expenses.len(), 1);
        assert_eq!(third.expenses[0].id, ids[0]);
        assert!(third.next_cursor.is_none());

        let exact = ledger.get_month_data("2026-03", Some(5), None).unwrap();
        assert!(exact.next_cursor.is_none());
    }

    #[test]
    fn test_month_data_cursor_errors() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        ledger.create_month_at("2026-03", march(1)).unwrap();
        for day in 1..=3 {
            ledger.add_expense_at(cents(100), "Snack", march(day)).unwrap();
        }
        let page = ledger.get_month_data("2026-03", Some(1), None).unwrap();
        let cursor = page.next_cursor.unwrap();

        for bad in ["not-a-cursor!", "e30"] {
            assert!(matches!(
                ledger.get_month_data("2026-03", None, Some(bad)),
                Err(PassbookError::Validation(ValidationError::InvalidCursor(_)))
            ));
        }
        assert!(matches!(
            ledger.get_month_data("2026-02", None, Some(&cursor)),
            Err(PassbookError::Validation(ValidationError::InvalidCursor(_)))
        ));
    }

    #[test]
    fn test_unopened_month_reads_as_zero() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        let data = ledger.get_month_data("2024-07", None, None).unwrap();
        assert_eq!(data.month, MonthLedger::empty(Period::parse("2024-07").unwrap()));
        assert!(data.expenses.is_empty());
        assert!(data.next_cursor.is_none());
    }

    #[test]
    fn test_list_months_descending_with_cursor() {
        let storage = Storage::in_memory();
        let ledger = LedgerService::new(&storage, cents(10000));
        for period in ["2025-11", "2026-01", "2025-12", "2026-02"] {
            ledger.create_month_at(period, march(1)).unwrap();
        }
        ledger.add_expense_at(cents(2500), "Gift", feb(14)).unwrap();

        let first = ledger.list_months(Some(3), None).unwrap();
        let periods: Vec<_> = first.months.iter().map(|m| m.period.to_string()).collect();
        assert_eq!(periods, vec!["2026-02", "2026-01", "2025-12"]);
        assert_eq!(first.months[0].monthly_saved, cents(7500));

        let cursor = first.next_cursor.unwrap();
        assert_eq!(cursor, encode_month_cursor(Period::parse("2025-12").unwrap()));

        let second = ledger.list_months(Some(3), Some(&cursor)).unwrap();
        assert_eq!(second.months.len(), 1);
        assert_eq!(second.months[0].period.to_string(), "2025-11");
        assert!(second.next_cursor.is_none());

        let exact = ledger.list_months(Some(4), None).unwrap();
        assert!(exact.next_cursor.is_none());

        let unknown = encode_month_cursor(Period::parse("2020-01").unwrap());
        assert!(matches!(
            ledger.list_months(None, Some(&unknown)),
            Err(PassbookError::Validation(ValidationError::InvalidCursor(_)))
        ));
    }

    #[test]
    fn test_partial_failure_leaves_record_and_reports_error() {
        let store = FailingStore::failing_after_updates(MemoryStore::new(), 0);
        let storage = Storage::new(Arc::new(store));
        let period = Period::parse("2026-03").unwrap();
        let opened = MonthLedger::open(period, Money::zero(), cents(10000), march(1));
        storage.months.insert(&opened.unwrap()).unwrap();
        let ledger = LedgerService::new(&storage, cents(10000));

        let err = ledger.add_expense_at(cents(500), "Pens", march(3)).unwrap_err();
        assert!(matches!(err, PassbookError::Storage(_)));

        // The expense record was written; the month counters were not
        let data = ledger.get_month_data("2026-03", None, None).unwrap();
        assert_eq!(data.expenses.len(), 1);
        assert!(data.month.total_expenses.is_zero());
    }
}
