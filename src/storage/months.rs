//! Month summary records

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::PassbookResult;
use crate::models::{Money, MonthLedger, Period};

use super::keys;
use super::store::{Item, ItemExt, Store, Update};

const MONTH: &str = "month";
const STARTING: &str = "starting_balance";
const ALLOWANCE: &str = "allowance_added";
const EXPENSES: &str = "total_expenses";
const ENDING: &str = "ending_balance";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Repository for per-month summaries
pub struct MonthRepository {
    store: Arc<dyn Store>,
}

impl MonthRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get(&self, period: Period) -> PassbookResult<Option<MonthLedger>> {
        self.store
            .get(&keys::month_summary(period))?
            .map(|item| from_item(period, &item))
            .transpose()
    }

    pub fn exists(&self, period: Period) -> PassbookResult<bool> {
        Ok(self.store.get(&keys::month_summary(period))?.is_some())
    }

    /// Write a full summary, replacing any existing one
    pub fn insert(&self, month: &MonthLedger) -> PassbookResult<()> {
        self.store.put(&keys::month_summary(month.period), to_item(month))
    }

    /// Add funds to allowance and ending in one atomic update
    pub fn add_funds(
        &self,
        period: Period,
        amount: Money,
        now: DateTime<Utc>,
    ) -> PassbookResult<MonthLedger> {
        let update = Update::new()
            .add(ALLOWANCE, amount.cents())
            .add(ENDING, amount.cents())
            .set(UPDATED_AT, now);
        let item = self.store.update(&keys::month_summary(period), &update)?;
        from_item(period, &item)
    }

    /// Move `delta` of spending onto the month: total += delta, ending -= delta
    pub fn apply_expense_delta(
        &self,
        period: Period,
        delta: Money,
        now: DateTime<Utc>,
    ) -> PassbookResult<MonthLedger> {
        let update = Update::new()
            .add(EXPENSES, delta.cents())
            .add(ENDING, -delta.cents())
            .set(UPDATED_AT, now);
        let item = self.store.update(&keys::month_summary(period), &update)?;
        from_item(period, &item)
    }

    /// Every month summary, in no particular order
    pub fn list_all(&self) -> PassbookResult<Vec<MonthLedger>> {
        let records = self.store.scan(&|key, _| {
            key.sk == keys::SUMMARY && key.pk.starts_with(keys::MONTH_PREFIX)
        })?;

        let mut months = Vec::with_capacity(records.len());
        for record in records {
            // Foreign partitions that merely share the prefix are skipped
            if let Some(period) = keys::period_from_pk(&record.key.pk) {
                months.push(from_item(period, &record.item)?);
            }
        }
        Ok(months)
    }
}

fn to_item(month: &MonthLedger) -> Item {
    let mut item = Item::new();
    item.insert(MONTH.into(), month.period.to_string().into());
    item.insert(STARTING.into(), month.starting_balance.cents().into());
    item.insert(ALLOWANCE.into(), month.allowance_added.cents().into());
    item.insert(EXPENSES.into(), month.total_expenses.cents().into());
    item.insert(ENDING.into(), month.ending_balance.cents().into());
    if let Some(at) = month.created_at {
        item.insert(CREATED_AT.into(), at.into());
    }
    if let Some(at) = month.updated_at {
        item.insert(UPDATED_AT.into(), at.into());
    }
    item
}

// Counter updates may create a summary from nothing, so every numeric
// field defaults to zero.
fn from_item(period: Period, item: &Item) -> PassbookResult<MonthLedger> {
    let money = |field: &str| -> PassbookResult<Money> {
        Ok(Money::from_cents(item.opt_num_attr(field)?.unwrap_or(0)))
    };
    Ok(MonthLedger {
        period,
        starting_balance: money(STARTING)?,
        allowance_added: money(ALLOWANCE)?,
        total_expenses: money(EXPENSES)?,
        ending_balance: money(ENDING)?,
        created_at: item.opt_time_attr(CREATED_AT)?,
        updated_at: item.opt_time_attr(UPDATED_AT)?,
    })
}
