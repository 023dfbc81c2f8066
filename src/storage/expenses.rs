//! Expense records

use std::sync::Arc;

use crate::error::{PassbookError, PassbookResult};
use crate::models::{Expense, ExpenseId, Money, Period};

use super::keys;
use super::store::{Item, ItemExt, Key, Record, Store};

const ID: &str = "id";
const AMOUNT: &str = "amount";
const DESCRIPTION: &str = "description";
const CREATED_AT: &str = "created_at";

/// Repository for expenses, stored in their month's partition
pub struct ExpenseRepository {
    store: Arc<dyn Store>,
}

impl ExpenseRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get(&self, period: Period, id: &ExpenseId) -> PassbookResult<Option<Expense>> {
        let key = keys::expense(period, id);
        self.store
            .get(&key)?
            .map(|item| from_item(period, &key, &item))
            .transpose()
    }

    /// Create or overwrite an expense
    pub fn put(&self, expense: &Expense) -> PassbookResult<()> {
        self.store
            .put(&keys::expense(expense.period, &expense.id), to_item(expense))
    }

    /// Remove an expense, returning what was stored
    pub fn delete(&self, period: Period, id: &ExpenseId) -> PassbookResult<Option<Expense>> {
        let key = keys::expense(period, id);
        self.store
            .delete(&key)?
            .map(|item| from_item(period, &key, &item))
            .transpose()
    }

    /// One page of a month's expenses, newest first
    ///
    /// Returns the continuation key when more expenses remain.
    pub fn page(
        &self,
        period: Period,
        limit: usize,
        start_after: Option<&Key>,
    ) -> PassbookResult<(Vec<Expense>, Option<Key>)> {
        let page = self.store.query(
            &keys::month_pk(period),
            keys::EXPENSE_PREFIX,
            limit,
            start_after,
            true,
        )?;
        let expenses = page
            .records
            .iter()
            .map(|r| from_record(period, r))
            .collect::<PassbookResult<Vec<_>>>()?;
        Ok((expenses, page.last_evaluated_key))
    }

    /// All of a month's expenses, oldest first
    pub fn list_all(&self, period: Period) -> PassbookResult<Vec<Expense>> {
        let page = self
            .store
            .query(&keys::month_pk(period), keys::EXPENSE_PREFIX, 0, None, false)?;
        page.records
            .iter()
            .map(|r| from_record(period, r))
            .collect()
    }
}

fn to_item(expense: &Expense) -> Item {
    let mut item = Item::new();
    item.insert(ID.into(), expense.id.as_str().into());
    item.insert(AMOUNT.into(), expense.amount.cents().into());
    item.insert(DESCRIPTION.into(), expense.description.clone().into());
    item.insert(CREATED_AT.into(), expense.created_at.into());
    item
}

fn from_record(period: Period, record: &Record) -> PassbookResult<Expense> {
    from_item(period, &record.key, &record.item)
}

fn from_item(period: Period, key: &Key, item: &Item) -> PassbookResult<Expense> {
    let id = keys::expense_id_from_sk(&key.sk)
        .ok_or_else(|| PassbookError::Storage(format!("Not an expense key: {}", key)))?;
    Ok(Expense {
        id,
        period,
        amount: Money::from_cents(item.num_attr(AMOUNT)?),
        description: item.str_attr(DESCRIPTION)?.to_string(),
        created_at: item.time_attr(CREATED_AT)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn seeded(count: i64) -> (ExpenseRepository, Period, Vec<Expense>) {
        let repo = ExpenseRepository::new(Arc::new(MemoryStore::new()));
        let period = Period::parse("2026-03").unwrap();
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let expenses: Vec<_> = (0..count)
            .map(|i| {
                let e = Expense::new(
                    period,
                    Money::from_cents(100 * (i + 1)),
                    format!("item {}", i),
                    base + Duration::minutes(i),
                );
                repo.put(&e).unwrap();
                e
            })
            .collect();
        (repo, period, expenses)
    }

    #[test]
    fn test_round_trip_and_delete() {
        let (repo, period, expenses) = seeded(1);
        let stored = repo.get(period, &expenses[0].id).unwrap().unwrap();
        assert_eq!(stored, expenses[0]);

        assert_eq!(repo.delete(period, &stored.id).unwrap(), Some(stored.clone()));
        assert!(repo.delete(period, &stored.id).unwrap().is_none());
    }

    #[test]
    fn test_page_is_newest_first() {
        let (repo, period, expenses) = seeded(3);

        let (first, next) = repo.page(period, 2, None).unwrap();
        assert_eq!(first[0].id, expenses[2].id);
        assert_eq!(first[1].id, expenses[1].id);

        let (second, next) = repo.page(period, 2, next.as_ref()).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, expenses[0].id);
        assert!(next.is_none());
    }
}
