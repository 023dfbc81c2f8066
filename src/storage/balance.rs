//! Global balance record

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::PassbookResult;
use crate::models::Money;

use super::keys;
use super::store::{ItemExt, Store, Update};

const TOTAL: &str = "total_balance";
const UPDATED_AT: &str = "updated_at";

/// Repository for the single running balance
///
/// The balance only ever moves by signed deltas; there is no setter.
pub struct BalanceRepository {
    store: Arc<dyn Store>,
}

impl BalanceRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Current total; zero before the first adjustment
    pub fn get(&self) -> PassbookResult<Money> {
        let cents = match self.store.get(&keys::balance())? {
            Some(item) => item.opt_num_attr(TOTAL)?.unwrap_or(0),
            None => 0,
        };
        Ok(Money::from_cents(cents))
    }

    /// Atomically add `delta`, returning the new total
    pub fn adjust(&self, delta: Money, now: DateTime<Utc>) -> PassbookResult<Money> {
        let item = self.store.update(
            &keys::balance(),
            &Update::new().add(TOTAL, delta.cents()).set(UPDATED_AT, now),
        )?;
        Ok(Money::from_cents(item.num_attr(TOTAL)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_balance_starts_at_zero_and_moves_by_delta() {
        let repo = BalanceRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.get().unwrap(), Money::zero());

        let now = Utc::now();
        assert_eq!(repo.adjust(Money::from_cents(10000), now).unwrap().cents(), 10000);
        assert_eq!(repo.adjust(Money::from_cents(-4250), now).unwrap().cents(), 5750);
        assert_eq!(repo.get().unwrap().cents(), 5750);
    }
}
