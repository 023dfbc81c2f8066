//! In-process store
//!
//! A `BTreeMap` of partitions behind an `RwLock`. Sort keys within a
//! partition are kept ordered, which is what prefix queries page over.
//! Expired items are only removed by [`Store::purge_expired`], so readers
//! must still check expiry themselves.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::{PassbookError, PassbookResult};

use super::store::{Item, ItemExt, Key, QueryPage, Record, Store, Update};

type Table = BTreeMap<String, BTreeMap<String, Item>>;

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with records
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut table = Table::new();
        for record in records {
            table
                .entry(record.key.pk)
                .or_default()
                .insert(record.key.sk, record.item);
        }
        Self {
            table: RwLock::new(table),
        }
    }

    /// Snapshot of every record, in key order
    pub fn records(&self) -> PassbookResult<Vec<Record>> {
        let table = self.read()?;
        Ok(table
            .iter()
            .flat_map(|(pk, partition)| {
                partition.iter().map(move |(sk, item)| Record {
                    key: Key::new(pk.clone(), sk.clone()),
                    item: item.clone(),
                })
            })
            .collect())
    }

    /// Number of stored items
    pub fn len(&self) -> PassbookResult<usize> {
        Ok(self.read()?.values().map(BTreeMap::len).sum())
    }

    pub fn is_empty(&self) -> PassbookResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> PassbookResult<RwLockReadGuard<'_, Table>> {
        self.table
            .read()
            .map_err(|e| PassbookError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> PassbookResult<RwLockWriteGuard<'_, Table>> {
        self.table
            .write()
            .map_err(|e| PassbookError::Storage(format!("Failed to acquire write lock: {}", e)))
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &Key) -> PassbookResult<Option<Item>> {
        let table = self.read()?;
        Ok(table
            .get(&key.pk)
            .and_then(|partition| partition.get(&key.sk))
            .cloned())
    }

    fn put(&self, key: &Key, item: Item) -> PassbookResult<()> {
        let mut table = self.write()?;
        table
            .entry(key.pk.clone())
            .or_default()
            .insert(key.sk.clone(), item);
        Ok(())
    }

    fn delete(&self, key: &Key) -> PassbookResult<Option<Item>> {
        let mut table = self.write()?;
        let Some(partition) = table.get_mut(&key.pk) else {
            return Ok(None);
        };
        let removed = partition.remove(&key.sk);
        if partition.is_empty() {
            table.remove(&key.pk);
        }
        Ok(removed)
    }

    fn update(&self, key: &Key, update: &Update) -> PassbookResult<Item> {
        let mut table = self.write()?;
        let partition = table.entry(key.pk.clone()).or_default();

        // Work on a copy so a failed update leaves the item untouched
        let mut item = partition.get(&key.sk).cloned().unwrap_or_default();
        update.apply(&mut item)?;
        partition.insert(key.sk.clone(), item.clone());
        Ok(item)
    }

    fn query(
        &self,
        pk: &str,
        sk_prefix: &str,
        limit: usize,
        exclusive_start: Option<&Key>,
        reverse: bool,
    ) -> PassbookResult<QueryPage> {
        if let Some(start) = exclusive_start {
            if start.pk != pk {
                return Err(PassbookError::Storage(format!(
                    "Start key {} is outside partition {}",
                    start, pk
                )));
            }
        }

        let table = self.read()?;
        let Some(partition) = table.get(pk) else {
            return Ok(QueryPage::default());
        };

        let ordered: Box<dyn Iterator<Item = (&String, &Item)>> = if reverse {
            Box::new(partition.iter().rev())
        } else {
            Box::new(partition.iter())
        };

        let after_start = |sk: &String| match exclusive_start {
            None => true,
            Some(start) if reverse => sk.as_str() < start.sk.as_str(),
            Some(start) => sk.as_str() > start.sk.as_str(),
        };

        let mut records = Vec::new();
        let mut more = false;
        for (sk, item) in ordered.filter(|(sk, _)| sk.starts_with(sk_prefix) && after_start(sk)) {
            if limit > 0 && records.len() == limit {
                more = true;
                break;
            }
            records.push(Record {
                key: Key::new(pk, sk.clone()),
                item: item.clone(),
            });
        }

        let last_evaluated_key = if more {
            records.last().map(|r| r.key.clone())
        } else {
            None
        };

        Ok(QueryPage {
            records,
            last_evaluated_key,
        })
    }

    fn scan(&self, filter: &dyn Fn(&Key, &Item) -> bool) -> PassbookResult<Vec<Record>> {
        let table = self.read()?;
        let mut out = Vec::new();
        for (pk, partition) in table.iter() {
            for (sk, item) in partition {
                let key = Key::new(pk.clone(), sk.clone());
                if filter(&key, item) {
                    out.push(Record {
                        key,
                        item: item.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> PassbookResult<usize> {
        let mut table = self.write()?;
        let mut purged = 0;
        for partition in table.values_mut() {
            let before = partition.len();
            partition.retain(|_, item| !item.is_expired_at(now));
            purged += before - partition.len();
        }
        table.retain(|_, partition| !partition.is_empty());
        Ok(purged)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::{AttrValue, TTL_ATTR};

    fn item(n: i64) -> Item {
        let mut item = Item::new();
        item.insert("n".into(), AttrValue::N(n));
        item
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store.put(&Key::new("P", format!("EXP#{}", i)), item(i)).unwrap();
        }
        store.put(&Key::new("P", "SUMMARY"), item(0)).unwrap();
        store.put(&Key::new("Q", "EXP#9"), item(9)).unwrap();
        store
    }

    fn numbers(page: &QueryPage) -> Vec<i64> {
        page.records.iter().map(|r| r.item.num_attr("n").unwrap()).collect()
    }

    #[test]
    fn test_get_put_delete() {
        let store = MemoryStore::new();
        let key = Key::new("A", "B");
        assert!(store.get(&key).unwrap().is_none());

        store.put(&key, item(1)).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(item(1)));

        assert_eq!(store.delete(&key).unwrap(), Some(item(1)));
        assert!(store.delete(&key).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_increment_creates_missing_item() {
        let store = MemoryStore::new();
        let key = Key::new("BALANCE", "BALANCE");
        store.increment(&key, "total", 500).unwrap();
        let after = store.increment(&key, "total", -200).unwrap();
        assert_eq!(after.num_attr("total").unwrap(), 300);
    }

    #[test]
    fn test_failed_update_leaves_item_untouched() {
        let store = MemoryStore::new();
        let key = Key::new("A", "B");
        let mut original = item(1);
        original.insert("label".into(), "x".into());
        store.put(&key, original.clone()).unwrap();

        let result = store.update(&key, &Update::new().add("n", 1).add("label", 1));
        assert!(result.is_err());
        assert_eq!(store.get(&key).unwrap(), Some(original));
    }

    #[test]
    fn test_query_prefix_reverse_paging() {
        let store = seeded();

        let first = store.query("P", "EXP#", 2, None, true).unwrap();
        assert_eq!(numbers(&first), vec![5, 4]);
        let cursor = first.last_evaluated_key.clone().unwrap();

        let second = store.query("P", "EXP#", 2, Some(&cursor), true).unwrap();
        assert_eq!(numbers(&second), vec![3, 2]);

        let third = store
            .query("P", "EXP#", 2, second.last_evaluated_key.as_ref(), true)
            .unwrap();
        assert_eq!(numbers(&third), vec![1]);
        assert!(third.last_evaluated_key.is_none());
    }

    #[test]
    fn test_exact_page_has_no_continuation() {
        let store = seeded();
        let page = store.query("P", "EXP#", 5, None, false).unwrap();
        assert_eq!(numbers(&page), vec![1, 2, 3, 4, 5]);
        assert!(page.last_evaluated_key.is_none());
    }

    #[test]
    fn test_query_rejects_foreign_start_key() {
        let store = seeded();
        let foreign = Key::new("Q", "EXP#9");
        assert!(store.query("P", "EXP#", 2, Some(&foreign), true).is_err());
    }

    #[test]
    fn test_scan_and_purge() {
        let store = seeded();
        let now = Utc::now();
        let mut expiring = item(7);
        expiring.insert(TTL_ATTR.into(), AttrValue::N(now.timestamp() - 1));
        store.put(&Key::new("S", "S"), expiring).unwrap();

        let summaries = store.scan(&|key, _| key.sk == "SUMMARY").unwrap();
        assert_eq!(summaries.len(), 1);

        assert_eq!(store.purge_expired(now).unwrap(), 1);
        assert!(store.get(&Key::new("S", "S")).unwrap().is_none());
        assert_eq!(store.len().unwrap(), 7);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = MemoryStore::new();
        let key = Key::new("BALANCE", "BALANCE");
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        store.increment(&key, "total", 1).unwrap();
                    }
                });
            }
        });
        assert_eq!(store.get(&key).unwrap().unwrap().num_attr("total").unwrap(), 800);
    }
}
