//! Key-value store interface
//!
//! The ledger and the access-control layer only ever talk to storage through
//! [`Store`]: a composite-key (partition + sort key) item store with
//! single-item atomic updates, prefix range queries and per-item expiry.
//! There is deliberately no multi-item transaction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PassbookError, PassbookResult};

/// Attribute holding an item's expiry as unix seconds
pub const TTL_ATTR: &str = "ttl";

/// Composite primary key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Partition key
    pub pk: String,
    /// Sort key, ordered lexicographically within a partition
    pub sk: String,
}

impl Key {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

/// A stored attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    S(String),
    N(i64),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        Self::N(n)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(at: DateTime<Utc>) -> Self {
        Self::S(at.to_rfc3339())
    }
}

/// An item's attributes (the key is held separately)
pub type Item = BTreeMap<String, AttrValue>;

/// A key together with its item, as returned by queries and scans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: Key,
    pub item: Item,
}

/// One page of a range query
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub records: Vec<Record>,
    /// Key to resume after; only present when more records remain
    pub last_evaluated_key: Option<Key>,
}

/// A single-item atomic modification
///
/// `add` treats a missing item or attribute as zero; `set` overwrites.
#[derive(Debug, Clone, Default)]
pub struct Update {
    adds: Vec<(String, i64)>,
    sets: Vec<(String, AttrValue)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, field: impl Into<String>, delta: i64) -> Self {
        self.adds.push((field.into(), delta));
        self
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.sets.push((field.into(), value.into()));
        self
    }

    /// Apply to an item in place
    pub fn apply(&self, item: &mut Item) -> PassbookResult<()> {
        for (field, delta) in &self.adds {
            let current = match item.get(field) {
                None => 0,
                Some(AttrValue::N(n)) => *n,
                Some(AttrValue::S(_)) => {
                    return Err(PassbookError::Storage(format!(
                        "Cannot add to non-numeric attribute '{}'",
                        field
                    )))
                }
            };
            let next = current.checked_add(*delta).ok_or_else(|| {
                PassbookError::Storage(format!("Numeric overflow on attribute '{}'", field))
            })?;
            item.insert(field.clone(), AttrValue::N(next));
        }
        for (field, value) in &self.sets {
            item.insert(field.clone(), value.clone());
        }
        Ok(())
    }
}

/// The capability set the core requires of a backing store
pub trait Store: Send + Sync {
    /// Point read
    fn get(&self, key: &Key) -> PassbookResult<Option<Item>>;

    /// Full overwrite
    fn put(&self, key: &Key, item: Item) -> PassbookResult<()>;

    /// Remove an item, returning what was removed
    fn delete(&self, key: &Key) -> PassbookResult<Option<Item>>;

    /// Atomically apply `update`, creating the item if needed; returns the new item
    fn update(&self, key: &Key, update: &Update) -> PassbookResult<Item>;

    /// Atomically add `delta` to one numeric attribute
    fn increment(&self, key: &Key, field: &str, delta: i64) -> PassbookResult<Item> {
        self.update(key, &Update::new().add(field, delta))
    }

    /// Range query within one partition by sort-key prefix
    ///
    /// Results are in sort-key order (descending when `reverse`), start
    /// strictly after `exclusive_start`, and hold at most `limit` records
    /// (`0` means no limit).
    fn query(
        &self,
        pk: &str,
        sk_prefix: &str,
        limit: usize,
        exclusive_start: Option<&Key>,
        reverse: bool,
    ) -> PassbookResult<QueryPage>;

    /// Every record matching `filter`, in no guaranteed order
    fn scan(&self, filter: &dyn Fn(&Key, &Item) -> bool) -> PassbookResult<Vec<Record>>;

    /// Physically remove items whose `ttl` is at or before `now`
    fn purge_expired(&self, now: DateTime<Utc>) -> PassbookResult<usize>;
}

/// Typed attribute access for items read back from a store
pub trait ItemExt {
    fn str_attr(&self, field: &str) -> PassbookResult<&str>;
    fn num_attr(&self, field: &str) -> PassbookResult<i64>;
    fn opt_num_attr(&self, field: &str) -> PassbookResult<Option<i64>>;
    fn time_attr(&self, field: &str) -> PassbookResult<DateTime<Utc>>;
    fn opt_time_attr(&self, field: &str) -> PassbookResult<Option<DateTime<Utc>>>;

    /// Whether the item's `ttl` has passed at `now`
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool;
}

impl ItemExt for Item {
    fn str_attr(&self, field: &str) -> PassbookResult<&str> {
        match self.get(field) {
            Some(AttrValue::S(s)) => Ok(s.as_str()),
            Some(AttrValue::N(_)) => Err(PassbookError::Storage(format!(
                "Attribute '{}' is not a string",
                field
            ))),
            None => Err(PassbookError::Storage(format!("Missing attribute '{}'", field))),
        }
    }

    fn num_attr(&self, field: &str) -> PassbookResult<i64> {
        self.opt_num_attr(field)?
            .ok_or_else(|| PassbookError::Storage(format!("Missing attribute '{}'", field)))
    }

    fn opt_num_attr(&self, field: &str) -> PassbookResult<Option<i64>> {
        match self.get(field) {
            Some(AttrValue::N(n)) => Ok(Some(*n)),
            Some(AttrValue::S(_)) => Err(PassbookError::Storage(format!(
                "Attribute '{}' is not a number",
                field
            ))),
            None => Ok(None),
        }
    }

    fn time_attr(&self, field: &str) -> PassbookResult<DateTime<Utc>> {
        parse_time(field, self.str_attr(field)?)
    }

    fn opt_time_attr(&self, field: &str) -> PassbookResult<Option<DateTime<Utc>>> {
        match self.get(field) {
            Some(AttrValue::S(s)) => parse_time(field, s).map(Some),
            Some(AttrValue::N(_)) => Err(PassbookError::Storage(format!(
                "Attribute '{}' is not a timestamp",
                field
            ))),
            None => Ok(None),
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.get(TTL_ATTR), Some(AttrValue::N(ttl)) if *ttl <= now.timestamp())
    }
}

fn parse_time(field: &str, raw: &str) -> PassbookResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            PassbookError::Storage(format!("Attribute '{}' is not RFC 3339: {}", field, e))
        })
}

/// Convert unix seconds read from an item into a timestamp
pub fn from_unix(field: &str, secs: i64) -> PassbookResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| PassbookError::Storage(format!("Attribute '{}' is out of range", field)))
}
