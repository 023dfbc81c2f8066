//! Failed-attempt counter record

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::PassbookResult;
use crate::models::RateLimitEntry;

use super::keys;
use super::store::{from_unix, Item, ItemExt, Store, Update, TTL_ATTR};

const ATTEMPTS: &str = "attempts";
const LOCKED_AT: &str = "locked_at";
const UPDATED_AT: &str = "updated_at";

/// Repository for the single rate-limit counter
pub struct RateLimitRepository {
    store: Arc<dyn Store>,
}

impl RateLimitRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The stored counter, expired or not
    pub fn get(&self) -> PassbookResult<Option<RateLimitEntry>> {
        self.store
            .get(&keys::rate_limit())?
            .map(|item| from_item(&item))
            .transpose()
    }

    /// Count one failure and push the window out to `now + window`
    pub fn record_failure(
        &self,
        now: DateTime<Utc>,
        window: Duration,
    ) -> PassbookResult<RateLimitEntry> {
        let update = Update::new()
            .add(ATTEMPTS, 1)
            .set(TTL_ATTR, (now + window).timestamp())
            .set(UPDATED_AT, now);
        let item = self.store.update(&keys::rate_limit(), &update)?;
        from_item(&item)
    }

    /// Lock until `until`; the counter expires together with the lock
    pub fn lock(&self, until: DateTime<Utc>, now: DateTime<Utc>) -> PassbookResult<RateLimitEntry> {
        let update = Update::new()
            .set(LOCKED_AT, until.timestamp())
            .set(TTL_ATTR, until.timestamp())
            .set(UPDATED_AT, now);
        let item = self.store.update(&keys::rate_limit(), &update)?;
        from_item(&item)
    }

    pub fn clear(&self) -> PassbookResult<()> {
        self.store.delete(&keys::rate_limit())?;
        Ok(())
    }
}

fn from_item(item: &Item) -> PassbookResult<RateLimitEntry> {
    let attempts = item.opt_num_attr(ATTEMPTS)?.unwrap_or(0);
    let locked_until = match item.opt_num_attr(LOCKED_AT)? {
        Some(secs) => Some(from_unix(LOCKED_AT, secs)?),
        None => None,
    };
    Ok(RateLimitEntry {
        attempts: u32::try_from(attempts.max(0)).unwrap_or(u32::MAX),
        locked_until,
        expires_at: from_unix(TTL_ATTR, item.num_attr(TTL_ATTR)?)?,
        updated_at: item.opt_time_attr(UPDATED_AT)?,
    })
}
