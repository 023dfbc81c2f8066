//! Session records

use std::sync::Arc;

use crate::error::PassbookResult;
use crate::models::{Session, SessionToken};

use super::keys;
use super::store::{from_unix, Item, ItemExt, Store, TTL_ATTR};

const TOKEN: &str = "token";
const CREATED_AT: &str = "created_at";

/// Repository for bearer sessions
///
/// Expiry is stored as the item's `ttl`, so the store can purge sessions on
/// its own. Readers still check it: purging lags.
pub struct SessionRepository {
    store: Arc<dyn Store>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn get(&self, token: &SessionToken) -> PassbookResult<Option<Session>> {
        let Some(item) = self.store.get(&keys::session(token))? else {
            return Ok(None);
        };
        Ok(Some(Session {
            token: SessionToken::from_raw(item.str_attr(TOKEN)?),
            created_at: item.time_attr(CREATED_AT)?,
            expires_at: from_unix(TTL_ATTR, item.num_attr(TTL_ATTR)?)?,
        }))
    }

    pub fn put(&self, session: &Session) -> PassbookResult<()> {
        let mut item = Item::new();
        item.insert(TOKEN.into(), session.token.as_str().into());
        item.insert(CREATED_AT.into(), session.created_at.into());
        item.insert(TTL_ATTR.into(), session.expires_at.timestamp().into());
        self.store.put(&keys::session(&session.token), item)
    }

    /// Remove a session; returns whether one existed
    pub fn delete(&self, token: &SessionToken) -> PassbookResult<bool> {
        Ok(self.store.delete(&keys::session(token))?.is_some())
    }
}
