//! PIN credential record

use std::sync::Arc;

use crate::error::PassbookResult;
use crate::models::Credential;

use super::keys;
use super::store::{Item, ItemExt, Store};

const PIN_HASH: &str = "pin_hash";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Repository for the single PIN credential
pub struct CredentialRepository {
    store: Arc<dyn Store>,
}

impl CredentialRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The stored credential; a record with an empty hash counts as absent
    pub fn get(&self) -> PassbookResult<Option<Credential>> {
        let Some(item) = self.store.get(&keys::credential())? else {
            return Ok(None);
        };
        let encoded = item.str_attr(PIN_HASH)?;
        if encoded.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credential {
            pin_hash: encoded.parse()?,
            created_at: item.time_attr(CREATED_AT)?,
            updated_at: item.time_attr(UPDATED_AT)?,
        }))
    }

    pub fn put(&self, credential: &Credential) -> PassbookResult<()> {
        let mut item = Item::new();
        item.insert(PIN_HASH.into(), credential.pin_hash.to_string().into());
        item.insert(CREATED_AT.into(), credential.created_at.into());
        item.insert(UPDATED_AT.into(), credential.updated_at.into());
        self.store.put(&keys::credential(), item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PinHash, PinHashParams};
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn cheap() -> PinHashParams {
        PinHashParams {
            memory_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_credential_round_trip() {
        let repo = CredentialRepository::new(Arc::new(MemoryStore::new()));
        assert!(repo.get().unwrap().is_none());

        let hash = PinHash::create(b"1234", cheap()).unwrap();
        let credential = Credential::new(hash, Utc::now());
        repo.put(&credential).unwrap();

        let stored = repo.get().unwrap().unwrap();
        assert_eq!(stored.created_at, credential.created_at);
        assert!(stored.pin_hash.verify(b"1234").unwrap());
    }

    #[test]
    fn test_empty_hash_counts_as_absent() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut item = Item::new();
        item.insert(PIN_HASH.into(), "".into());
        store.put(&keys::credential(), item).unwrap();

        assert!(CredentialRepository::new(store).get().unwrap().is_none());
    }
}
