//! Storage layer for Passbook
//!
//! A composite-key item store ([`Store`]) with in-memory and JSON-file
//! implementations, plus one typed repository per record kind. The
//! repositories own the key layout; nothing above them builds keys except
//! the pagination cursor check.

pub mod balance;
pub mod credentials;
pub mod cursor;
pub mod expenses;
pub mod file_io;
pub mod json_file;
pub mod keys;
pub mod memory;
pub mod months;
pub mod rate_limits;
pub mod sessions;
pub mod store;

pub use balance::BalanceRepository;
pub use credentials::CredentialRepository;
pub use cursor::{decode_cursor, decode_month_cursor, encode_cursor, encode_month_cursor};
pub use expenses::ExpenseRepository;
pub use file_io::{load_json_or_default, save_json_atomic};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use months::MonthRepository;
pub use rate_limits::RateLimitRepository;
pub use sessions::SessionRepository;
pub use store::{AttrValue, Item, ItemExt, Key, QueryPage, Record, Store, Update};

use std::sync::Arc;

use crate::config::paths::PassbookPaths;
use crate::error::PassbookResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    store: Arc<dyn Store>,
    pub balance: BalanceRepository,
    pub months: MonthRepository,
    pub expenses: ExpenseRepository,
    pub credentials: CredentialRepository,
    pub sessions: SessionRepository,
    pub rate_limits: RateLimitRepository,
}

impl Storage {
    /// Wrap an existing store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            balance: BalanceRepository::new(store.clone()),
            months: MonthRepository::new(store.clone()),
            expenses: ExpenseRepository::new(store.clone()),
            credentials: CredentialRepository::new(store.clone()),
            sessions: SessionRepository::new(store.clone()),
            rate_limits: RateLimitRepository::new(store.clone()),
            store,
        }
    }

    /// A fresh, empty in-process store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Open the file-backed store under the data directory
    pub fn open(paths: &PassbookPaths) -> PassbookResult<Self> {
        paths.ensure_directories()?;
        let store = JsonFileStore::open(paths.store_file())?;
        Ok(Self::new(Arc::new(store)))
    }

    /// The underlying store
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
