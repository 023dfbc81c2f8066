//! File-backed store
//!
//! The table is a single JSON document next to a `.lock` file. Every
//! operation takes an advisory lock on that file and reloads the document,
//! so separate handles and separate processes see each other's writes.
//! Mutations hold the lock exclusively across read, modify and write.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PassbookError, PassbookResult};

use super::file_io::{load_json_or_default, save_json_atomic};
use super::memory::MemoryStore;
use super::store::{Item, Key, QueryPage, Record, Store, Update};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: Vec<Record>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            records: Vec::new(),
        }
    }
}

/// Held advisory lock; released on drop
struct FileLock(File);

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.0) {
            tracing::warn!("Failed to release store lock: {}", e);
        }
    }
}

/// Store persisted to a JSON file
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    /// Open (or start) the store at `path`, dropping anything already expired
    pub fn open(path: impl Into<PathBuf>) -> PassbookResult<Self> {
        let path = path.into();
        let store = Self {
            lock_path: path.with_extension("lock"),
            path,
        };

        let purged = store.mutate(|table| table.purge_expired(Utc::now()))?;
        if purged > 0 {
            debug!(purged, "Dropped expired items on open");
        }
        Ok(store)
    }

    fn lock(&self, exclusive: bool) -> PassbookResult<FileLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                PassbookError::Storage(format!(
                    "Failed to open lock file {}: {}",
                    self.lock_path.display(),
                    e
                ))
            })?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| PassbookError::Storage(format!("Failed to lock store: {}", e)))?;
        Ok(FileLock(file))
    }

    fn load(&self) -> PassbookResult<MemoryStore> {
        let file: StoreFile = load_json_or_default(&self.path)?;
        if file.version != FORMAT_VERSION {
            return Err(PassbookError::Storage(format!(
                "Unsupported store format version {} in {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(MemoryStore::from_records(file.records))
    }

    fn persist(&self, table: &MemoryStore) -> PassbookResult<()> {
        let file = StoreFile {
            version: FORMAT_VERSION,
            records: table.records()?,
        };
        save_json_atomic(&self.path, &file)
    }

    fn read<T>(&self, op: impl FnOnce(&MemoryStore) -> PassbookResult<T>) -> PassbookResult<T> {
        let _lock = self.lock(false)?;
        op(&self.load()?)
    }

    // A failed op leaves the file untouched.
    fn mutate<T>(&self, op: impl FnOnce(&MemoryStore) -> PassbookResult<T>) -> PassbookResult<T> {
        let _lock = self.lock(true)?;
        let table = self.load()?;
        let out = op(&table)?;
        table.purge_expired(Utc::now())?;
        self.persist(&table)?;
        Ok(out)
    }
}

impl Store for JsonFileStore {
    fn get(&self, key: &Key) -> PassbookResult<Option<Item>> {
        self.read(|table| table.get(key))
    }

    fn put(&self, key: &Key, item: Item) -> PassbookResult<()> {
        self.mutate(|table| table.put(key, item))
    }

    fn delete(&self, key: &Key) -> PassbookResult<Option<Item>> {
        self.mutate(|table| table.delete(key))
    }

    fn update(&self, key: &Key, update: &Update) -> PassbookResult<Item> {
        self.mutate(|table| table.update(key, update))
    }

    fn query(
        &self,
        pk: &str,
        sk_prefix: &str,
        limit: usize,
        exclusive_start: Option<&Key>,
        reverse: bool,
    ) -> PassbookResult<QueryPage> {
        self.read(|table| table.query(pk, sk_prefix, limit, exclusive_start, reverse))
    }

    fn scan(&self, filter: &dyn Fn(&Key, &Item) -> bool) -> PassbookResult<Vec<Record>> {
        self.read(|table| table.scan(filter))
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> PassbookResult<usize> {
        self.mutate(|table| table.purge_expired(now))
    }
}
