//! In-memory [`CacheStore`] implementation for tests.
//!
//! Uses a `HashMap` of raw JSON snapshots behind `std::sync::RwLock`, plus
//! switches for injecting backend failures and corrupt snapshots so callers
//! can exercise the engine's degraded paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::BookmarkSet;

use super::{CacheError, CacheKey, CacheStore};

/// In-memory snapshot store with failure injection.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a raw snapshot string verbatim, bypassing serialization.
    /// Lets tests plant corrupt snapshots.
    pub fn insert_raw(&self, key: &CacheKey, raw: &str) {
        self.entries
            .write()
            .unwrap()
            .insert(key.as_str().to_string(), raw.to_string());
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().unwrap().contains_key(key.as_str())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn read(&self, key: &CacheKey) -> Result<Option<BookmarkSet>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::backend("injected read failure"));
        }
        let entries = self.entries.read().unwrap();
        match entries.get(key.as_str()) {
            None => Ok(None),
            Some(snapshot) => serde_json::from_str(snapshot)
                .map(Some)
                .map_err(|e| CacheError::corrupt(e.to_string())),
        }
    }

    async fn write(&self, key: &CacheKey, set: &BookmarkSet) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::backend("injected write failure"));
        }
        let snapshot =
            serde_json::to_string(set).map_err(|e| CacheError::backend(e.to_string()))?;
        self.entries
            .write()
            .unwrap()
            .insert(key.as_str().to_string(), snapshot);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.write().unwrap().remove(key.as_str());
        Ok(())
    }
}
