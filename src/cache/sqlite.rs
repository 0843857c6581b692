//! SQLite-backed [`CacheStore`] over the `bookmark_cache` table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::BookmarkSet;

use super::{CacheError, CacheKey, CacheStore};

/// Snapshot store sharing the state database's connection pool.
pub struct SqliteCacheStore {
    pool: SqlitePool,
}

impl SqliteCacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// RFC 3339 timestamp of the snapshot for `key`, `None` when absent.
    pub async fn saved_at(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT saved_at FROM bookmark_cache WHERE cache_key = ?")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(row.map(|(saved_at,)| saved_at))
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn read(&self, key: &CacheKey) -> Result<Option<BookmarkSet>, CacheError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT snapshot FROM bookmark_cache WHERE cache_key = ?")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CacheError::backend(e.to_string()))?;

        match row {
            None => Ok(None),
            Some((snapshot,)) => serde_json::from_str(&snapshot)
                .map(Some)
                .map_err(|e| CacheError::corrupt(e.to_string())),
        }
    }

    async fn write(&self, key: &CacheKey, set: &BookmarkSet) -> Result<(), CacheError> {
        let snapshot =
            serde_json::to_string(set).map_err(|e| CacheError::backend(e.to_string()))?;

        sqlx::query(
            "INSERT INTO bookmark_cache (cache_key, snapshot, saved_at) VALUES (?, ?, ?)
             ON CONFLICT(cache_key) DO UPDATE SET
               snapshot = excluded.snapshot,
               saved_at = excluded.saved_at",
        )
        .bind(key.as_str())
        .bind(snapshot)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::backend(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM bookmark_cache WHERE cache_key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::backend(e.to_string()))?;
        Ok(())
    }
}
