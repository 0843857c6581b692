//! Local cache storage for bookmark snapshots.
//!
//! The [`CacheStore`] trait defines the persistence operations the
//! reconciliation engine needs for its offline fallback, enabling pluggable
//! backends (SQLite in production, in-memory for tests).
//!
//! Snapshots are namespaced per user via [`CacheKey`] so two people sharing
//! a device never see each other's bookmarks.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

#[allow(dead_code)]
pub mod memory;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::BookmarkSet;

/// Version prefix for snapshot keys. Bumping it orphans old snapshots
/// instead of misreading them after a format change.
const KEY_PREFIX: &str = "bookmarks_v1";

/// A validated snapshot key: `bookmarks_v1:{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct the snapshot key for a user after validating the id.
    ///
    /// # Examples
    /// ```
    /// use newsclip::cache::CacheKey;
    ///
    /// let key = CacheKey::for_user("user-123").expect("valid id");
    /// assert_eq!(key.as_str(), "bookmarks_v1:user-123");
    /// ```
    pub fn for_user(user_id: &str) -> Result<Self, CacheKeyError> {
        if user_id.trim().is_empty() {
            return Err(CacheKeyError::EmptyUserId);
        }
        if user_id.chars().any(char::is_whitespace) {
            return Err(CacheKeyError::WhitespaceInUserId);
        }
        Ok(Self(format!("{KEY_PREFIX}:{user_id}")))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyError {
    #[error("user id must not be empty")]
    EmptyUserId,
    #[error("user id must not contain whitespace")]
    WhitespaceInUserId,
}

/// Errors surfaced by cache store backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// I/O or SQL failure in the backing store.
    #[error("cache backend failed: {message}")]
    Backend { message: String },
    /// A snapshot exists but does not deserialize. Readers treat this the
    /// same as a missing snapshot.
    #[error("cache snapshot is corrupt: {message}")]
    Corrupt { message: String },
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Abstract snapshot storage.
///
/// Writes replace the previous snapshot for the key; there is no TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the snapshot for `key`, `None` when absent.
    async fn read(&self, key: &CacheKey) -> Result<Option<BookmarkSet>, CacheError>;

    /// Write (upsert) the snapshot for `key`.
    async fn write(&self, key: &CacheKey, set: &BookmarkSet) -> Result<(), CacheError>;

    /// Delete the snapshot for `key`; deleting a missing key is not an error.
    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_includes_user_id() {
        let key = CacheKey::for_user("alice").unwrap();
        assert_eq!(key.as_str(), "bookmarks_v1:alice");
        assert_ne!(key, CacheKey::for_user("bob").unwrap());
    }

    #[test]
    fn cache_key_rejects_bad_user_ids() {
        assert_eq!(CacheKey::for_user(""), Err(CacheKeyError::EmptyUserId));
        assert_eq!(CacheKey::for_user("   "), Err(CacheKeyError::EmptyUserId));
        assert_eq!(
            CacheKey::for_user("a b"),
            Err(CacheKeyError::WhitespaceInUserId)
        );
    }
}
