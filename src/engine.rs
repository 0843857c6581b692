//! The bookmark reconciliation engine.
//!
//! Mediates between the remote bookmark service (source of truth) and the
//! local cache store (offline fallback), and owns the in-memory bookmark
//! set the presentation layer renders.
//!
//! Two policies shape everything here:
//!
//! - **Reload never fails.** A successful fetch replaces the set wholesale
//!   and refreshes the cache; a failed fetch falls back to the cached
//!   snapshot and flags [`SyncStatus::Degraded`]. Cache problems are logged
//!   and swallowed.
//! - **Toggle is pessimistic.** The mutation must round-trip through the
//!   remote service before anything changes locally, and a successful
//!   mutation is followed by a full reload instead of a local patch. One
//!   extra round trip buys convergence with the server's canonical order.
//!
//! Both operations take `&mut self`, so a single engine instance cannot
//! interleave mutations; no locks are involved.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::models::{Article, BookmarkSet, SyncStatus};
use crate::remote::{BookmarkAction, BookmarkService, MutateAck, ServiceError};
use crate::session::Session;

/// Errors the engine lets callers see. Transport and cache details stay
/// behind the boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mutation was attempted without a signed-in user, or the service
    /// rejected the identity. Recoverable by signing in.
    #[error("sign in to manage bookmarks")]
    AuthRequired,
    /// The remote service did not accept the mutation; the in-memory set
    /// is unchanged.
    #[error("bookmark sync failed")]
    SyncFailed {
        #[source]
        source: ServiceError,
    },
}

/// What a [`ReconciliationEngine::toggle`] call did: the action sent to the
/// service plus the membership state after the follow-up reload, which a
/// concurrent mutation may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub action: BookmarkAction,
    pub is_bookmarked: bool,
}

/// Owns the in-memory bookmark set and the consistency policy around it.
pub struct ReconciliationEngine {
    service: Arc<dyn BookmarkService>,
    cache: Arc<dyn CacheStore>,
    bookmarks: BookmarkSet,
    last_sync_status: SyncStatus,
}

impl ReconciliationEngine {
    /// A fresh engine: empty set, [`SyncStatus::Uninitialized`].
    pub fn new(service: Arc<dyn BookmarkService>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            service,
            cache,
            bookmarks: BookmarkSet::default(),
            last_sync_status: SyncStatus::Uninitialized,
        }
    }

    /// The current set, in server order.
    pub fn bookmarks(&self) -> &[Article] {
        self.bookmarks.articles()
    }

    pub fn last_sync_status(&self) -> SyncStatus {
        self.last_sync_status
    }

    /// O(1) membership check by url.
    pub fn is_bookmarked(&self, url: &str) -> bool {
        self.bookmarks.contains(url)
    }

    /// Reconcile the in-memory set against the server of record.
    ///
    /// Never fails: a remote failure falls back to the cached snapshot (or
    /// leaves the current set in place when no usable snapshot exists) and
    /// reports [`SyncStatus::Degraded`]. Reloading while signed out is a
    /// no-op that leaves current state untouched.
    pub async fn reload(&mut self, session: &Session) -> SyncStatus {
        let Some(user_id) = session.user_id() else {
            debug!("reload requested while signed out; ignoring");
            return self.last_sync_status;
        };

        match self.service.list(user_id).await {
            Ok(articles) => {
                self.bookmarks = BookmarkSet::from_articles(articles);
                if let Some(key) = Self::cache_key(user_id) {
                    // Best effort: the fetched set is authoritative whether
                    // or not the snapshot lands.
                    if let Err(e) = self.cache.write(&key, &self.bookmarks).await {
                        warn!("failed to write bookmark snapshot: {e}");
                    }
                }
                self.last_sync_status = SyncStatus::Synced;
                info!(user_id, count = self.bookmarks.len(), "bookmarks synced");
            }
            Err(e) => {
                warn!("bookmark sync failed: {e}; falling back to cached snapshot");
                if let Some(snapshot) = self.read_snapshot(user_id).await {
                    self.bookmarks = snapshot;
                }
                self.last_sync_status = SyncStatus::Degraded;
            }
        }

        self.last_sync_status
    }

    /// Add or remove `article` from the user's bookmarks, deciding which
    /// from current membership.
    ///
    /// Requires an authenticated session. The remote call happens first; on
    /// success the engine reloads so the set converges with the server, on
    /// failure nothing changes locally. An add that finds the bookmark
    /// already present server-side counts as success.
    pub async fn toggle(
        &mut self,
        session: &Session,
        article: &Article,
    ) -> Result<ToggleOutcome, EngineError> {
        let Some(user_id) = session.user_id() else {
            return Err(EngineError::AuthRequired);
        };

        let action = if self.is_bookmarked(&article.url) {
            BookmarkAction::Remove
        } else {
            BookmarkAction::Add
        };

        let ack = self
            .service
            .mutate(user_id, action, article)
            .await
            .map_err(|e| match e {
                ServiceError::Auth { .. } => EngineError::AuthRequired,
                other => EngineError::SyncFailed { source: other },
            })?;

        if ack == MutateAck::AlreadyBookmarked {
            debug!(url = %article.url, "add raced an existing bookmark; counting as success");
        }

        self.reload(session).await;

        Ok(ToggleOutcome {
            action,
            is_bookmarked: self.is_bookmarked(&article.url),
        })
    }

    /// Forget the signed-out user's in-memory state. The cached snapshot
    /// stays on disk unless `purge_cache` is set; purge failures are logged
    /// and swallowed like any other cache trouble.
    pub async fn handle_sign_out(&mut self, user_id: &str, purge_cache: bool) {
        self.bookmarks = BookmarkSet::default();
        self.last_sync_status = SyncStatus::Uninitialized;

        if !purge_cache {
            return;
        }
        if let Some(key) = Self::cache_key(user_id) {
            if let Err(e) = self.cache.remove(&key).await {
                warn!("failed to purge bookmark snapshot: {e}");
            }
        }
    }

    fn cache_key(user_id: &str) -> Option<CacheKey> {
        match CacheKey::for_user(user_id) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("cannot build a snapshot key for this user: {e}");
                None
            }
        }
    }

    /// Read the user's snapshot, flattening every failure to `None`: a
    /// corrupt snapshot is a miss, and a backend error just means there is
    /// nothing usable to fall back to.
    async fn read_snapshot(&self, user_id: &str) -> Option<BookmarkSet> {
        let key = Self::cache_key(user_id)?;
        match self.cache.read(&key).await {
            Ok(snapshot) => snapshot,
            Err(CacheError::Corrupt { message }) => {
                warn!("ignoring corrupt bookmark snapshot: {message}");
                None
            }
            Err(e) => {
                warn!("bookmark snapshot read failed: {e}");
                None
            }
        }
    }
}
