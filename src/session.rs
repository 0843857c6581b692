//! Session context: who is signed in, persisted across CLI invocations.
//!
//! A session holds an identity that was verified somewhere else (the
//! identity provider's job, not ours); this crate never inspects or decodes
//! credentials. The optional token is carried opaquely for the HTTP client
//! to forward.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use crate::cache::sqlite::SqliteCacheStore;
use crate::cache::CacheKey;
use crate::config::Config;
use crate::db;
use crate::engine::ReconciliationEngine;
use crate::models::SyncStatus;
use crate::remote::HttpBookmarkService;
use crate::status;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Preferred headline categories, informational.
    pub preferences: Vec<String>,
    /// Opaque credential forwarded to the remote service, never decoded.
    pub auth_token: Option<String>,
}

/// Authentication state the engine observes but does not own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(UserProfile),
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(profile) => Some(&profile.user_id),
        }
    }
}

/// Load the persisted session. A missing row means Anonymous; a row that
/// fails to decode is cleared and also treated as Anonymous.
pub async fn load(pool: &SqlitePool) -> Result<Session> {
    let row: Option<(String, Option<String>, Option<String>, String, Option<String>)> =
        sqlx::query_as(
            "SELECT user_id, username, email, preferences, auth_token FROM session WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;

    let Some((user_id, username, email, preferences, auth_token)) = row else {
        return Ok(Session::Anonymous);
    };

    if user_id.trim().is_empty() {
        warn!("clearing session row with an empty user id");
        clear(pool).await?;
        return Ok(Session::Anonymous);
    }

    let preferences: Vec<String> = match serde_json::from_str(&preferences) {
        Ok(preferences) => preferences,
        Err(e) => {
            warn!("clearing undecodable session row: {e}");
            clear(pool).await?;
            return Ok(Session::Anonymous);
        }
    };

    Ok(Session::Authenticated(UserProfile {
        user_id,
        username,
        email,
        preferences,
        auth_token,
    }))
}

/// Persist `profile` as the signed-in user, replacing any previous session.
pub async fn store(pool: &SqlitePool, profile: &UserProfile) -> Result<()> {
    let preferences = serde_json::to_string(&profile.preferences)?;

    sqlx::query(
        "INSERT INTO session (id, user_id, username, email, preferences, auth_token, signed_in_at)
         VALUES (1, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           user_id = excluded.user_id,
           username = excluded.username,
           email = excluded.email,
           preferences = excluded.preferences,
           auth_token = excluded.auth_token,
           signed_in_at = excluded.signed_in_at",
    )
    .bind(&profile.user_id)
    .bind(&profile.username)
    .bind(&profile.email)
    .bind(preferences)
    .bind(&profile.auth_token)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM session WHERE id = 1")
        .execute(pool)
        .await?;
    Ok(())
}

/// `ncl session sign-in`: persist the profile, then reconcile once.
///
/// A degraded reload is still a successful sign-in; the user just sees
/// cached bookmarks until the service is reachable again.
pub async fn run_sign_in(config: &Config, profile: UserProfile) -> Result<()> {
    CacheKey::for_user(&profile.user_id).context("Invalid user id")?;

    let pool = db::connect(config).await?;
    store(&pool, &profile).await?;

    let service = HttpBookmarkService::new(&config.remote, profile.auth_token.clone())?;
    let cache = SqliteCacheStore::new(pool.clone());
    let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));

    let session = Session::Authenticated(profile.clone());
    let sync_status = engine.reload(&session).await;
    status::record_sync_status(&pool, sync_status).await?;

    match sync_status {
        SyncStatus::Synced => println!(
            "Signed in as {} ({} bookmarks synced).",
            profile.user_id,
            engine.bookmarks().len()
        ),
        SyncStatus::Degraded => println!(
            "Signed in as {}. Sync failed; {} cached bookmarks available.",
            profile.user_id,
            engine.bookmarks().len()
        ),
        SyncStatus::Uninitialized => println!("Signed in as {}.", profile.user_id),
    }

    pool.close().await;
    Ok(())
}

/// `ncl session sign-out`: forget the session; the cached snapshot is
/// purged only when the configuration says so.
pub async fn run_sign_out(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let Session::Authenticated(profile) = load(&pool).await? else {
        println!("Not signed in.");
        pool.close().await;
        return Ok(());
    };

    clear(&pool).await?;

    let service = HttpBookmarkService::new(&config.remote, None)?;
    let cache = SqliteCacheStore::new(pool.clone());
    let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));
    engine
        .handle_sign_out(&profile.user_id, config.sync.purge_cache_on_signout)
        .await;

    status::record_sync_status(&pool, SyncStatus::Uninitialized).await?;

    if config.sync.purge_cache_on_signout {
        println!("Signed out {}; cached bookmarks purged.", profile.user_id);
    } else {
        println!("Signed out {}.", profile.user_id);
    }

    pool.close().await;
    Ok(())
}
