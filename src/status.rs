//! The status command and the CLI's sync-outcome bookkeeping.
//!
//! The engine's sync status lives in memory and dies with the process, so
//! each command records its last reconciliation outcome in the `settings`
//! table. `ncl status` reports that alongside the session and the cached
//! snapshot's age. The engine itself never reads these rows back.

use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::cache::sqlite::SqliteCacheStore;
use crate::cache::CacheKey;
use crate::config::Config;
use crate::db;
use crate::models::SyncStatus;
use crate::session::{self, Session};

const LAST_SYNC_STATUS_KEY: &str = "last_sync_status";
const LAST_SYNC_AT_KEY: &str = "last_sync_at";

/// Record the outcome of a reconciliation for later `ncl status` reports.
pub async fn record_sync_status(pool: &SqlitePool, sync_status: SyncStatus) -> Result<()> {
    set_setting(pool, LAST_SYNC_STATUS_KEY, sync_status.as_str()).await?;
    set_setting(pool, LAST_SYNC_AT_KEY, &Utc::now().to_rfc3339()).await?;
    Ok(())
}

async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(value,)| value))
}

async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Run the status command: session, last recorded sync, snapshot presence.
pub async fn run_status(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let session = session::load(&pool).await?;

    println!("Newsclip status");
    println!("===============");
    println!();
    println!("  Database:     {}", config.db.path.display());

    match &session {
        Session::Anonymous => println!("  Session:      signed out"),
        Session::Authenticated(profile) => {
            match &profile.username {
                Some(username) => println!("  Session:      {} ({})", profile.user_id, username),
                None => println!("  Session:      {}", profile.user_id),
            }
            if !profile.preferences.is_empty() {
                println!("  Preferences:  {}", profile.preferences.join(", "));
            }
        }
    }

    let last_status = get_setting(&pool, LAST_SYNC_STATUS_KEY)
        .await?
        .and_then(|raw| SyncStatus::from_str(&raw).ok())
        .unwrap_or(SyncStatus::Uninitialized);
    match get_setting(&pool, LAST_SYNC_AT_KEY).await? {
        Some(at) => println!("  Last sync:    {} (at {})", last_status, at),
        None => println!("  Last sync:    {}", last_status),
    }

    if let Session::Authenticated(profile) = &session {
        if let Ok(key) = CacheKey::for_user(&profile.user_id) {
            let cache = SqliteCacheStore::new(pool.clone());
            match cache.saved_at(&key).await {
                Ok(Some(saved_at)) => println!("  Snapshot:     saved {}", saved_at),
                Ok(None) => println!("  Snapshot:     none"),
                Err(e) => println!("  Snapshot:     unreadable ({e})"),
            }
        }
    }

    pool.close().await;
    Ok(())
}
