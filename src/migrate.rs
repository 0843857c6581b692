use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Per-user cached bookmark snapshots, one row per cache key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookmark_cache (
            cache_key TEXT PRIMARY KEY,
            snapshot TEXT NOT NULL,
            saved_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // The signed-in user, at most one row
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            user_id TEXT NOT NULL,
            username TEXT,
            email TEXT,
            preferences TEXT NOT NULL DEFAULT '[]',
            auth_token TEXT,
            signed_in_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // CLI bookkeeping (last sync status and the like)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
