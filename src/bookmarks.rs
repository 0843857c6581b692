//! The bookmarks commands: list the reconciled set, toggle one by url.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::cache::sqlite::SqliteCacheStore;
use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::config::Config;
use crate::db;
use crate::engine::ReconciliationEngine;
use crate::models::{Article, SyncStatus};
use crate::remote::{BookmarkAction, HttpBookmarkService};
use crate::session::{self, Session};
use crate::status;

/// Article fields for `ncl bookmarks toggle`. Only the url is required;
/// the rest describe the article when the toggle turns out to be an add.
pub struct ToggleArgs {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

/// Run the list command. Online, reconcile first and report degradation;
/// with `offline` set, print the cached snapshot without touching the
/// network.
pub async fn run_list(config: &Config, offline: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let Session::Authenticated(profile) = session::load(&pool).await? else {
        bail!("Not signed in. Run 'ncl session sign-in' first.");
    };

    if offline {
        let cache = SqliteCacheStore::new(pool.clone());
        let key = CacheKey::for_user(&profile.user_id).context("Invalid user id in session")?;
        match cache.read(&key).await {
            Ok(Some(set)) if set.is_empty() => {
                println!("The cached snapshot is empty (no bookmarks at last sync).")
            }
            Ok(Some(set)) => print_bookmarks(set.articles()),
            Ok(None) => println!("No cached bookmarks for {}.", profile.user_id),
            Err(CacheError::Corrupt { .. }) => {
                println!("The cached snapshot is corrupt; sync once to replace it.")
            }
            Err(e) => return Err(e.into()),
        }
        pool.close().await;
        return Ok(());
    }

    let service = HttpBookmarkService::new(&config.remote, profile.auth_token.clone())?;
    let cache = SqliteCacheStore::new(pool.clone());
    let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));

    let session = Session::Authenticated(profile);
    let sync_status = engine.reload(&session).await;
    status::record_sync_status(&pool, sync_status).await?;

    if engine.bookmarks().is_empty() {
        match sync_status {
            SyncStatus::Degraded => {
                println!("No bookmarks available (sync failed and nothing is cached).")
            }
            _ => println!("No bookmarks yet."),
        }
    } else {
        print_bookmarks(engine.bookmarks());
        if sync_status == SyncStatus::Degraded {
            println!("Note: the bookmark service is unreachable; showing cached bookmarks.");
        }
    }

    pool.close().await;
    Ok(())
}

/// Run the toggle command: reconcile, decide add or remove from current
/// membership, push the mutation, reconcile again.
pub async fn run_toggle(config: &Config, args: ToggleArgs) -> Result<()> {
    let pool = db::connect(config).await?;
    let Session::Authenticated(profile) = session::load(&pool).await? else {
        bail!("Sign in to manage bookmarks.");
    };

    let service = HttpBookmarkService::new(&config.remote, profile.auth_token.clone())?;
    let cache = SqliteCacheStore::new(pool.clone());
    let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));

    let session = Session::Authenticated(profile);
    let sync_status = engine.reload(&session).await;
    status::record_sync_status(&pool, sync_status).await?;

    // The engine decides add vs remove from membership; we only need the
    // descriptive fields when it will be an add.
    let adding = !engine.is_bookmarked(&args.url);
    if adding && args.title.as_deref().unwrap_or("").trim().is_empty() {
        bail!("Bookmarking a new article requires --title.");
    }

    let published_at = match &args.published_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --published-at '{raw}' (expected RFC 3339)"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let article = Article {
        title: args.title.unwrap_or_default(),
        description: args.description.unwrap_or_default(),
        url: args.url,
        image_url: args.image_url,
        source_name: args.source.unwrap_or_default(),
        published_at,
        author: args.author,
    };

    let outcome = engine
        .toggle(&session, &article)
        .await
        .context("Failed to update bookmark")?;
    status::record_sync_status(&pool, engine.last_sync_status()).await?;

    match outcome.action {
        BookmarkAction::Add => println!("Added to bookmarks: {}", article.url),
        BookmarkAction::Remove => println!("Removed from bookmarks: {}", article.url),
    }

    // The follow-up reload is the source of truth; call out the rare case
    // where a concurrent change made it disagree with the action.
    let expected = outcome.action == BookmarkAction::Add;
    if outcome.is_bookmarked != expected {
        println!(
            "Note: a concurrent change altered this bookmark; it is currently {}.",
            if outcome.is_bookmarked {
                "saved"
            } else {
                "not saved"
            }
        );
    }

    pool.close().await;
    Ok(())
}

fn print_bookmarks(articles: &[Article]) {
    println!("Bookmarks ({}):", articles.len());
    println!();
    for (i, article) in articles.iter().enumerate() {
        println!(
            "{:>2}. {} / {}",
            i + 1,
            article.source_name,
            article.title
        );
        println!("     published: {}", article.published_at.format("%Y-%m-%d"));
        println!("     url: {}", article.url);
        println!();
    }
}
