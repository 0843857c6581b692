//! Category-filtered headline browsing.
//!
//! Talks to the configured news endpoint (`GET {base_url}/news?category=`)
//! and normalizes the response into [`Article`]s. The endpoint itself is an
//! upstream pass-through to a third-party headlines API; this module is
//! only its client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::cache::sqlite::SqliteCacheStore;
use crate::config::Config;
use crate::db;
use crate::engine::ReconciliationEngine;
use crate::models::{Article, SyncStatus, WireArticle};
use crate::remote::HttpBookmarkService;
use crate::session::{self, Session};
use crate::status;

/// Categories the news endpoint understands.
pub const CATEGORIES: &[&str] = &["general", "technology", "sports", "business", "health"];

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<WireArticle>,
}

/// Fetch headlines for `category`, dropping entries with an empty title or
/// description (wire feeds carry placeholder records).
pub async fn fetch_headlines(config: &Config, category: &str) -> Result<Vec<Article>> {
    if !CATEGORIES.contains(&category) {
        bail!(
            "Unknown category: '{}'. Use one of: {}.",
            category,
            CATEGORIES.join(", ")
        );
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.remote.timeout_secs))
        .build()?;

    let url = format!("{}/news", config.remote.base_url);
    let response = client
        .get(&url)
        .query(&[("category", category)])
        .send()
        .await
        .with_context(|| format!("Failed to reach the news endpoint at {url}"))?;

    let http_status = response.status();
    if !http_status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("News endpoint error {}: {}", http_status, body);
    }

    let body: HeadlinesResponse = response
        .json()
        .await
        .context("Invalid news response body")?;

    Ok(body
        .articles
        .into_iter()
        .map(WireArticle::into_article)
        .filter(|article| !article.title.is_empty() && !article.description.is_empty())
        .collect())
}

/// Run the headlines command: fetch, then print with saved-markers for the
/// signed-in user's bookmarks.
pub async fn run_headlines(config: &Config, category: &str) -> Result<()> {
    let articles = fetch_headlines(config, category).await?;
    if articles.is_empty() {
        println!("No headlines for '{}'.", category);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let session = session::load(&pool).await?;

    // Saved-markers need the bookmark set; a degraded reload still marks
    // from the cached snapshot.
    let engine = match &session {
        Session::Authenticated(profile) => {
            let service = HttpBookmarkService::new(&config.remote, profile.auth_token.clone())?;
            let cache = SqliteCacheStore::new(pool.clone());
            let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));
            let sync_status = engine.reload(&session).await;
            status::record_sync_status(&pool, sync_status).await?;
            Some(engine)
        }
        Session::Anonymous => None,
    };

    println!("Headlines: {} ({} articles)", category, articles.len());
    println!();

    for (i, article) in articles.iter().enumerate() {
        let saved = engine
            .as_ref()
            .map(|e| e.is_bookmarked(&article.url))
            .unwrap_or(false);
        let marker = if saved { " [saved]" } else { "" };

        println!(
            "{:>2}. {} / {}{}",
            i + 1,
            article.source_name,
            article.title,
            marker
        );
        println!("     published: {}", article.published_at.format("%Y-%m-%d"));
        println!("     url: {}", article.url);
        println!();
    }

    if let Some(engine) = &engine {
        if engine.last_sync_status() == SyncStatus::Degraded {
            println!("Note: bookmark sync failed; saved-markers reflect cached bookmarks.");
        }
    }

    pool.close().await;
    Ok(())
}
