//! Core data models used throughout Newsclip.
//!
//! These types represent the articles, bookmark sets, and sync states that
//! flow between the remote bookmark service, the local cache, and the
//! reconciliation engine.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A news article. Immutable once constructed; bookmark membership is
/// decided by `url` alone, so two articles with the same url are the same
/// bookmark even if their titles differ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
}

/// The engine's owned bookmark collection: server return order, no
/// duplicate urls, with a url index for O(1) membership checks.
///
/// Serializes as a plain JSON array of articles; deserialization rebuilds
/// the index and drops any duplicate urls after the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkSet {
    articles: Vec<Article>,
    urls: HashSet<String>,
}

impl BookmarkSet {
    /// Build a set from server-ordered articles, keeping the first
    /// occurrence of each url.
    pub fn from_articles(articles: Vec<Article>) -> Self {
        let mut set = Self::default();
        for article in articles {
            set.push(article);
        }
        set
    }

    fn push(&mut self, article: Article) {
        if self.urls.insert(article.url.clone()) {
            self.articles.push(article);
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

impl Serialize for BookmarkSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.articles.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BookmarkSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<Article>::deserialize(deserializer).map(BookmarkSet::from_articles)
    }
}

/// How the engine's in-memory set relates to the server of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Last reload fetched the set from the remote service.
    Synced,
    /// Remote unreachable; showing cached (or stale in-memory) data.
    Degraded,
    /// No reload has happened yet, or the user signed out.
    Uninitialized,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Degraded => "degraded",
            SyncStatus::Uninitialized => "uninitialized",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(SyncStatus::Synced),
            "degraded" => Ok(SyncStatus::Degraded),
            "uninitialized" => Ok(SyncStatus::Uninitialized),
            other => Err(format!("unknown sync status: '{other}'")),
        }
    }
}

/// Article as it appears on the wire: camelCase field names, `source` as
/// either an object or a bare string, `publishedAt` as either an RFC 3339
/// string or an epoch number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_image: Option<String>,
    pub source: WireSource,
    #[serde(default)]
    pub published_at: Option<WireTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl WireArticle {
    pub fn into_article(self) -> Article {
        Article {
            title: self.title,
            description: self.description,
            url: self.url,
            image_url: self.url_to_image,
            source_name: self.source.into_name(),
            published_at: self
                .published_at
                .and_then(WireTimestamp::normalize)
                .unwrap_or(DateTime::UNIX_EPOCH),
            author: self.author,
        }
    }
}

impl From<&Article> for WireArticle {
    fn from(article: &Article) -> Self {
        WireArticle {
            title: article.title.clone(),
            description: article.description.clone(),
            url: article.url.clone(),
            url_to_image: article.image_url.clone(),
            source: WireSource::Named {
                name: Some(article.source_name.clone()),
            },
            published_at: Some(WireTimestamp::Text(article.published_at.to_rfc3339())),
            author: article.author.clone(),
        }
    }
}

/// `source` field shapes seen in the wild: `{"name": "..."}` or `"..."`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireSource {
    Named { name: Option<String> },
    Plain(String),
}

impl WireSource {
    pub fn into_name(self) -> String {
        match self {
            WireSource::Named { name } => name.unwrap_or_default(),
            WireSource::Plain(name) => name,
        }
    }
}

/// `publishedAt` field shapes: RFC 3339 text, a bare date, or an epoch
/// value (milliseconds when too large to be seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Text(String),
    Epoch(i64),
}

impl WireTimestamp {
    pub fn normalize(self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Text(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    return Some(dt.with_timezone(&Utc));
                }
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            }
            WireTimestamp::Epoch(n) => {
                if n >= 1_000_000_000_000 {
                    DateTime::from_timestamp_millis(n)
                } else {
                    DateTime::from_timestamp(n, 0)
                }
            }
        }
    }
}
