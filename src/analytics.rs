//! Reading analytics: source distribution and trending keywords.
//!
//! Pure computation over article slices, used by `ncl analyze` against
//! either the user's bookmark set or a fetched headline batch. Rendering
//! beyond plain text (charts and the like) is a consumer concern.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::cache::sqlite::SqliteCacheStore;
use crate::config::Config;
use crate::db;
use crate::engine::ReconciliationEngine;
use crate::headlines;
use crate::models::{Article, SyncStatus};
use crate::remote::HttpBookmarkService;
use crate::session::{self, Session};
use crate::status;

const TOP_SOURCES: usize = 5;
const TOP_KEYWORDS: usize = 10;

/// Filler words excluded from keyword trends.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "can", "this", "that", "these", "those",
    "from", "by", "about", "as", "into", "through", "during", "after", "before", "up", "down",
    "out", "over", "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "just", "it",
    "its", "new", "says",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceShare {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub article_count: usize,
    pub sources: Vec<SourceShare>,
    pub keywords: Vec<KeywordCount>,
}

/// Articles per source, most common first, capped at five. Ties break
/// alphabetically so output is stable.
pub fn source_distribution(articles: &[Article]) -> Vec<SourceShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for article in articles {
        *counts.entry(article.source_name.as_str()).or_default() += 1;
    }

    let mut shares: Vec<SourceShare> = counts
        .into_iter()
        .map(|(name, count)| SourceShare {
            name: name.to_string(),
            count,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares.truncate(TOP_SOURCES);
    shares
}

/// Most frequent title words, capped at ten. Titles are lowercased and
/// stripped of punctuation; words of three characters or fewer and stop
/// words are dropped. Ties break alphabetically.
pub fn trending_keywords(articles: &[Article]) -> Vec<KeywordCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for article in articles {
        for word in tokenize(&article.title) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut keywords: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(word, count)| KeywordCount { word, count })
        .collect();
    keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    keywords.truncate(TOP_KEYWORDS);
    keywords
}

pub fn report(articles: &[Article]) -> AnalyticsReport {
    AnalyticsReport {
        article_count: articles.len(),
        sources: source_distribution(articles),
        keywords: trending_keywords(articles),
    }
}

fn tokenize(title: &str) -> Vec<String> {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 3 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Run the analyze command over the bookmark set, or over fresh headlines
/// when a category is given.
pub async fn run_analyze(config: &Config, category: Option<String>) -> Result<()> {
    if let Some(category) = category {
        let articles = headlines::fetch_headlines(config, &category).await?;
        print_report(
            &format!("{} '{}' headlines", articles.len(), category),
            &report(&articles),
        );
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let Session::Authenticated(profile) = session::load(&pool).await? else {
        pool.close().await;
        anyhow::bail!("Not signed in. Sign in first, or pass --category to analyze headlines.");
    };

    let service = HttpBookmarkService::new(&config.remote, profile.auth_token.clone())?;
    let cache = SqliteCacheStore::new(pool.clone());
    let mut engine = ReconciliationEngine::new(Arc::new(service), Arc::new(cache));

    let sync_status = engine.reload(&Session::Authenticated(profile)).await;
    status::record_sync_status(&pool, sync_status).await?;

    let label = match sync_status {
        SyncStatus::Degraded => format!("{} bookmarks (cached)", engine.bookmarks().len()),
        _ => format!("{} bookmarks", engine.bookmarks().len()),
    };
    print_report(&label, &report(engine.bookmarks()));

    pool.close().await;
    Ok(())
}

fn print_report(subject: &str, report: &AnalyticsReport) {
    println!("Analytics for {}", subject);
    println!();

    if report.article_count == 0 {
        println!("Nothing to analyze.");
        return;
    }

    println!("  Top sources:");
    for share in &report.sources {
        println!("    {:>4}  {}", share.count, share.name);
    }

    println!();
    println!("  Trending keywords:");
    if report.keywords.is_empty() {
        println!("    (no keywords survive filtering)");
    }
    for keyword in &report.keywords {
        println!("    {:>4}  {}", keyword.count, keyword.word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn article(title: &str, source: &str) -> Article {
        Article {
            title: title.to_string(),
            description: "A description.".to_string(),
            url: format!("https://news.example/{}", title.len()),
            image_url: None,
            source_name: source.to_string(),
            published_at: DateTime::UNIX_EPOCH,
            author: None,
        }
    }

    #[test]
    fn source_distribution_counts_and_caps() {
        let articles: Vec<Article> = vec![
            article("one", "Alpha"),
            article("two", "Alpha"),
            article("three", "Beta"),
            article("four", "Gamma"),
            article("five", "Delta"),
            article("six", "Epsilon"),
            article("seven", "Zeta"),
        ];
        let shares = source_distribution(&articles);
        assert_eq!(shares.len(), TOP_SOURCES);
        assert_eq!(
            shares[0],
            SourceShare {
                name: "Alpha".to_string(),
                count: 2
            }
        );
        // Singles tie; alphabetical order decides who makes the cut.
        assert_eq!(shares[1].name, "Beta");
        assert_eq!(shares[4].name, "Gamma");
    }

    #[test]
    fn keywords_filter_stop_words_and_short_words() {
        let articles = vec![
            article("Markets rally after the rate decision", "Wire"),
            article("Markets slip as rate fears return", "Wire"),
        ];
        let keywords = trending_keywords(&articles);
        let words: Vec<&str> = keywords.iter().map(|k| k.word.as_str()).collect();

        assert_eq!(keywords[0].word, "markets");
        assert_eq!(keywords[0].count, 2);
        // "the", "as" are stop words; "rate" survives at four characters.
        assert!(words.contains(&"rate"));
        assert!(!words.contains(&"the"));
        assert!(!words.contains(&"as"));
    }

    #[test]
    fn keywords_strip_punctuation_before_counting() {
        let articles = vec![article("Breaking: chips, chips... everywhere!", "Wire")];
        let keywords = trending_keywords(&articles);
        assert_eq!(keywords[0].word, "chips");
        assert_eq!(keywords[0].count, 2);
    }

    #[test]
    fn keywords_cap_at_ten() {
        let articles = vec![article(
            "alpha1 bravo2 charlie3 delta4 echo5 foxtrot6 golf7 hotel8 india9 juliet10 kilo11",
            "Wire",
        )];
        assert_eq!(trending_keywords(&articles).len(), TOP_KEYWORDS);
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let report = report(&[]);
        assert_eq!(report.article_count, 0);
        assert!(report.sources.is_empty());
        assert!(report.keywords.is_empty());
    }
}
