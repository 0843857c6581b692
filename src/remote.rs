//! HTTP client for the remote bookmark service.
//!
//! The remote service is the source of truth for a user's bookmarks. The
//! [`BookmarkService`] trait keeps the engine independent of the transport;
//! [`HttpBookmarkService`] implements it against the news API:
//!
//! - `GET  {base_url}/bookmarks` → `{"bookmarks": [{"article": {...}}]}`
//! - `POST {base_url}/bookmarks` with `{"action", "articleData"}` → `{"message"}`
//!
//! Identity is an externally verified user id sent as the `x-user-id`
//! header; when the session carries an opaque token it is forwarded as a
//! bearer credential, never inspected.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::models::{Article, WireArticle};

const USER_ID_HEADER: &str = "x-user-id";

/// Mutation kinds understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkAction {
    Add,
    Remove,
}

impl BookmarkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkAction::Add => "add",
            BookmarkAction::Remove => "remove",
        }
    }
}

impl fmt::Display for BookmarkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of a mutation. An add that raced another client and hit
/// an existing record comes back as [`MutateAck::AlreadyBookmarked`], which
/// callers treat as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateAck {
    Added,
    AlreadyBookmarked,
    Removed,
}

/// Errors surfaced by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Transport failure: DNS, connect, TLS, or timeout.
    #[error("bookmark service unreachable: {message}")]
    Network { message: String },
    /// The service rejected the supplied identity (HTTP 401/403).
    #[error("bookmark service rejected the credentials: {message}")]
    Auth { message: String },
    /// Any other non-2xx response, or an undecodable body.
    #[error("bookmark service error {status}: {message}")]
    Server { status: u16, message: String },
}

impl ServiceError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }
}

/// Remote bookmark operations, keyed by authenticated user identity.
#[async_trait]
pub trait BookmarkService: Send + Sync {
    /// Fetch the user's bookmarks in server order.
    async fn list(&self, user_id: &str) -> Result<Vec<Article>, ServiceError>;

    /// Add or remove one bookmark. For a removal only the article's url is
    /// consulted.
    async fn mutate(
        &self,
        user_id: &str,
        action: BookmarkAction,
        article: &Article,
    ) -> Result<MutateAck, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    bookmarks: Vec<BookmarkRecord>,
}

#[derive(Debug, Deserialize)]
struct BookmarkRecord {
    article: WireArticle,
}

#[derive(Debug, Default, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: String,
}

/// [`BookmarkService`] over HTTP with the configured timeout.
pub struct HttpBookmarkService {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpBookmarkService {
    pub fn new(config: &RemoteConfig, auth_token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            auth_token,
            client,
        })
    }

    fn request(&self, method: Method, path: &str, user_id: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(USER_ID_HEADER, user_id);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl BookmarkService for HttpBookmarkService {
    async fn list(&self, user_id: &str) -> Result<Vec<Article>, ServiceError> {
        debug!(user_id, "listing bookmarks");

        let response = self
            .request(Method::GET, "/bookmarks", user_id)
            .send()
            .await
            .map_err(|e| ServiceError::network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::auth(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::server(status.as_u16(), body));
        }

        let body: ListResponse = response.json().await.map_err(|e| {
            ServiceError::server(status.as_u16(), format!("invalid response body: {e}"))
        })?;

        Ok(body
            .bookmarks
            .into_iter()
            .map(|record| record.article.into_article())
            .collect())
    }

    async fn mutate(
        &self,
        user_id: &str,
        action: BookmarkAction,
        article: &Article,
    ) -> Result<MutateAck, ServiceError> {
        debug!(user_id, %action, url = %article.url, "mutating bookmark");

        let body = serde_json::json!({
            "action": action.as_str(),
            "articleData": WireArticle::from(article),
        });

        let response = self
            .request(Method::POST, "/bookmarks", user_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::auth(text));
        }
        // Some backends signal a duplicate add with a conflict status
        // instead of a 200 + message.
        if status.as_u16() == 409 && action == BookmarkAction::Add {
            return Ok(MutateAck::AlreadyBookmarked);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::server(status.as_u16(), text));
        }

        let message: MessageResponse = response.json().await.unwrap_or_default();
        Ok(match action {
            BookmarkAction::Add if message.message == "Already bookmarked" => {
                MutateAck::AlreadyBookmarked
            }
            BookmarkAction::Add => MutateAck::Added,
            BookmarkAction::Remove => MutateAck::Removed,
        })
    }
}
