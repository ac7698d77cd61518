// src/providers/qiita.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::types::SearchProvider;
use crate::error::SearchError;
use crate::selection::query::SearchQuery;
use crate::types::Article;

pub const DEFAULT_QIITA_BASE_URL: &str = "https://qiita.com";

#[derive(Debug, Deserialize)]
struct QiitaTag {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct QiitaUser {
    #[serde(default)]
    id: String,
}

/// Item record as served by `GET /api/v2/items`.
#[derive(Debug, Deserialize)]
struct QiitaItem {
    title: String,
    url: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    stocks_count: u32,
    #[serde(default)]
    likes_count: u32,
    #[serde(default)]
    tags: Vec<QiitaTag>,
    #[serde(default)]
    user: QiitaUser,
    #[serde(default)]
    body: String,
}

impl From<QiitaItem> for Article {
    fn from(it: QiitaItem) -> Self {
        Article {
            title: it.title,
            url: it.url,
            created_at: it.created_at,
            stock_count: it.stocks_count,
            likes_count: it.likes_count,
            author: it.user.id,
            tags: it.tags.into_iter().map(|t| t.name).collect(),
            body: it.body,
            summary: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QiitaErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// Classify a raw search response body.
///
/// - `[]` → empty page
/// - object with `type = "rate_limit_exceeded"` → [`SearchError::RateLimited`]
/// - array of items → page
/// - a single item object → one-item page
pub fn parse_search_body(body: &str) -> Result<Vec<Article>, SearchError> {
    if let Ok(err) = serde_json::from_str::<QiitaErrorBody>(body) {
        if err.kind == "rate_limit_exceeded" {
            return Err(SearchError::RateLimited(err.message));
        }
    }
    if body.trim() == "[]" {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Vec<QiitaItem>>(body) {
        Ok(items) => Ok(items.into_iter().map(Article::from).collect()),
        Err(list_err) => serde_json::from_str::<QiitaItem>(body)
            .map(|item| vec![Article::from(item)])
            .map_err(|_| SearchError::Parse(list_err.to_string())),
    }
}

/// Classify a full HTTP answer. Only a 2xx answer can yield a page; a 429
/// or a rate-limit body on any status is [`SearchError::RateLimited`].
pub fn classify_response(status: StatusCode, body: &str) -> Result<Vec<Article>, SearchError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SearchError::RateLimited(format!("HTTP {status}")));
    }
    match parse_search_body(body) {
        Err(SearchError::RateLimited(msg)) => Err(SearchError::RateLimited(msg)),
        _ if !status.is_success() => Err(SearchError::Transport(format!("HTTP {status}"))),
        parsed => parsed,
    }
}

pub struct QiitaSearchProvider {
    http: Client,
    base_url: String,
    token: String,
}

impl QiitaSearchProvider {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("article-digest-bot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for QiitaSearchProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Article>, SearchError> {
        if self.token.is_empty() {
            return Err(SearchError::Transport("QIITA_ACCESS_TOKEN is not set".into()));
        }
        let url = query
            .to_url(&self.base_url)
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        let result = classify_response(status, &body);
        if matches!(result, Err(SearchError::RateLimited(_))) {
            counter!("qiita_rate_limited_total").increment(1);
        }
        result
    }

    fn name(&self) -> &'static str {
        "qiita"
    }
}
