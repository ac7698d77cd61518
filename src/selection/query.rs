// src/selection/query.rs
//! Search query construction for the article provider.
//!
//! Topic sub-words become one field-scoped term each; terms separated by a
//! space are ANDed by the provider. Every cascade query carries the popularity
//! floor (`stocks:>=N`) and a fixed page size.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::types::SearchStrategy;

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const DEFAULT_MIN_STOCKS: u32 = 30;

/// Path of the item search endpoint, relative to the provider base URL.
pub const ITEMS_PATH: &str = "/api/v2/items";

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}
fn default_min_stocks() -> u32 {
    DEFAULT_MIN_STOCKS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_min_stocks")]
    pub min_stocks: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            min_stocks: DEFAULT_MIN_STOCKS,
        }
    }
}

/// A ready-to-issue search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub strategy: SearchStrategy,
    /// Provider query expression, e.g. `stocks:>=30 tag:cursor tag:rules`.
    pub text: String,
    /// 1-based.
    pub page: u32,
    pub per_page: u32,
}

impl SearchQuery {
    /// Build the query for one cascade page.
    ///
    /// The topic must be non-empty after trimming for the scoped strategies;
    /// callers filter blank topics out before reaching here.
    pub fn build(strategy: SearchStrategy, topic: &str, page: u32, limits: &QueryLimits) -> Self {
        let mut parts = vec![format!("stocks:>={}", limits.min_stocks)];
        if let Some(scope) = strategy.scope() {
            parts.extend(scoped_terms(scope, topic));
        }
        Self {
            strategy,
            text: parts.join(" "),
            page: page.max(1),
            per_page: limits.per_page,
        }
    }

    /// Registration title check: does any article title contain every sub-word?
    /// One result is enough, and the popularity floor is not applied.
    pub fn title_check(topic: &str) -> Self {
        Self {
            strategy: SearchStrategy::TitleSearch,
            text: scoped_terms("title", topic).join(" "),
            page: 1,
            per_page: 1,
        }
    }

    /// Query-string pairs in the order the provider expects them.
    pub fn params(&self) -> [(&'static str, String); 3] {
        [
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("query", self.text.clone()),
        ]
    }

    /// Absolute URL against the provider's base URL.
    pub fn to_url(&self, base: &str) -> Result<Url> {
        let endpoint = format!("{}{}", base.trim_end_matches('/'), ITEMS_PATH);
        Url::parse_with_params(&endpoint, self.params())
            .with_context(|| format!("building search url from base {base}"))
    }
}

fn scoped_terms(scope: &str, topic: &str) -> Vec<String> {
    topic
        .split_whitespace()
        .map(|word| format!("{scope}:{word}"))
        .collect()
}
