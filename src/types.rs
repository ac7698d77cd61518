// src/types.rs
//! Domain records shared by the selection engine, the collaborators and the API.

use serde::{Deserialize, Serialize};

/// A weighted topic a room asked to receive articles about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub room_id: String,
    pub topic: String,
    pub priority: u32,
}

impl Interest {
    pub fn new(room_id: impl Into<String>, topic: impl Into<String>, priority: u32) -> Self {
        Self {
            room_id: room_id.into(),
            topic: topic.into(),
            priority,
        }
    }
}

/// Candidate article as returned by the search provider.
/// Order of `tags` is the provider's order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub created_at: String,
    pub stock_count: u32,
    pub likes_count: u32,
    pub author: String,
    pub tags: Vec<String>,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Which search strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// `tag:` scoped AND terms.
    TagSearch,
    /// `title:` scoped AND terms.
    TitleSearch,
    /// Popularity filter only.
    Unscoped,
}

impl SearchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TagSearch => "tag-search",
            Self::TitleSearch => "title-search",
            Self::Unscoped => "unscoped",
        }
    }

    /// Field scope prefix for topic terms; `None` for the unscoped stage.
    pub fn scope(self) -> Option<&'static str> {
        match self {
            Self::TagSearch => Some("tag"),
            Self::TitleSearch => Some("title"),
            Self::Unscoped => None,
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heading used when the article is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "topic", rename_all = "snake_case")]
pub enum SelectionLabel {
    Topic(String),
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedArticle {
    pub article: Article,
    pub label: SelectionLabel,
    pub stage: SearchStrategy,
}

/// Per-room result of one cascade run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Found(SelectedArticle),
    NotFound,
}

impl SelectionOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn article(&self) -> Option<&Article> {
        match self {
            Self::Found(sel) => Some(&sel.article),
            Self::NotFound => None,
        }
    }
}

/// Cascade result plus the housekeeping it performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSelection {
    pub outcome: SelectionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned_topic: Option<String>,
}
