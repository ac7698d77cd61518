// src/providers/types.rs
//! Collaborator contracts consumed by the selection engine, delivery and the
//! HTTP handlers.

use anyhow::Result;

use crate::error::SearchError;
use crate::selection::query::SearchQuery;
use crate::types::{Article, Interest};

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// One page of results in provider ranking order. An empty vec means
    /// there are no further results.
    async fn search(&self, query: &SearchQuery) -> std::result::Result<Vec<Article>, SearchError>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn exists(&self, room_id: &str, url: &str) -> Result<bool>;
    async fn record(&self, room_id: &str, url: &str) -> Result<()>;
}

#[async_trait::async_trait]
pub trait InterestStore: Send + Sync {
    async fn list(&self, room_id: &str) -> Result<Vec<Interest>>;
    async fn delete(&self, room_id: &str, topic: &str) -> Result<()>;
    async fn insert(&self, interest: &Interest) -> Result<()>;
    async fn count(&self, room_id: &str) -> Result<usize>;
}

#[async_trait::async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn list_rooms(&self) -> Result<Vec<String>>;
}

#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Post a message and return the id the chat service assigned to it.
    async fn post_message(&self, room_id: &str, body: &str) -> Result<String>;
    async fn get_message(&self, room_id: &str, message_id: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, article: &Article) -> Result<String>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait SavedArticleStore: Send + Sync {
    async fn save(&self, room_id: &str, content: &str) -> Result<()>;
}
