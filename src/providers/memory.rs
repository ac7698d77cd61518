// src/providers/memory.rs
//! In-memory collaborators for tests and dry runs (`run-batch --dry-run`).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};

use super::types::{
    ChatClient, HistoryStore, InterestStore, RoomDirectory, SavedArticleStore, SearchProvider,
    Summarizer,
};
use crate::error::SearchError;
use crate::selection::query::SearchQuery;
use crate::types::{Article, Interest};

// --- history ---

#[derive(Debug, Default)]
pub struct MemoryHistory {
    seen: Mutex<HashSet<(String, String)>>,
    failing_urls: Mutex<HashSet<String>>,
}

impl MemoryHistory {
    pub fn seed(&self, room_id: &str, url: &str) {
        self.seen
            .lock()
            .expect("history mutex poisoned")
            .insert((room_id.to_string(), url.to_string()));
    }

    /// Make every lookup for `url` fail.
    pub fn fail_lookups_for(&self, url: &str) {
        self.failing_urls
            .lock()
            .expect("history mutex poisoned")
            .insert(url.to_string());
    }

    pub fn contains(&self, room_id: &str, url: &str) -> bool {
        self.seen
            .lock()
            .expect("history mutex poisoned")
            .contains(&(room_id.to_string(), url.to_string()))
    }

    pub fn len(&self) -> usize {
        self.seen.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistory {
    async fn exists(&self, room_id: &str, url: &str) -> Result<bool> {
        if self
            .failing_urls
            .lock()
            .expect("history mutex poisoned")
            .contains(url)
        {
            return Err(anyhow!("history lookup failed for {url}"));
        }
        Ok(self.contains(room_id, url))
    }

    async fn record(&self, room_id: &str, url: &str) -> Result<()> {
        self.seed(room_id, url);
        Ok(())
    }
}

// --- interests & rooms ---

#[derive(Debug, Default)]
pub struct MemoryInterests {
    rows: Mutex<Vec<Interest>>,
    deleted: Mutex<Vec<(String, String)>>,
    lists_fail: AtomicBool,
    deletes_fail: AtomicBool,
}

impl MemoryInterests {
    pub fn with(rows: Vec<Interest>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make every `list` call fail from now on.
    pub fn fail_lists(&self) {
        self.lists_fail.store(true, Ordering::SeqCst);
    }

    /// Make every `delete` call fail from now on; rows are left in place.
    pub fn fail_deletes(&self) {
        self.deletes_fail.store(true, Ordering::SeqCst);
    }

    /// `(room_id, topic)` pairs removed so far, in order.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().expect("interests mutex poisoned").clone()
    }

    pub fn snapshot(&self) -> Vec<Interest> {
        self.rows.lock().expect("interests mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl InterestStore for MemoryInterests {
    async fn list(&self, room_id: &str) -> Result<Vec<Interest>> {
        if self.lists_fail.load(Ordering::SeqCst) {
            return Err(anyhow!("interest listing failed for room {room_id}"));
        }
        Ok(self
            .rows
            .lock()
            .expect("interests mutex poisoned")
            .iter()
            .filter(|i| i.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, room_id: &str, topic: &str) -> Result<()> {
        if self.deletes_fail.load(Ordering::SeqCst) {
            return Err(anyhow!("deleting {topic} failed for room {room_id}"));
        }
        self.rows
            .lock()
            .expect("interests mutex poisoned")
            .retain(|i| !(i.room_id == room_id && i.topic == topic));
        self.deleted
            .lock()
            .expect("interests mutex poisoned")
            .push((room_id.to_string(), topic.to_string()));
        Ok(())
    }

    async fn insert(&self, interest: &Interest) -> Result<()> {
        self.rows
            .lock()
            .expect("interests mutex poisoned")
            .push(interest.clone());
        Ok(())
    }

    async fn count(&self, room_id: &str) -> Result<usize> {
        Ok(self.list(room_id).await?.len())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRooms {
    pub rooms: Vec<String>,
}

impl MemoryRooms {
    pub fn new<I, S>(rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rooms: rooms.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl RoomDirectory for MemoryRooms {
    async fn list_rooms(&self) -> Result<Vec<String>> {
        Ok(self.rooms.clone())
    }
}

// --- search ---

/// Canned reply for one `(query text, page)` pair.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Items(Vec<Article>),
    Transport,
    Parse,
    RateLimited,
}

/// Search provider answering from a script. Unscripted requests get an
/// empty page.
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    replies: Mutex<HashMap<(String, u32), ScriptedReply>>,
    calls: Mutex<Vec<SearchQuery>>,
}

impl ScriptedSearch {
    pub fn reply(&self, query_text: &str, page: u32, reply: ScriptedReply) -> &Self {
        self.replies
            .lock()
            .expect("search mutex poisoned")
            .insert((query_text.to_string(), page), reply);
        self
    }

    pub fn items(&self, query_text: &str, page: u32, items: Vec<Article>) -> &Self {
        self.reply(query_text, page, ScriptedReply::Items(items))
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().expect("search mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &SearchQuery) -> std::result::Result<Vec<Article>, SearchError> {
        self.calls
            .lock()
            .expect("search mutex poisoned")
            .push(query.clone());
        let reply = self
            .replies
            .lock()
            .expect("search mutex poisoned")
            .get(&(query.text.clone(), query.page))
            .cloned();
        match reply {
            None => Ok(Vec::new()),
            Some(ScriptedReply::Items(items)) => Ok(items),
            Some(ScriptedReply::Transport) => Err(SearchError::Transport("scripted".into())),
            Some(ScriptedReply::Parse) => Err(SearchError::Parse("scripted".into())),
            Some(ScriptedReply::RateLimited) => Err(SearchError::RateLimited("scripted".into())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// --- chat / summary / saved ---

/// Chat double: keeps posted messages and serves `get_message` from them.
#[derive(Debug, Default)]
pub struct RecordingChat {
    posted: Mutex<Vec<(String, String)>>,
    failing_rooms: Mutex<HashSet<String>>,
}

impl RecordingChat {
    pub fn fail_room(&self, room_id: &str) {
        self.failing_rooms
            .lock()
            .expect("chat mutex poisoned")
            .insert(room_id.to_string());
    }

    /// `(room_id, body)` pairs in posting order.
    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().expect("chat mutex poisoned").clone()
    }

    pub fn posted_to(&self, room_id: &str) -> Vec<String> {
        self.posted()
            .into_iter()
            .filter(|(r, _)| r == room_id)
            .map(|(_, b)| b)
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatClient for RecordingChat {
    async fn post_message(&self, room_id: &str, body: &str) -> Result<String> {
        if self
            .failing_rooms
            .lock()
            .expect("chat mutex poisoned")
            .contains(room_id)
        {
            return Err(anyhow!("chat post to room {room_id} failed"));
        }
        let mut posted = self.posted.lock().expect("chat mutex poisoned");
        posted.push((room_id.to_string(), body.to_string()));
        Ok(posted.len().to_string())
    }

    async fn get_message(&self, room_id: &str, message_id: &str) -> Result<String> {
        let idx: usize = message_id
            .parse()
            .map_err(|_| anyhow!("unknown message id {message_id}"))?;
        let posted = self.posted.lock().expect("chat mutex poisoned");
        match posted.get(idx.wrapping_sub(1)) {
            Some((r, body)) if r == room_id => Ok(body.clone()),
            _ => Err(anyhow!("message {message_id} not found in room {room_id}")),
        }
    }
}

/// Summarizer returning the first characters of the article body.
#[derive(Debug, Clone)]
pub struct StaticSummarizer {
    pub max_chars: usize,
    pub fail: bool,
}

impl Default for StaticSummarizer {
    fn default() -> Self {
        Self {
            max_chars: 80,
            fail: false,
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, article: &Article) -> Result<String> {
        if self.fail {
            return Err(anyhow!("summarizer unavailable"));
        }
        let text: String = article.body.chars().take(self.max_chars).collect();
        Ok(format!("* {}", text.trim()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[derive(Debug, Default)]
pub struct MemorySaved {
    rows: Mutex<Vec<(String, String)>>,
}

impl MemorySaved {
    pub fn rows(&self) -> Vec<(String, String)> {
        self.rows.lock().expect("saved mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl SavedArticleStore for MemorySaved {
    async fn save(&self, room_id: &str, content: &str) -> Result<()> {
        self.rows
            .lock()
            .expect("saved mutex poisoned")
            .push((room_id.to_string(), content.to_string()));
        Ok(())
    }
}
