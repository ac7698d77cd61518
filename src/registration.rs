// src/registration.rs
//! Interest registration from a chat message.
//!
//! A message like `Rust, cursor　rules、ＧＯ` yields the topics
//! `Rust`, `Cursor rules` and `Go`. Each topic is checked against the search
//! provider and stored only if at least one article title matches it.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RegistrationConfig;
use crate::providers::types::{ChatClient, InterestStore, SearchProvider};
use crate::selection::query::SearchQuery;
use crate::types::Interest;

/// Map full-width ASCII letters and digits to their half-width forms.
fn to_half_width(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Normalize one topic: unify spaces, collapse whitespace, half-width
/// alphanumerics, then capitalize when it starts with an ASCII letter.
pub fn normalize_topic(raw: &str) -> String {
    let spaced = raw.replace('\u{3000}', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let half: String = collapsed.chars().map(to_half_width).collect();

    let mut chars = half.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            format!("{}{}", first.to_ascii_uppercase(), chars.as_str().to_lowercase())
        }
        _ => half,
    }
}

/// Split a registration message into normalized, non-empty topics.
pub fn parse_topics(message: &str) -> Vec<String> {
    static RE_SEP: OnceCell<Regex> = OnceCell::new();
    let re = RE_SEP.get_or_init(|| Regex::new(r"[,、\r\n]").expect("separator regex"));
    re.split(message)
        .map(normalize_topic)
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoMatchingArticles,
    LookupFailed,
    RoomFull,
    AlreadyRegistered,
    StoreError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    pub registered: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

pub fn confirmation_message(registered: &[String]) -> String {
    format!("{} を登録しました", registered.join("、"))
}

pub struct Registrar {
    search: Arc<dyn SearchProvider>,
    interests: Arc<dyn InterestStore>,
    chat: Arc<dyn ChatClient>,
    cfg: RegistrationConfig,
}

impl Registrar {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        interests: Arc<dyn InterestStore>,
        chat: Arc<dyn ChatClient>,
        cfg: RegistrationConfig,
    ) -> Self {
        Self {
            search,
            interests,
            chat,
            cfg,
        }
    }

    /// Register every acceptable topic in `message` for `room_id` and confirm
    /// in the room. Per-topic problems end up in `skipped`; only the
    /// confirmation post can fail the call.
    pub async fn register(&self, room_id: &str, message: &str) -> Result<RegistrationReport> {
        let mut report = RegistrationReport::default();

        for topic in parse_topics(message) {
            match self.register_one(room_id, &topic).await {
                Ok(()) => {
                    info!(room_id, %topic, "interest registered");
                    counter!("digest_interests_registered_total").increment(1);
                    report.registered.push(topic);
                }
                Err(reason) => {
                    debug!(room_id, %topic, ?reason, "topic not registered");
                    report.skipped.push((topic, reason));
                }
            }
        }

        if !report.registered.is_empty() {
            self.chat
                .post_message(room_id, &confirmation_message(&report.registered))
                .await
                .context("posting registration confirmation")?;
        }
        Ok(report)
    }

    async fn register_one(&self, room_id: &str, topic: &str) -> Result<(), SkipReason> {
        match self.search.search(&SearchQuery::title_check(topic)).await {
            Ok(items) if items.is_empty() => return Err(SkipReason::NoMatchingArticles),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, room_id, topic, "registration title check failed");
                return Err(SkipReason::LookupFailed);
            }
        }

        let existing = self.interests.list(room_id).await.map_err(|e| {
            warn!(error = ?e, room_id, "listing interests failed");
            SkipReason::StoreError
        })?;
        if existing.iter().any(|i| i.topic.eq_ignore_ascii_case(topic)) {
            return Err(SkipReason::AlreadyRegistered);
        }

        let count = self.interests.count(room_id).await.map_err(|e| {
            warn!(error = ?e, room_id, "counting interests failed");
            SkipReason::StoreError
        })?;
        if count >= self.cfg.max_interests_per_room {
            return Err(SkipReason::RoomFull);
        }

        let interest = Interest::new(room_id, topic, self.cfg.default_priority);
        self.interests.insert(&interest).await.map_err(|e| {
            warn!(error = ?e, room_id, topic, "storing interest failed");
            SkipReason::StoreError
        })
    }
}
