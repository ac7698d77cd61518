// src/delivery.rs
//! Hand-off of a selected article to the room: summarize, post, post a save
//! link, then record history. History is written only after both posts land.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::info;

use crate::providers::types::{ChatClient, HistoryStore, Summarizer};
use crate::types::{SelectedArticle, SelectionLabel};

pub const GENERIC_HEADING: &str = "本日の記事";

pub fn heading(label: &SelectionLabel) -> String {
    match label {
        SelectionLabel::Topic(topic) => format!("「{topic}」の記事"),
        SelectionLabel::Generic => GENERIC_HEADING.to_string(),
    }
}

/// Chat markup for the article post.
pub fn format_article_message(selected: &SelectedArticle, summary: &str) -> String {
    let a = &selected.article;
    let tags = if a.tags.is_empty() {
        String::new()
    } else {
        format!("\nタグ: {}", a.tags.join(", "))
    };
    format!(
        "[info][title]{}[/title]{}\n{}\n\n{}{}[/info]",
        heading(&selected.label),
        a.title,
        a.url,
        summary,
        tags
    )
}

pub fn save_link(public_base_url: &str, room_id: &str, message_id: &str) -> Result<Url> {
    let base = format!("{}/save", public_base_url.trim_end_matches('/'));
    Url::parse_with_params(&base, &[("room_id", room_id), ("message_id", message_id)])
        .with_context(|| format!("building save link from {public_base_url}"))
}

pub fn format_save_message(link: &Url) -> String {
    format!("保存する場合は以下のリンクをクリック:\n{link}")
}

/// What was posted for a room.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Delivered {
    pub message_id: String,
    pub url: String,
}

pub struct Delivery {
    chat: Arc<dyn ChatClient>,
    summarizer: Arc<dyn Summarizer>,
    history: Arc<dyn HistoryStore>,
    public_base_url: String,
}

impl Delivery {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        summarizer: Arc<dyn Summarizer>,
        history: Arc<dyn HistoryStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            summarizer,
            history,
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn deliver(&self, room_id: &str, selected: &SelectedArticle) -> Result<Delivered> {
        let url = &selected.article.url;
        let summary = self
            .summarizer
            .summarize(&selected.article)
            .await
            .with_context(|| format!("summarizing {url} via {}", self.summarizer.name()))?;

        let message_id = self
            .chat
            .post_message(room_id, &format_article_message(selected, &summary))
            .await
            .context("posting article")?;

        let link = save_link(&self.public_base_url, room_id, &message_id)?;
        self.chat
            .post_message(room_id, &format_save_message(&link))
            .await
            .context("posting save link")?;

        self.history
            .record(room_id, url)
            .await
            .context("recording delivery history")?;

        info!(room_id, %url, message_id = %message_id, "article delivered");
        Ok(Delivered {
            message_id,
            url: url.clone(),
        })
    }
}
