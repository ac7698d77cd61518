// src/providers/supabase.rs
//! Supabase (PostgREST) backed stores.
//!
//! Tables:
//! - `user(room_id)`
//! - `field(room_id, field_name, priority)`
//! - `article_history(article_url, room_id)`
//! - `reserve_article(room_id, content)`

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::types::{HistoryStore, InterestStore, RoomDirectory, SavedArticleStore};
use crate::types::Interest;

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(default)]
    room_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldRow {
    room_id: String,
    field_name: String,
    priority: u32,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    article_url: &'a str,
    room_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ReserveRow<'a> {
    room_id: &'a str,
    content: &'a str,
}

#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building supabase http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
    }

    async fn insert_row<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<()> {
        let resp = self
            .table(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .with_context(|| format!("supabase insert into {table}"))?;
        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            bail!("supabase insert into {table} answered {status}: {body}");
        }
        Ok(())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl RoomDirectory for SupabaseStore {
    async fn list_rooms(&self) -> Result<Vec<String>> {
        let rows: Vec<UserRow> = self
            .table(Method::GET, "user")
            .query(&[("select", "room_id")])
            .send()
            .await
            .context("supabase list users")?
            .error_for_status()
            .context("supabase list users non-2xx")?
            .json()
            .await
            .context("decoding user rows")?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.room_id)
            .filter(|id| !id.is_empty())
            .collect())
    }
}

#[async_trait]
impl InterestStore for SupabaseStore {
    async fn list(&self, room_id: &str) -> Result<Vec<Interest>> {
        let rows: Vec<FieldRow> = self
            .table(Method::GET, "field")
            .query(&[
                ("select", "room_id,field_name,priority".to_string()),
                ("room_id", eq(room_id)),
            ])
            .send()
            .await
            .context("supabase list fields")?
            .error_for_status()
            .context("supabase list fields non-2xx")?
            .json()
            .await
            .context("decoding field rows")?;
        Ok(rows
            .into_iter()
            .map(|r| Interest {
                room_id: r.room_id,
                topic: r.field_name,
                priority: r.priority,
            })
            .collect())
    }

    async fn delete(&self, room_id: &str, topic: &str) -> Result<()> {
        self.table(Method::DELETE, "field")
            .query(&[("room_id", eq(room_id)), ("field_name", eq(topic))])
            .send()
            .await
            .context("supabase delete field")?
            .error_for_status()
            .context("supabase delete field non-2xx")?;
        Ok(())
    }

    async fn insert(&self, interest: &Interest) -> Result<()> {
        let row = FieldRow {
            room_id: interest.room_id.clone(),
            field_name: interest.topic.clone(),
            priority: interest.priority,
        };
        self.insert_row("field", &row).await
    }

    async fn count(&self, room_id: &str) -> Result<usize> {
        let rows: Vec<CountRow> = self
            .table(Method::GET, "field")
            .query(&[("room_id", eq(room_id)), ("select", "count".to_string())])
            .send()
            .await
            .context("supabase count fields")?
            .error_for_status()
            .context("supabase count fields non-2xx")?
            .json()
            .await
            .context("decoding field count")?;
        let first = rows
            .first()
            .ok_or_else(|| anyhow!("empty count response for room {room_id}"))?;
        Ok(first.count as usize)
    }
}

#[async_trait]
impl HistoryStore for SupabaseStore {
    async fn exists(&self, room_id: &str, url: &str) -> Result<bool> {
        let rows: Vec<serde_json::Value> = self
            .table(Method::GET, "article_history")
            .query(&[
                ("article_url", eq(url)),
                ("room_id", eq(room_id)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .context("supabase history lookup")?
            .error_for_status()
            .context("supabase history lookup non-2xx")?
            .json()
            .await
            .context("decoding history rows")?;
        Ok(!rows.is_empty())
    }

    async fn record(&self, room_id: &str, url: &str) -> Result<()> {
        self.insert_row(
            "article_history",
            &HistoryRow {
                article_url: url,
                room_id,
            },
        )
        .await
    }
}

#[async_trait]
impl SavedArticleStore for SupabaseStore {
    async fn save(&self, room_id: &str, content: &str) -> Result<()> {
        self.insert_row("reserve_article", &ReserveRow { room_id, content })
            .await
    }
}
