// src/providers/chatwork.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::types::ChatClient;

pub const DEFAULT_CHATWORK_BASE_URL: &str = "https://api.chatwork.com";

#[derive(Debug, Deserialize)]
struct PostedMessage {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    body: String,
}

pub struct ChatworkClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ChatworkClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building chatwork http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn messages_url(&self, room_id: &str) -> String {
        format!("{}/v2/rooms/{room_id}/messages", self.base_url)
    }
}

#[async_trait]
impl ChatClient for ChatworkClient {
    async fn post_message(&self, room_id: &str, body: &str) -> Result<String> {
        let posted: PostedMessage = self
            .http
            .post(self.messages_url(room_id))
            .header("X-ChatWorkToken", &self.token)
            .form(&[("body", body)])
            .send()
            .await
            .context("chatwork post")?
            .error_for_status()
            .context("chatwork post non-2xx")?
            .json()
            .await
            .context("decoding chatwork post response")?;
        Ok(posted.message_id)
    }

    async fn get_message(&self, room_id: &str, message_id: &str) -> Result<String> {
        let msg: MessageBody = self
            .http
            .get(format!("{}/{message_id}", self.messages_url(room_id)))
            .header("X-ChatWorkToken", &self.token)
            .send()
            .await
            .context("chatwork get message")?
            .error_for_status()
            .context("chatwork get message non-2xx")?
            .json()
            .await
            .context("decoding chatwork message")?;
        Ok(msg.body)
    }
}
