// src/providers/gemini.rs
//! Article summarization through the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::types::Summarizer;
use crate::types::Article;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Bodies past this many characters are cut before prompting.
const MAX_BODY_CHARS: usize = 20_000;

pub fn summary_prompt(body: &str) -> String {
    let body: String = body.chars().take(MAX_BODY_CHARS).collect();
    format!(
        "以下の記事を日本語の箇条書きで80字以内で読みたくなるように要約して（箇条の部分以外で*を使わないで）：\n\n{body}"
    )
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn first_text(resp: GenerateResponse) -> Option<String> {
    resp.candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .next()
        .map(|p| p.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub struct GeminiSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiSummarizer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("article-digest-bot/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building gemini http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, article: &Article) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("GEMINI_API_KEY is not set");
        }
        let prompt = summary_prompt(&article.body);
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt }],
            }],
        };
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let resp: GenerateResponse = self
            .http
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&req)
            .send()
            .await
            .context("gemini request")?
            .error_for_status()
            .context("gemini non-2xx")?
            .json()
            .await
            .context("decoding gemini response")?;
        first_text(resp).ok_or_else(|| anyhow!("gemini returned no content"))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
