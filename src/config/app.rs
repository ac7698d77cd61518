// src/config/app.rs
//! Endpoints and credentials for the external services.
//!
//! Assembled once at startup and passed down explicitly; nothing below the
//! binaries reads the process environment.

use crate::providers::{
    chatwork::DEFAULT_CHATWORK_BASE_URL,
    gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL},
    qiita::DEFAULT_QIITA_BASE_URL,
};

pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

#[derive(Clone, Default)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub chatwork_token: String,
    pub chatwork_base_url: String,
    pub qiita_token: String,
    pub qiita_base_url: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    /// Public URL of this service, used to build save links.
    pub public_base_url: String,
}

impl AppConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |k: &str, d: &str| get(k).unwrap_or_else(|| d.to_string());

        Self {
            supabase_url: or("SUPABASE_URL", ""),
            supabase_key: or("SUPABASE_KEY", ""),
            chatwork_token: or("CHATWORK_API_TOKEN", ""),
            chatwork_base_url: or("CHATWORK_BASE_URL", DEFAULT_CHATWORK_BASE_URL),
            qiita_token: or("QIITA_ACCESS_TOKEN", ""),
            qiita_base_url: or("QIITA_BASE_URL", DEFAULT_QIITA_BASE_URL),
            gemini_api_key: or("GEMINI_API_KEY", ""),
            gemini_base_url: or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            gemini_model: or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            public_base_url: or("BASE_URL", DEFAULT_PUBLIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Names of required settings that are unset.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("SUPABASE_URL", &self.supabase_url),
            ("SUPABASE_KEY", &self.supabase_key),
            ("CHATWORK_API_TOKEN", &self.chatwork_token),
            ("QIITA_ACCESS_TOKEN", &self.qiita_token),
            ("GEMINI_API_KEY", &self.gemini_api_key),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

// Secrets stay out of logs; only their presence is shown.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key_set", &!self.supabase_key.is_empty())
            .field("chatwork_token_set", &!self.chatwork_token.is_empty())
            .field("chatwork_base_url", &self.chatwork_base_url)
            .field("qiita_token_set", &!self.qiita_token.is_empty())
            .field("qiita_base_url", &self.qiita_base_url)
            .field("gemini_key_set", &!self.gemini_api_key.is_empty())
            .field("gemini_model", &self.gemini_model)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}
