// src/error.rs
use thiserror::Error;

/// Failures of a single search call.
///
/// Transport and parse failures are skipped page by page; a rate limit aborts
/// the current stage.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search transport error: {0}")]
    Transport(String),

    #[error("search response parse error: {0}")]
    Parse(String),

    #[error("search provider rate limit reached: {0}")]
    RateLimited(String),
}

impl SearchError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Parse(_) => "parse",
            Self::RateLimited(_) => "rate_limited",
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
