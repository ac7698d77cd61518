// src/providers/mod.rs
pub mod chatwork;
pub mod dry_run;
pub mod gemini;
pub mod memory;
pub mod qiita;
pub mod supabase;
pub mod types;

pub use types::{
    ChatClient, HistoryStore, InterestStore, RoomDirectory, SavedArticleStore, SearchProvider,
    Summarizer,
};
