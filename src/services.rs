// src/services.rs
//! Collaborator wiring: real HTTP clients from [`AppConfig`], or in-memory
//! doubles for dry runs and tests.

use std::sync::Arc;

use anyhow::Result;

use crate::config::{AppConfig, Settings};
use crate::delivery::Delivery;
use crate::providers::chatwork::ChatworkClient;
use crate::providers::dry_run::{ReadOnlyHistory, ReadOnlyInterests};
use crate::providers::gemini::GeminiSummarizer;
use crate::providers::memory::{
    MemoryHistory, MemoryInterests, MemoryRooms, MemorySaved, RecordingChat, ScriptedSearch,
    StaticSummarizer,
};
use crate::providers::qiita::QiitaSearchProvider;
use crate::providers::supabase::SupabaseStore;
use crate::providers::types::{
    ChatClient, HistoryStore, InterestStore, RoomDirectory, SavedArticleStore, SearchProvider,
    Summarizer,
};
use crate::registration::Registrar;
use crate::runner::BatchRunner;
use crate::selection::SelectionCascade;

#[derive(Clone)]
pub struct Services {
    pub search: Arc<dyn SearchProvider>,
    pub rooms: Arc<dyn RoomDirectory>,
    pub interests: Arc<dyn InterestStore>,
    pub history: Arc<dyn HistoryStore>,
    pub saved: Arc<dyn SavedArticleStore>,
    pub chat: Arc<dyn ChatClient>,
    pub summarizer: Arc<dyn Summarizer>,
    pub public_base_url: String,
}

impl Services {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let store = Arc::new(SupabaseStore::new(&cfg.supabase_url, &cfg.supabase_key)?);
        Ok(Self {
            search: Arc::new(QiitaSearchProvider::new(&cfg.qiita_base_url, &cfg.qiita_token)?),
            rooms: store.clone(),
            interests: store.clone(),
            history: store.clone(),
            saved: store,
            chat: Arc::new(ChatworkClient::new(&cfg.chatwork_base_url, &cfg.chatwork_token)?),
            summarizer: Arc::new(GeminiSummarizer::new(
                &cfg.gemini_base_url,
                &cfg.gemini_api_key,
                &cfg.gemini_model,
            )?),
            public_base_url: cfg.public_base_url.clone(),
        })
    }

    /// Empty in-memory wiring: no rooms, every search answers an empty page.
    pub fn in_memory() -> Self {
        Self {
            search: Arc::new(ScriptedSearch::default()),
            rooms: Arc::new(MemoryRooms::default()),
            interests: Arc::new(MemoryInterests::default()),
            history: Arc::new(MemoryHistory::default()),
            saved: Arc::new(MemorySaved::default()),
            chat: Arc::new(RecordingChat::default()),
            summarizer: Arc::new(StaticSummarizer::default()),
            public_base_url: crate::config::app::DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }

    /// Keep the read side (rooms, interests, history, search, summarizer) and
    /// suppress every write: history and interest changes are dropped, chat
    /// posts land in the returned [`RecordingChat`] instead of the room.
    pub fn into_dry_run(self) -> (Self, Arc<RecordingChat>) {
        let chat = Arc::new(RecordingChat::default());
        let services = Self {
            interests: Arc::new(ReadOnlyInterests::new(self.interests)),
            history: Arc::new(ReadOnlyHistory::new(self.history)),
            saved: Arc::new(MemorySaved::default()),
            chat: chat.clone(),
            ..self
        };
        (services, chat)
    }

    pub fn cascade(&self, settings: &Settings) -> SelectionCascade {
        SelectionCascade::new(
            self.search.clone(),
            self.history.clone(),
            self.interests.clone(),
            settings.cascade.clone(),
        )
    }

    pub fn delivery(&self) -> Delivery {
        Delivery::new(
            self.chat.clone(),
            self.summarizer.clone(),
            self.history.clone(),
            self.public_base_url.clone(),
        )
    }

    pub fn runner(&self, settings: &Settings) -> BatchRunner {
        BatchRunner::new(self.rooms.clone(), self.cascade(settings), self.delivery())
    }

    pub fn registrar(&self, settings: &Settings) -> Registrar {
        Registrar::new(
            self.search.clone(),
            self.interests.clone(),
            self.chat.clone(),
            settings.registration.clone(),
        )
    }
}
