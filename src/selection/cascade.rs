// src/selection/cascade.rs
//! Per-room selection cascade.
//!
//! ```text
//! pick interest ─► topic stages (tag, title) ─► prune interest ─► unscoped
//!        └─ no interests ─────────────────────────────────────────► unscoped
//! ```
//!
//! Each stage walks result pages `1..=pages_per_stage` and stops at the first
//! article missing from the room's history. At most one article per room per
//! run is ever returned.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use metrics::{counter, histogram};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::history_filter::first_new_article;
use super::query::{QueryLimits, SearchQuery};
use super::selector::pick_weighted;
use crate::providers::types::{HistoryStore, InterestStore, SearchProvider};
use crate::types::{
    Article, Interest, RoomSelection, SearchStrategy, SelectedArticle, SelectionLabel,
    SelectionOutcome,
};

pub const DEFAULT_PAGES_PER_STAGE: u32 = 4;

fn default_pages_per_stage() -> u32 {
    DEFAULT_PAGES_PER_STAGE
}
fn default_topic_stages() -> Vec<SearchStrategy> {
    vec![SearchStrategy::TagSearch, SearchStrategy::TitleSearch]
}
fn default_true() -> bool {
    true
}

/// Stage order and page budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    #[serde(default = "default_pages_per_stage")]
    pub pages_per_stage: u32,
    /// Stages tried with the picked topic before falling back to `unscoped`.
    #[serde(default = "default_topic_stages")]
    pub topic_stages: Vec<SearchStrategy>,
    /// Delete an interest once every topic stage came back empty-handed.
    #[serde(default = "default_true")]
    pub prune_exhausted: bool,
    #[serde(default)]
    pub limits: QueryLimits,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            pages_per_stage: DEFAULT_PAGES_PER_STAGE,
            topic_stages: default_topic_stages(),
            prune_exhausted: true,
            limits: QueryLimits::default(),
        }
    }
}

/// How a single stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Found(Article),
    /// Ran its whole page budget (or hit an empty page) with at least one
    /// page answered, and found nothing new.
    Exhausted,
    /// Rate limited, or no page answered at all.
    Inconclusive,
}

pub struct SelectionCascade {
    search: Arc<dyn SearchProvider>,
    history: Arc<dyn HistoryStore>,
    interests: Arc<dyn InterestStore>,
    cfg: CascadeConfig,
    rng: Mutex<StdRng>,
}

impl SelectionCascade {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        history: Arc<dyn HistoryStore>,
        interests: Arc<dyn InterestStore>,
        cfg: CascadeConfig,
    ) -> Self {
        Self::with_rng(search, history, interests, cfg, StdRng::from_os_rng())
    }

    /// Same as [`SelectionCascade::new`] with a caller-supplied RNG (seeded in tests).
    pub fn with_rng(
        search: Arc<dyn SearchProvider>,
        history: Arc<dyn HistoryStore>,
        interests: Arc<dyn InterestStore>,
        cfg: CascadeConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            search,
            history,
            interests,
            cfg,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.cfg
    }

    /// Run the cascade for one room.
    pub async fn select(&self, room_id: &str) -> RoomSelection {
        let interests = match self.interests.list(room_id).await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = ?e, room_id, "interest lookup failed, using unscoped fallback");
                Vec::new()
            }
        };
        let usable: Vec<Interest> = interests
            .into_iter()
            .filter(|i| !i.topic.trim().is_empty())
            .collect();

        match self.pick_topic(&usable) {
            Some(interest) => self.run_with_topic(room_id, &interest).await,
            None => {
                debug!(room_id, "room has no interests");
                RoomSelection {
                    outcome: self.run_unscoped(room_id).await,
                    pruned_topic: None,
                }
            }
        }
    }

    fn pick_topic(&self, interests: &[Interest]) -> Option<Interest> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pick_weighted(interests, &mut *rng).cloned()
    }

    async fn run_with_topic(&self, room_id: &str, interest: &Interest) -> RoomSelection {
        let topic = interest.topic.trim();
        info!(room_id, topic, priority = interest.priority, "picked interest");

        let mut all_exhausted = !self.cfg.topic_stages.is_empty();
        for &strategy in &self.cfg.topic_stages {
            match self.run_stage(room_id, strategy, topic).await {
                StageOutcome::Found(article) => {
                    return RoomSelection {
                        outcome: SelectionOutcome::Found(SelectedArticle {
                            article,
                            label: SelectionLabel::Topic(interest.topic.clone()),
                            stage: strategy,
                        }),
                        pruned_topic: None,
                    };
                }
                StageOutcome::Exhausted => {}
                StageOutcome::Inconclusive => all_exhausted = false,
            }
        }

        let mut pruned_topic = None;
        if self.cfg.prune_exhausted && all_exhausted {
            match self.interests.delete(room_id, &interest.topic).await {
                Ok(()) => {
                    info!(room_id, topic, "interest exhausted, removed");
                    counter!("digest_interests_pruned_total").increment(1);
                    pruned_topic = Some(interest.topic.clone());
                }
                Err(e) => warn!(error = ?e, room_id, topic, "failed to remove exhausted interest"),
            }
        } else if !all_exhausted {
            debug!(room_id, topic, "topic stages inconclusive, interest kept");
        }

        RoomSelection {
            outcome: self.run_unscoped(room_id).await,
            pruned_topic,
        }
    }

    async fn run_unscoped(&self, room_id: &str) -> SelectionOutcome {
        match self.run_stage(room_id, SearchStrategy::Unscoped, "").await {
            StageOutcome::Found(article) => SelectionOutcome::Found(SelectedArticle {
                article,
                label: SelectionLabel::Generic,
                stage: SearchStrategy::Unscoped,
            }),
            StageOutcome::Exhausted | StageOutcome::Inconclusive => SelectionOutcome::NotFound,
        }
    }

    /// Page through one strategy until a new article turns up.
    pub async fn run_stage(
        &self,
        room_id: &str,
        strategy: SearchStrategy,
        topic: &str,
    ) -> StageOutcome {
        let mut answered = false;

        for page in 1..=self.cfg.pages_per_stage {
            let query = SearchQuery::build(strategy, topic, page, &self.cfg.limits);
            let t0 = Instant::now();
            let result = self.search.search(&query).await;
            histogram!("digest_search_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            let items = match result {
                Ok(items) => items,
                Err(e) if e.is_rate_limit() => {
                    warn!(error = %e, room_id, stage = %strategy, page, "rate limited, abandoning stage");
                    counter!("digest_search_errors_total", "kind" => e.kind()).increment(1);
                    return StageOutcome::Inconclusive;
                }
                Err(e) => {
                    warn!(error = %e, room_id, stage = %strategy, page, "search failed, trying next page");
                    counter!("digest_search_errors_total", "kind" => e.kind()).increment(1);
                    continue;
                }
            };
            answered = true;

            if items.is_empty() {
                debug!(room_id, stage = %strategy, page, "no more results");
                break;
            }

            let count = items.len();
            if let Some(article) = first_new_article(self.history.as_ref(), room_id, items).await {
                info!(room_id, stage = %strategy, page, url = %article.url, "found unseen article");
                return StageOutcome::Found(article);
            }
            debug!(room_id, stage = %strategy, page, count, "page fully seen");
        }

        if answered {
            StageOutcome::Exhausted
        } else {
            StageOutcome::Inconclusive
        }
    }
}
