// src/runner.rs
//! One batch: every registered room, one at a time, cascade then delivery.
//! A failure in one room is logged and the next room is still processed.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::delivery::Delivery;
use crate::metrics::describe_metrics;
use crate::providers::types::RoomDirectory;
use crate::selection::SelectionCascade;
use crate::types::{SearchStrategy, SelectionLabel, SelectionOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoomStatus {
    Delivered {
        url: String,
        label: SelectionLabel,
        stage: SearchStrategy,
    },
    NotFound,
    DeliveryFailed {
        url: String,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomReport {
    pub room_id: String,
    #[serde(flatten)]
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned_topic: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub rooms: Vec<RoomReport>,
}

impl RunReport {
    pub fn delivered(&self) -> usize {
        self.count(|s| matches!(s, RoomStatus::Delivered { .. }))
    }

    pub fn not_found(&self) -> usize {
        self.count(|s| matches!(s, RoomStatus::NotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, RoomStatus::DeliveryFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&RoomStatus) -> bool) -> usize {
        self.rooms.iter().filter(|r| pred(&r.status)).count()
    }
}

pub struct BatchRunner {
    rooms: Arc<dyn RoomDirectory>,
    cascade: SelectionCascade,
    delivery: Delivery,
}

impl BatchRunner {
    pub fn new(rooms: Arc<dyn RoomDirectory>, cascade: SelectionCascade, delivery: Delivery) -> Self {
        Self {
            rooms,
            cascade,
            delivery,
        }
    }

    /// Process every room once. Fails only when the room list itself cannot
    /// be read.
    pub async fn run_once(&self) -> Result<RunReport> {
        describe_metrics();
        let started_at = Utc::now();

        let room_ids = self.rooms.list_rooms().await.context("listing rooms")?;
        info!(rooms = room_ids.len(), "batch started");

        let mut rooms = Vec::with_capacity(room_ids.len());
        for room_id in room_ids {
            if room_id.trim().is_empty() {
                continue;
            }
            let report = self.run_room(&room_id).await;
            counter!("digest_rooms_total").increment(1);
            rooms.push(report);
        }

        let report = RunReport { started_at, rooms };
        gauge!("digest_last_run_ts").set(started_at.timestamp() as f64);
        info!(
            delivered = report.delivered(),
            not_found = report.not_found(),
            failed = report.failed(),
            "batch finished"
        );
        Ok(report)
    }

    async fn run_room(&self, room_id: &str) -> RoomReport {
        let selection = self.cascade.select(room_id).await;

        let status = match selection.outcome {
            SelectionOutcome::NotFound => {
                info!(room_id, "no new article, room skipped");
                counter!("digest_rooms_skipped_total").increment(1);
                RoomStatus::NotFound
            }
            SelectionOutcome::Found(selected) => {
                match self.delivery.deliver(room_id, &selected).await {
                    Ok(done) => {
                        counter!("digest_articles_delivered_total", "stage" => selected.stage.as_str())
                            .increment(1);
                        RoomStatus::Delivered {
                            url: done.url,
                            label: selected.label,
                            stage: selected.stage,
                        }
                    }
                    Err(e) => {
                        warn!(error = ?e, room_id, url = %selected.article.url, "delivery failed");
                        counter!("digest_delivery_errors_total").increment(1);
                        RoomStatus::DeliveryFailed {
                            url: selected.article.url,
                            error: format!("{e:#}"),
                        }
                    }
                }
            }
        };

        RoomReport {
            room_id: room_id.to_string(),
            status,
            pruned_topic: selection.pruned_topic,
        }
    }
}
