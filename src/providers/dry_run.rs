// src/providers/dry_run.rs
//! Write-suppressing wrappers for `run-batch --dry-run`: reads go to the
//! real stores, writes are logged and dropped.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use super::types::{HistoryStore, InterestStore};
use crate::types::Interest;

pub struct ReadOnlyHistory {
    inner: Arc<dyn HistoryStore>,
}

impl ReadOnlyHistory {
    pub fn new(inner: Arc<dyn HistoryStore>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl HistoryStore for ReadOnlyHistory {
    async fn exists(&self, room_id: &str, url: &str) -> Result<bool> {
        self.inner.exists(room_id, url).await
    }

    async fn record(&self, room_id: &str, url: &str) -> Result<()> {
        info!(room_id, url, "dry run: history not recorded");
        Ok(())
    }
}

/// Lists and counts from the real store. Deletes are reported as done so the
/// run report shows what would be pruned.
pub struct ReadOnlyInterests {
    inner: Arc<dyn InterestStore>,
}

impl ReadOnlyInterests {
    pub fn new(inner: Arc<dyn InterestStore>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl InterestStore for ReadOnlyInterests {
    async fn list(&self, room_id: &str) -> Result<Vec<Interest>> {
        self.inner.list(room_id).await
    }

    async fn delete(&self, room_id: &str, topic: &str) -> Result<()> {
        info!(room_id, topic, "dry run: interest not deleted");
        Ok(())
    }

    async fn insert(&self, interest: &Interest) -> Result<()> {
        bail!(
            "dry run: refusing to store interest {} for room {}",
            interest.topic,
            interest.room_id
        )
    }

    async fn count(&self, room_id: &str) -> Result<usize> {
        self.inner.count(room_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory::{MemoryHistory, MemoryInterests};

    #[tokio::test]
    async fn history_reads_through_and_drops_writes() {
        let inner = Arc::new(MemoryHistory::default());
        inner.seed("r1", "https://seen");
        let history = ReadOnlyHistory::new(inner.clone());

        assert!(history.exists("r1", "https://seen").await.unwrap());
        history.record("r1", "https://new").await.unwrap();
        assert!(!inner.contains("r1", "https://new"));
    }

    #[tokio::test]
    async fn interests_keep_rows_and_refuse_inserts() {
        let inner = Arc::new(MemoryInterests::with(vec![Interest::new("r1", "Go", 3)]));
        let interests = ReadOnlyInterests::new(inner.clone());

        assert_eq!(interests.count("r1").await.unwrap(), 1);
        interests.delete("r1", "Go").await.unwrap();
        assert!(interests
            .insert(&Interest::new("r1", "Rust", 3))
            .await
            .is_err());
        assert_eq!(inner.snapshot(), vec![Interest::new("r1", "Go", 3)]);
        assert!(inner.deleted().is_empty());
    }
}
