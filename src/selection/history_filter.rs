// src/selection/history_filter.rs
use crate::providers::types::HistoryStore;
use crate::types::Article;

/// Return the first candidate not yet delivered to `room_id`.
///
/// Candidates are scanned in provider order. A failed lookup leaves that
/// candidate undecided: it is skipped and the scan goes on.
pub async fn first_new_article(
    history: &dyn HistoryStore,
    room_id: &str,
    candidates: Vec<Article>,
) -> Option<Article> {
    for candidate in candidates {
        match history.exists(room_id, &candidate.url).await {
            Ok(false) => return Some(candidate),
            Ok(true) => continue,
            Err(e) => {
                tracing::debug!(
                    error = ?e,
                    room_id,
                    url = %candidate.url,
                    "history lookup inconclusive, skipping candidate"
                );
            }
        }
    }
    None
}
