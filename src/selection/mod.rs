// src/selection/mod.rs
//! Article selection engine: weighted topic pick, query building, history
//! dedup and the fallback cascade that ties them together.

pub mod cascade;
pub mod history_filter;
pub mod query;
pub mod selector;

pub use cascade::{CascadeConfig, SelectionCascade, StageOutcome};
pub use history_filter::first_new_article;
pub use query::{QueryLimits, SearchQuery};
pub use selector::pick_weighted;
