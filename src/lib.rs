// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod delivery;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod registration;
pub mod runner;
pub mod selection;
pub mod services;
pub mod telemetry;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::SearchError;
pub use crate::runner::{BatchRunner, RunReport};
pub use crate::selection::{CascadeConfig, SelectionCascade};
pub use crate::services::Services;
pub use crate::types::{Article, Interest, SearchStrategy, SelectionLabel, SelectionOutcome};
