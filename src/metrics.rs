use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register metric descriptions.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        describe_metrics();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_rooms_total", "Rooms processed by batch runs.");
        describe_counter!(
            "digest_articles_delivered_total",
            "Articles posted to rooms, by cascade stage."
        );
        describe_counter!(
            "digest_rooms_skipped_total",
            "Rooms with no unseen article in a run."
        );
        describe_counter!(
            "digest_delivery_errors_total",
            "Selected articles that could not be delivered."
        );
        describe_counter!(
            "digest_interests_pruned_total",
            "Interests removed after every topic stage came back empty."
        );
        describe_counter!(
            "digest_search_errors_total",
            "Search calls that failed, by kind."
        );
        describe_counter!(
            "qiita_rate_limited_total",
            "Rate-limit answers from the Qiita API."
        );
        describe_counter!(
            "digest_interests_registered_total",
            "Interests added through registration."
        );
        describe_histogram!("digest_search_ms", "Search round-trip time in milliseconds.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the last batch started.");
    });
}
