//! Article digest bot: service entrypoint.
//! Boots the Axum HTTP server; an external cron hits `GET /` to run a batch.

use article_digest_bot::{
    api,
    config::{load_settings_default, AppConfig},
    metrics::Metrics,
    telemetry, Services,
};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = AppConfig::from_env();
    info!(config = ?cfg, "configuration loaded");
    let missing = cfg.missing();
    if !missing.is_empty() {
        warn!(?missing, "required settings are unset; affected calls will fail");
    }

    let settings = load_settings_default()?;
    info!(cascade = ?settings.cascade, "selection settings loaded");

    let services = Services::from_config(&cfg)?;
    let state = api::AppState::new(services, &settings);
    let mut router = api::router(state);

    match Metrics::init() {
        Ok(metrics) => router = router.merge(metrics.router()),
        Err(e) => warn!(error = ?e, "prometheus recorder not installed"),
    }

    Ok(router.into())
}
