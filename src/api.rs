// src/api.rs
//! HTTP surface:
//! - `GET /`            run one batch over all rooms
//! - `GET /register`    register interests from a chat message
//! - `GET|POST /save`   keep a posted article for later
//! - `HEAD /keepalive`  uptime pings
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, head},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::registration::Registrar;
use crate::runner::BatchRunner;
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    runner: Arc<BatchRunner>,
    registrar: Arc<Registrar>,
    services: Services,
    /// Held for the duration of a batch; overlapping triggers are refused.
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(services: Services, settings: &Settings) -> Self {
        Self {
            runner: Arc::new(services.runner(settings)),
            registrar: Arc::new(services.registrar(settings)),
            services,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(run_batch))
        .route("/register", get(register))
        .route("/save", get(save_article).post(save_article))
        .route("/keepalive", head(|| async { StatusCode::OK }))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn run_batch(State(state): State<AppState>) -> Response {
    let Ok(_guard) = state.run_lock.try_lock() else {
        warn!("batch trigger ignored, previous run still in progress");
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "a batch is already running" })),
        )
            .into_response();
    };

    match state.runner.run_once().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!(error = ?e, "batch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "failed to load rooms" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegisterParams {
    #[serde(default)]
    message: String,
    #[serde(default)]
    room_id: String,
}

async fn register(State(state): State<AppState>, Query(q): Query<RegisterParams>) -> Response {
    if q.message.trim().is_empty() || q.room_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "message and room_id are required").into_response();
    }

    match state.registrar.register(q.room_id.trim(), &q.message).await {
        Ok(report) => {
            info!(
                room_id = %q.room_id,
                registered = report.registered.len(),
                skipped = report.skipped.len(),
                "registration handled"
            );
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => {
            error!(error = ?e, room_id = %q.room_id, "registration confirmation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to send confirmation message" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveParams {
    #[serde(default)]
    room_id: String,
    #[serde(default)]
    message_id: String,
}

const SAVED_PAGE: &str = r#"<html>
	<head>
		<title>保存完了</title>
		<meta charset="utf-8">
	</head>
	<body>
		<h1>記事を保存しました</h1>
		<p>このページは閉じて構いません。</p>
	</body>
</html>"#;

async fn save_article(State(state): State<AppState>, Query(q): Query<SaveParams>) -> Response {
    if q.room_id.is_empty() || q.message_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "room_id and message_id are required").into_response();
    }
    info!(room_id = %q.room_id, message_id = %q.message_id, "save requested");

    let body = match state
        .services
        .chat
        .get_message(&q.room_id, &q.message_id)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            error!(error = ?e, room_id = %q.room_id, "fetching chat message failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch message").into_response();
        }
    };

    if let Err(e) = state.services.saved.save(&q.room_id, &body).await {
        error!(error = ?e, room_id = %q.room_id, "saving article failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to save article").into_response();
    }

    Html(SAVED_PAGE).into_response()
}
