// tests/api_http.rs
use std::sync::Arc;

use article_digest_bot::config::Settings;
use article_digest_bot::providers::memory::{
    MemoryHistory, MemoryInterests, MemoryRooms, MemorySaved, RecordingChat, ScriptedSearch,
    StaticSummarizer,
};
use article_digest_bot::providers::types::{ChatClient, RoomDirectory};
use article_digest_bot::types::Article;
use article_digest_bot::{router, AppState, Services};
use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use tokio::sync::Notify;
use tower::ServiceExt;

struct App {
    search: Arc<ScriptedSearch>,
    interests: Arc<MemoryInterests>,
    chat: Arc<RecordingChat>,
    saved: Arc<MemorySaved>,
    router: Router,
}

fn app(rooms: &[&str]) -> App {
    let search = Arc::new(ScriptedSearch::default());
    let interests = Arc::new(MemoryInterests::default());
    let chat = Arc::new(RecordingChat::default());
    let saved = Arc::new(MemorySaved::default());
    let services = Services {
        search: search.clone(),
        rooms: Arc::new(MemoryRooms::new(rooms.iter().copied())),
        interests: interests.clone(),
        history: Arc::new(MemoryHistory::default()),
        saved: saved.clone(),
        chat: chat.clone(),
        summarizer: Arc::new(StaticSummarizer::default()),
        public_base_url: "http://localhost:8080".into(),
    };
    let router = router(AppState::new(services, &Settings::default()));
    App {
        search,
        interests,
        chat,
        saved,
        router,
    }
}

async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_and_keepalive() {
    let a = app(&[]);
    let (status, body) = call(&a.router, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = call(&a.router, Method::HEAD, "/keepalive").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_requires_both_params() {
    let a = app(&[]);
    for uri in ["/register", "/register?room_id=1", "/register?message=rust"] {
        let (status, _) = call(&a.router, Method::GET, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn register_stores_topics_and_confirms() {
    let a = app(&[]);
    a.search.items(
        "title:Rust",
        1,
        vec![Article {
            url: "https://hit".into(),
            ..Default::default()
        }],
    );

    let (status, body) = call(
        &a.router,
        Method::GET,
        "/register?room_id=7&message=rust%2Czzz-nothing",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let topics: Vec<String> = a.interests.snapshot().into_iter().map(|i| i.topic).collect();
    assert_eq!(topics, vec!["Rust"]);
    assert_eq!(a.chat.posted_to("7"), vec!["Rust を登録しました"]);
}

#[tokio::test]
async fn register_reports_failed_confirmation() {
    let a = app(&[]);
    a.search.items("title:Rust", 1, vec![Article::default()]);
    a.chat.fail_room("7");

    let (status, body) = call(&a.router, Method::GET, "/register?room_id=7&message=rust").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "failed to send confirmation message");
}

#[tokio::test]
async fn save_copies_the_posted_message() {
    let a = app(&[]);
    let id = a.chat.post_message("9", "[info]an article[/info]").await.unwrap();

    for method in [Method::GET, Method::POST] {
        let (status, body) = call(
            &a.router,
            method,
            &format!("/save?room_id=9&message_id={id}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("記事を保存しました"));
    }

    assert_eq!(
        a.saved.rows(),
        vec![
            ("9".to_string(), "[info]an article[/info]".to_string()),
            ("9".to_string(), "[info]an article[/info]".to_string()),
        ]
    );
}

#[tokio::test]
async fn save_rejects_missing_or_unknown_message() {
    let a = app(&[]);
    let (status, _) = call(&a.router, Method::GET, "/save?room_id=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&a.router, Method::GET, "/save?room_id=9&message_id=404").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(a.saved.rows().is_empty());
}

#[tokio::test]
async fn root_runs_a_batch_and_returns_the_report() {
    let a = app(&["r1"]);
    a.search.items(
        "stocks:>=30",
        1,
        vec![Article {
            title: "Popular".into(),
            url: "https://popular/1".into(),
            body: "body text".into(),
            ..Default::default()
        }],
    );

    let (status, body) = call(&a.router, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let room = &json["rooms"][0];
    assert_eq!(room["room_id"], "r1");
    assert_eq!(room["status"], "delivered");
    assert_eq!(room["url"], "https://popular/1");
    assert_eq!(room["stage"], "unscoped");
    assert_eq!(a.chat.posted_to("r1").len(), 2);
}

/// Room directory that parks the batch until the test releases it.
#[derive(Default)]
struct GatedRooms {
    entered: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl RoomDirectory for GatedRooms {
    async fn list_rooms(&self) -> anyhow::Result<Vec<String>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn overlapping_batch_trigger_is_refused() {
    let gate = Arc::new(GatedRooms::default());
    let services = Services {
        rooms: gate.clone(),
        ..Services::in_memory()
    };
    let router = router(AppState::new(services, &Settings::default()));

    let first = tokio::spawn({
        let router = router.clone();
        async move { call(&router, Method::GET, "/").await }
    });
    gate.entered.notified().await;

    let (status, body) = call(&router, Method::GET, "/").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already running"));

    gate.release.notify_one();
    let (status, _) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
}
