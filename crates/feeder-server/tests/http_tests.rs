//! Plain HTTP behaviour of the hub: health endpoint and asset serving.
//!
//! These tests drive the router directly with `oneshot`, so no socket is bound
//! and the WebSocket upgrade path is never taken.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode, header};
use feeder_server::build_router;
use feeder_server::config::Config;
use feeder_server::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Feeder</h1>").unwrap();
    std::fs::write(dir.path().join("style.css"), "body { margin: 0; }").unwrap();

    let config = Config {
        static_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config));
    let app = build_router(state.clone())
        .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    (app, state, dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_health_reports_counts() {
    let (app, state, _dir) = test_app();
    state.store.lock().await.upsert("dev1");

    let (status, _, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 0);
    assert_eq!(json["devices"], 1);
}

#[tokio::test]
async fn test_root_serves_index() {
    let (app, _state, _dir) = test_app();

    let (status, content_type, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert_eq!(body, "<h1>Feeder</h1>");
}

#[tokio::test]
async fn test_asset_content_type() {
    let (app, _state, _dir) = test_app();

    let (status, content_type, _) = get(app, "/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/css"));
}

#[tokio::test]
async fn test_missing_asset_is_plain_404() {
    let (app, _state, _dir) = test_app();

    let (status, _, body) = get(app, "/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 Not Found");
}

#[tokio::test]
async fn test_parent_segments_rejected() {
    let (app, _state, _dir) = test_app();

    let (status, _, body) = get(app, "/../Cargo.toml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "400 Bad Request");
}

#[tokio::test]
async fn test_plain_get_on_ws_path_is_not_upgraded() {
    let (app, _state, _dir) = test_app();

    // No Upgrade headers, so /ws falls through to the asset server
    let (status, _, _) = get(app, "/ws").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
