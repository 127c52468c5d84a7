use super::*;
use crate::collector::test_helpers::{ScriptedFetcher, create_test_collector, read_archive, test_config};
use crate::config::Config;
use crate::error::ApiError;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Router over a scripted collector; returns the collector for inspection
fn test_app(config: Config, fetcher: ScriptedFetcher) -> (Router, Arc<ZipCollector>) {
    let (collector, _fetcher) = create_test_collector(config, fetcher);
    let collector = Arc::new(collector);
    (create_router(Arc::clone(&collector)), collector)
}

async fn send(app: &Router, method: &str, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn create(app: &Router) -> u64 {
    let response = send(app, "POST", "/api/zip").await;
    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = body_json(response).await;
    value["id"].as_u64().unwrap()
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown() {
    let mut config = test_config(1, 1, &["txt"]);
    config.api.host = "127.0.0.1".to_string();
    config.api.port = 0;
    let (collector, _) = create_test_collector(config, ScriptedFetcher::new());
    let collector = Arc::new(collector);

    let handle = collector.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;

    collector.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok(), "server returned {result:?}");
}

#[tokio::test]
async fn test_api_server_reports_bind_failure() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = test_config(1, 1, &["txt"]);
    config.api.host = "127.0.0.1".to_string();
    config.api.port = occupied.local_addr().unwrap().port();
    let (collector, _) = create_test_collector(config, ScriptedFetcher::new());

    let result = start_api_server(Arc::new(collector)).await;

    assert!(matches!(result, Err(crate::Error::Io(_))), "got {result:?}");
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _) = test_app(test_config(1, 1, &["txt"]), ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let mut config = test_config(1, 1, &["txt"]);
    config.api.cors_enabled = false;
    let (app, _) = test_app(config, ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let mut config = test_config(1, 1, &["txt"]);
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let (app, _) = test_app(config, ScriptedFetcher::new());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (app, _) = test_app(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let response = send(&app, "GET", "/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = test_config(1, 1, &["txt"]);
    config.api.swagger_ui = false;
    let (app, _) = test_app(config, ScriptedFetcher::new());
    let response = send(&app, "GET", "/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = test_app(test_config(1, 1, &["txt"]), ScriptedFetcher::new());
    let response = send(&app, "GET", "/api/zip/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_body_shape() {
    let (app, _) = test_app(test_config(1, 1, &["txt"]), ScriptedFetcher::new());

    let response = send(&app, "GET", "/api/zip/status?id=5").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let api_error: ApiError = body_json(response).await;
    assert_eq!(api_error.error.code, "task_not_found");
    assert_eq!(api_error.error.details.unwrap()["task_id"], 5);
}
