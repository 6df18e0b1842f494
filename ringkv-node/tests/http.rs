use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use ringkv_engine::CacheEngine;
use ringkv_node::http::{router, AppState};

fn build_app() -> axum::Router {
    let state = Arc::new(AppState {
        engine: Arc::new(CacheEngine::new(10)),
        port: 9001,
        shutdown: tokio::sync::Notify::new(),
    });
    router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn set_then_get_roundtrips() {
    let app = build_app();

    let set_req = Request::builder()
        .method(Method::POST)
        .uri("/cache")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"key":"a","value":"1"}"#))
        .unwrap();
    let resp = app.clone().oneshot(set_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let get_req = Request::builder().uri("/cache/a").body(Body::empty()).unwrap();
    let resp = app.oneshot(get_req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["value"], "1");
    assert_eq!(json["hit"], true);
}

#[tokio::test]
async fn get_missing_key_is_404() {
    let app = build_app();
    let req = Request::builder().uri("/cache/missing").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_reports_whether_key_existed() {
    let app = build_app();

    let set_req = Request::builder()
        .method(Method::POST)
        .uri("/cache")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"key":"a","value":"1"}"#))
        .unwrap();
    app.clone().oneshot(set_req).await.unwrap();

    let del_req = Request::builder()
        .method(Method::DELETE)
        .uri("/cache/a")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(del_req).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["deleted"], true);

    let del_again = Request::builder()
        .method(Method::DELETE)
        .uri("/cache/a")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(del_again).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["deleted"], false);
}

#[tokio::test]
async fn health_reports_configured_port() {
    let app = build_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["port"], 9001);
}
