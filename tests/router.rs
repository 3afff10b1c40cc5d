//! Router tests for requests that are answered before touching the database

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use biblio_server::{api, repository::Repository, services::Services, AppConfig, AppState};

/// Router over a pool that never connects
fn app() -> Router {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let services = Services::new(Repository::new(pool), config.loans);

    api::router(AppState {
        services: Arc::new(services),
    })
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let (status, body) = send(get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = send(get("/api/v1/nowhere")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let (status, body) = send(post_json("/api/v1/users", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn invalid_user_fields_are_rejected() {
    let (status, body) = send(post_json("/api/v1/users", r#"{"name": "", "email": "nope"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("email"));
    assert!(message.contains("name"));
}

#[tokio::test]
async fn unknown_media_kind_is_rejected() {
    let (status, _) = send(post_json(
        "/api/v1/media",
        r#"{"details": {"kind": "vinyl", "title": "Blue"}}"#,
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn loan_dates_must_parse() {
    let (status, _) = send(post_json(
        "/api/v1/loans",
        r#"{"media_id": 1, "user_id": 1, "borrowed_on": "yesterday"}"#,
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_zero_is_rejected() {
    let (status, body) = send(get("/api/v1/users?page=0")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page: page must be between 1 and 1000000");
}

#[tokio::test]
async fn oversized_window_is_rejected() {
    let (status, body) = send(get("/api/v1/loans?page=9223372036854775807&limit=10")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page: page must be between 1 and 1000000");

    let (status, body) = send(get("/api/v1/users?limit=9223372036854775807")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "limit: limit must be between 1 and 100");
}

#[tokio::test]
async fn non_numeric_limit_is_rejected() {
    let (status, _) = send(get("/api/v1/media?limit=many")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_search_is_rejected() {
    let (status, body) = send(get("/api/v1/search?q=%20%20")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "q: search term is required");
}

#[tokio::test]
async fn top_limit_is_bounded() {
    let (status, _) = send(get("/api/v1/stats/top-media?limit=500")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, body) = send(get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Biblio API");
}
