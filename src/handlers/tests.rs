//! # Tests for Handlers
//!
//! Unit tests for the service info and probe handlers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Json,
};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::db::{init_pool, run_migrations};
use crate::handlers::{healthz, readyz, root};
use crate::server::{create_app, create_test_app_state};

async fn sqlite_state() -> crate::server::AppState {
    let config = AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        operator_tokens: vec!["test-token".to_string()],
        ..Default::default()
    };
    let db = init_pool(&config).await.expect("Failed to init test DB");
    run_migrations(&db).await.expect("Failed to run migrations");
    create_test_app_state(config, db)
}

#[tokio::test]
async fn root_returns_service_info() {
    let Json(info) = root().await;

    assert_eq!(info.service, "peopleops");
    assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn healthz_does_not_touch_the_database() {
    let Json(health) = healthz().await;

    assert_eq!(health.status, "ok");
    assert!(health.database.is_none());
}

#[tokio::test]
async fn readyz_reports_database_state() {
    let state = sqlite_state().await;

    let (status, Json(body)) = readyz(State(state)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.database.as_deref(), Some("ok"));
}

#[tokio::test]
async fn probes_are_public_and_echo_trace_id() {
    let app = create_app(sqlite_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-trace-id", "probe-trace-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "probe-trace-1"
    );
}

#[tokio::test]
async fn api_routes_require_operator_token() {
    let app = create_app(sqlite_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/leave-types")
                .header("X-Tenant-Id", uuid::Uuid::new_v4().to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = create_app(sqlite_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["info"]["title"], "PeopleOps API");
}
