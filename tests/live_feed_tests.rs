// SPDX-License-Identifier: MIT

//! Live sample ingest/stream route tests.
//!
//! These tests verify that:
//! 1. Ingest and stream both sit behind the session middleware
//! 2. A valid session can post samples and open the event stream

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use fitdash::config::Config;
use fitdash::middleware::auth::create_jwt;
use fitdash::routes::create_router;
use fitdash::AppState;
use std::sync::Arc;
use tower::ServiceExt;

mod common;

const SAMPLE_BODY: &str =
    r#"{"ts": 1724668200000, "hr": 72.5, "steps": 4821, "distance_m": 3120.4, "calories": 310.0}"#;

fn create_test_app() -> (axum::Router, Vec<u8>) {
    let config = Config::test_default();
    let signing_key = config.jwt_signing_key.clone();
    let state = Arc::new(AppState::new(config));
    (create_router(state), signing_key)
}

fn post_sample(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/live")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(SAMPLE_BODY)).unwrap()
}

#[tokio::test]
async fn ingest_requires_session() {
    let (app, _) = create_test_app();

    let response = app.oneshot(post_sample(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stream_requires_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/live/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_can_ingest_samples() {
    let (app, signing_key) = create_test_app();
    let token = create_jwt(common::TEST_SUBJECT, &signing_key).unwrap();

    let response = app.oneshot(post_sample(Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn stream_opens_as_server_sent_events() {
    let (app, signing_key) = create_test_app();
    let token = create_jwt(common::TEST_SUBJECT, &signing_key).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/live/stream")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}
