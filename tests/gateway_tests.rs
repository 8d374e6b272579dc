// SPDX-License-Identifier: MIT

//! Upstream response classification tests.
//!
//! These tests verify that:
//! 1. 429 responses become `RateLimited` with the Retry-After value
//! 2. 403/404 on metrics that legitimately lack data become empty payloads
//! 3. Other non-2xx responses become `Upstream` errors
//! 4. Token refresh failure degrades the connection without dropping it

use chrono::NaiveDate;
use fitdash::error::AppError;
use fitdash::services::TokenService;
use std::sync::Arc;

mod common;

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/1/user/-/activities/heart/date/2026-08-26/2026-08-26.json")
        .with_status(429)
        .with_header("Retry-After", "30")
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let client = common::test_client(&server.url());
    let err = client
        .get_heart_for_day(common::TEST_ACCESS, day("2026-08-26"))
        .await
        .unwrap_err();

    match err {
        AppError::RateLimited { retry_after, .. } => assert_eq!(retry_after, Some(30)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn hrv_missing_becomes_empty_payload() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/1/user/-/hrv/date/2026-08-26.json")
        .with_status(404)
        .with_body(r#"{"errors":[{"errorType":"not_found"}]}"#)
        .create_async()
        .await;

    let client = common::test_client(&server.url());
    let hrv = client
        .get_hrv(common::TEST_ACCESS, day("2026-08-26"))
        .await
        .unwrap();

    assert_eq!(hrv.daily_samples().count(), 0);
}

#[tokio::test]
async fn cardio_score_forbidden_becomes_empty_payload() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/1/user/-/cardioscore/date/2026-08-26.json")
        .with_status(403)
        .with_body("insufficient scope")
        .create_async()
        .await;

    let client = common::test_client(&server.url());
    let cardio = client
        .get_cardio_score(common::TEST_ACCESS, day("2026-08-26"))
        .await
        .unwrap();

    assert!(cardio.vo2_max_text().is_none());
}

#[tokio::test]
async fn server_error_becomes_upstream() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/1/user/-/activities/steps/date/2026-08-20/2026-08-26.json")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = common::test_client(&server.url());
    let err = client
        .get_steps_series(common::TEST_ACCESS, day("2026-08-20"), day("2026-08-26"))
        .await
        .unwrap_err();

    match err {
        AppError::Upstream { status, body } => {
            assert_eq!(status, Some(500));
            assert!(body.contains("internal error"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_data_on_regular_metric_is_still_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/1.2/user/-/sleep/date/2026-08-26.json")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let client = common::test_client(&server.url());
    let err = client
        .get_sleep(common::TEST_ACCESS, day("2026-08-26"))
        .await
        .unwrap_err();

    match err {
        AppError::Upstream { status, .. } => assert_eq!(status, Some(404)),
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_is_refreshed_before_use() {
    let mut server = mockito::Server::new_async().await;
    let token_mock = server
        .mock("POST", "/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "access_token": "fresh-access-token",
                "refresh_token": "fresh-refresh-token",
                "token_type": "Bearer",
                "scope": "activity heartrate sleep",
                "user_id": "ABC123",
                "expires_in": 28800
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let tokens = TokenService::new(common::test_client(&server.url()));
    tokens.insert_record(common::expired_record());

    let record = tokens.get_valid_token(common::TEST_SUBJECT).await.unwrap();
    assert_eq!(record.access_token, "fresh-access-token");
    assert_eq!(record.refresh_token, "fresh-refresh-token");
    token_mock.assert_async().await;

    // A second call uses the cached fresh token; no extra grant happens.
    let again = tokens.get_valid_token(common::TEST_SUBJECT).await.unwrap();
    assert_eq!(again.access_token, "fresh-access-token");
    token_mock.assert_async().await;
}

#[tokio::test]
async fn refresh_failure_degrades_but_keeps_record() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/oauth2/token")
        .with_status(400)
        .with_body(r#"{"errors":[{"errorType":"invalid_grant"}]}"#)
        .create_async()
        .await;

    let tokens = TokenService::new(common::test_client(&server.url()));
    tokens.insert_record(common::expired_record());

    let err = tokens
        .get_valid_token(common::TEST_SUBJECT)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConnectionDegraded));

    // The record survives so a later refresh can still be attempted.
    assert!(tokens.is_connected(common::TEST_SUBJECT));
}

#[tokio::test]
async fn unknown_subject_has_no_token() {
    let server = mockito::Server::new_async().await;
    let tokens = Arc::new(TokenService::new(common::test_client(&server.url())));

    let err = tokens.get_valid_token("nobody").await.unwrap_err();
    assert!(matches!(err, AppError::NoToken));
}
