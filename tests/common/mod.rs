// SPDX-License-Identifier: MIT

use chrono::{Duration, Utc};
use fitdash::models::TokenRecord;
use fitdash::services::{FitbitClient, TokenService};
use std::sync::Arc;

#[allow(dead_code)]
pub const TEST_SUBJECT: &str = "ABC123";
#[allow(dead_code)]
pub const TEST_ACCESS: &str = "test-access-token";

/// A Fitbit client pointed at a local mock server.
#[allow(dead_code)]
pub fn test_client(server_url: &str) -> FitbitClient {
    FitbitClient::new(
        server_url.to_string(),
        format!("{}/oauth2/token", server_url),
        "client-id".to_string(),
        "client-secret".to_string(),
    )
}

/// A token record that will not need refreshing during a test.
#[allow(dead_code)]
pub fn valid_record() -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        fitbit_user_id: TEST_SUBJECT.to_string(),
        access_token: TEST_ACCESS.to_string(),
        refresh_token: "test-refresh-token".to_string(),
        token_type: Some("Bearer".to_string()),
        scope: Some("activity heartrate sleep".to_string()),
        expires_at: now + Duration::hours(1),
        created_at: now,
        updated_at: now,
    }
}

/// A token record that expired an hour ago.
#[allow(dead_code)]
pub fn expired_record() -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        expires_at: now - Duration::hours(1),
        ..valid_record()
    }
}

/// Token service seeded with one connected subject.
#[allow(dead_code)]
pub fn seeded_tokens(client: FitbitClient) -> Arc<TokenService> {
    let tokens = Arc::new(TokenService::new(client));
    tokens.insert_record(valid_record());
    tokens
}
