// SPDX-License-Identifier: MIT

//! Fitbit OAuth token record.

use chrono::{DateTime, Utc};

/// One live token record per Fitbit user.
///
/// Access/refresh token and expiry are replaced in place on refresh; the
/// record is only removed on explicit disconnect.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub fitbit_user_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
