// SPDX-License-Identifier: MIT

//! OAuth token lifecycle: storage, transparent refresh and the PKCE
//! connect flow.
//!
//! Every upstream caller goes through [`TokenService::get_valid_token`],
//! which guarantees a currently-valid access token. Refreshes are
//! serialized per subject so concurrent dashboard requests cannot race
//! each other into duplicate refresh calls.

use crate::error::AppError;
use crate::models::TokenRecord;
use crate::services::fitbit::FitbitClient;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Margin before expiry when we proactively refresh.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

/// Pending PKCE sessions older than this are rejected on callback.
const PENDING_AUTH_TTL_MINS: i64 = 10;

/// Passive ownership boundary for token records, keyed by Fitbit user id.
#[derive(Default)]
pub struct TokenStore {
    records: DashMap<String, TokenRecord>,
}

impl TokenStore {
    pub fn get(&self, subject: &str) -> Option<TokenRecord> {
        self.records.get(subject).map(|r| r.clone())
    }

    pub fn put(&self, record: TokenRecord) {
        self.records.insert(record.fitbit_user_id.clone(), record);
    }

    pub fn remove(&self, subject: &str) -> Option<TokenRecord> {
        self.records.remove(subject).map(|(_, r)| r)
    }
}

/// PKCE state persisted between `/start` and `/callback`, single use.
struct PendingAuth {
    verifier: String,
    created_at: DateTime<Utc>,
}

/// Token lifecycle manager.
pub struct TokenService {
    client: FitbitClient,
    store: TokenStore,
    /// Per-subject mutex to serialize token refresh operations.
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Outstanding PKCE sessions keyed by OAuth state.
    pending_auth: DashMap<String, PendingAuth>,
}

impl TokenService {
    pub fn new(client: FitbitClient) -> Self {
        Self {
            client,
            store: TokenStore::default(),
            refresh_locks: DashMap::new(),
            pending_auth: DashMap::new(),
        }
    }

    // ─── Token lifecycle ─────────────────────────────────────────────────────

    /// Get a currently-valid token record for the subject, refreshing via the
    /// provider's token endpoint when expired or near expiry.
    ///
    /// Fails with [`AppError::NoToken`] if the subject never connected, and
    /// with [`AppError::ConnectionDegraded`] when a refresh fails; the stored
    /// record is kept in that case so the caller can retry later.
    pub async fn get_valid_token(&self, subject: &str) -> Result<TokenRecord, AppError> {
        let record = self.store.get(subject).ok_or(AppError::NoToken)?;
        if Self::still_valid(&record) {
            return Ok(record);
        }

        // Serialize the refresh per subject; concurrent callers wait here and
        // then pick up the winner's token in the revalidation below.
        let lock = self
            .refresh_locks
            .entry(subject.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let mut record = self.store.get(subject).ok_or(AppError::NoToken)?;
        if Self::still_valid(&record) {
            return Ok(record);
        }

        tracing::info!(subject, "Fitbit access token expired or near expiry, refreshing");
        let refreshed = match self.client.refresh_token(&record.refresh_token).await {
            Ok(r) => r,
            Err(e) => {
                // A transient network fault must not sever the connection, so
                // the record stays in place for a later retry.
                tracing::warn!(subject, error = %e, "Fitbit token refresh failed");
                return Err(AppError::ConnectionDegraded);
            }
        };

        record.access_token = refreshed.access_token;
        record.refresh_token = refreshed.refresh_token;
        record.token_type = refreshed.token_type.or(record.token_type);
        record.scope = refreshed.scope.or(record.scope);
        record.expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
        record.updated_at = Utc::now();
        self.store.put(record.clone());

        Ok(record)
    }

    fn still_valid(record: &TokenRecord) -> bool {
        record.expires_at > Utc::now() + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }

    /// Seed or replace a record directly (OAuth callback, tests).
    pub fn insert_record(&self, record: TokenRecord) {
        self.store.put(record);
    }

    /// True if the subject has a stored record.
    pub fn is_connected(&self, subject: &str) -> bool {
        self.store.get(subject).is_some()
    }

    /// Remove the record on explicit disconnect.
    pub fn disconnect(&self, subject: &str) {
        if self.store.remove(subject).is_some() {
            tracing::info!(subject, "Fitbit token record removed");
        }
        self.refresh_locks.remove(subject);
    }

    // ─── PKCE connect flow ───────────────────────────────────────────────────

    /// Begin a PKCE authorization: returns `(state, challenge)` and stores
    /// the verifier against the state for single use at callback time.
    pub fn begin_authorization(&self) -> Result<(String, String), AppError> {
        let state = random_urlsafe(16)?;
        let verifier = random_urlsafe(32)?;
        let challenge = pkce_challenge_s256(&verifier);

        self.pending_auth.insert(
            state.clone(),
            PendingAuth {
                verifier,
                created_at: Utc::now(),
            },
        );

        Ok((state, challenge))
    }

    /// Complete the PKCE flow: verify the returned state, exchange the code
    /// and verifier for a token set, and upsert the record keyed by the
    /// provider-returned user id. Returns the stored record.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
        redirect_uri: &str,
    ) -> Result<TokenRecord, AppError> {
        // Session values are discarded after single use.
        let (_, pending) = self
            .pending_auth
            .remove(state)
            .ok_or_else(|| AppError::BadRequest("unknown or reused OAuth state".to_string()))?;

        if Utc::now() - pending.created_at > Duration::minutes(PENDING_AUTH_TTL_MINS) {
            return Err(AppError::BadRequest("OAuth state expired".to_string()));
        }

        let token = self
            .client
            .exchange_code(code, &pending.verifier, redirect_uri)
            .await?;

        let subject = token
            .user_id
            .clone()
            .ok_or_else(|| AppError::Upstream {
                status: None,
                body: "token response missing user_id".to_string(),
            })?;

        let now = Utc::now();
        let created_at = self
            .store
            .get(&subject)
            .map(|r| r.created_at)
            .unwrap_or(now);

        let record = TokenRecord {
            fitbit_user_id: subject.clone(),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            token_type: token.token_type,
            scope: token.scope,
            expires_at: now + Duration::seconds(token.expires_in),
            created_at,
            updated_at: now,
        };
        self.store.put(record.clone());

        tracing::info!(subject, "Fitbit OAuth successful, token record stored");
        Ok(record)
    }
}

/// Cryptographically random bytes, base64url-encoded without padding.
fn random_urlsafe(len: usize) -> Result<String, AppError> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// S256 code challenge: base64url(SHA-256(verifier)), no padding.
fn pkce_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
