// SPDX-License-Identifier: MIT

//! Fitbit API client: the single chokepoint for all upstream calls.
//!
//! Handles:
//! - Bearer-authenticated resource fetches (heart, sleep, activity, ...)
//! - OAuth token endpoint calls (authorization_code and refresh_token grants)
//! - Rate limit classification (HTTP 429 with Retry-After hint)
//! - "No data" tolerance for HRV and cardio-score endpoints

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Per-call deadline so a hung upstream call cannot stall a request.
const UPSTREAM_CALL_TIMEOUT_SECS: u64 = 10;

/// Intraday time-series granularity, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailLevel {
    OneMin,
    FiveMin,
    FifteenMin,
}

impl DetailLevel {
    /// Probe order: finer resolution is preferred but not always available.
    pub const PROBE_ORDER: [DetailLevel; 3] = [
        DetailLevel::OneMin,
        DetailLevel::FiveMin,
        DetailLevel::FifteenMin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::OneMin => "1min",
            DetailLevel::FiveMin => "5min",
            DetailLevel::FifteenMin => "15min",
        }
    }
}

/// Fitbit API client.
#[derive(Clone)]
pub struct FitbitClient {
    http: reqwest::Client,
    base_url: String,
    token_uri: String,
    client_id: String,
    client_secret: String,
}

impl FitbitClient {
    /// Create a new Fitbit client with OAuth credentials.
    pub fn new(
        base_url: String,
        token_uri: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        // Constructed once at startup; a default client would lose the
        // per-call deadline, so a builder failure is fatal here.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_CALL_TIMEOUT_SECS))
            .build()
            .expect("Failed to construct HTTP client");
        Self {
            http,
            base_url,
            token_uri,
            client_id,
            client_secret,
        }
    }

    // ─── Resource fetches ────────────────────────────────────────────────────

    /// Get the authenticated user's profile.
    pub async fn get_profile(&self, access_token: &str) -> Result<ProfileResponse, AppError> {
        let url = format!("{}/1/user/-/profile.json", self.base_url);
        self.get_json(&url, access_token, false).await
    }

    /// Daily step counts for an inclusive date range.
    pub async fn get_steps_series(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StepsSeriesResponse, AppError> {
        let url = format!(
            "{}/1/user/-/activities/steps/date/{}/{}.json",
            self.base_url, start, end
        );
        self.get_json(&url, access_token, false).await
    }

    /// Daily heart summaries for an inclusive date range.
    pub async fn get_heart_range(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HeartRangeResponse, AppError> {
        let url = format!(
            "{}/1/user/-/activities/heart/date/{}/{}.json",
            self.base_url, start, end
        );
        self.get_json(&url, access_token, false).await
    }

    /// Single-day heart summary (range endpoint with start = end).
    pub async fn get_heart_for_day(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<HeartRangeResponse, AppError> {
        self.get_heart_range(access_token, date, date).await
    }

    /// Intraday heart-rate series for one day at the given detail level.
    pub async fn get_heart_intraday(
        &self,
        access_token: &str,
        date: NaiveDate,
        level: DetailLevel,
    ) -> Result<IntradayResponse, AppError> {
        let url = format!(
            "{}/1/user/-/activities/heart/date/{}/1d/{}.json",
            self.base_url,
            date,
            level.as_str()
        );
        self.get_json(&url, access_token, false).await
    }

    /// Daily activity summary (calories etc.) for one day.
    pub async fn get_activity_summary(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<ActivitySummaryResponse, AppError> {
        let url = format!("{}/1/user/-/activities/date/{}.json", self.base_url, date);
        self.get_json(&url, access_token, false).await
    }

    /// Weight log entries for an inclusive date range.
    pub async fn get_weight_series(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeightResponse, AppError> {
        let url = format!(
            "{}/1/user/-/body/log/weight/date/{}/{}.json",
            self.base_url, start, end
        );
        self.get_json(&url, access_token, false).await
    }

    /// Sleep sessions logged for one date.
    pub async fn get_sleep(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<SleepResponse, AppError> {
        let url = format!("{}/1.2/user/-/sleep/date/{}.json", self.base_url, date);
        self.get_json(&url, access_token, false).await
    }

    /// Cardio fitness (VO2 max) score for one date.
    ///
    /// Known to 404 for users without cardio fitness history, so missing
    /// data is returned as an empty payload rather than an error.
    pub async fn get_cardio_score(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<CardioScoreResponse, AppError> {
        let url = format!("{}/1/user/-/cardioscore/date/{}.json", self.base_url, date);
        self.get_json(&url, access_token, true).await
    }

    /// HRV daily sample for one date. Missing data yields an empty payload.
    pub async fn get_hrv(
        &self,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<HrvResponse, AppError> {
        let url = format!("{}/1/user/-/hrv/date/{}.json", self.base_url, date);
        self.get_json(&url, access_token, true).await
    }

    /// HRV daily samples for an inclusive date range. Missing data yields an
    /// empty payload.
    pub async fn get_hrv_range(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HrvResponse, AppError> {
        let url = format!("{}/1/user/-/hrv/date/{}/{}.json", self.base_url, start, end);
        self.get_json(&url, access_token, true).await
    }

    // ─── Token endpoint ──────────────────────────────────────────────────────

    /// Exchange an authorization code + PKCE verifier for a token set.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        self.token_grant(&[
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("code_verifier", verifier),
        ])
        .await
    }

    /// Refresh an expired access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_grant(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// POST to the token endpoint with Basic client credentials.
    async fn token_grant(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let basic = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .http
            .post(&self.token_uri)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", basic))
            .form(form)
            .send()
            .await
            .map_err(transport_error)?;

        Self::classify(response, false).await
    }

    // ─── Response classification ─────────────────────────────────────────────

    /// Generic bearer-authenticated GET with JSON response.
    async fn get_json<T>(
        &self,
        url: &str,
        access_token: &str,
        missing_ok: bool,
    ) -> Result<T, AppError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        Self::classify(response, missing_ok).await
    }

    /// Classify a response, in priority order: 429 rate limit, tolerated
    /// missing data (404/403 when `missing_ok`), other non-2xx, then JSON.
    async fn classify<T>(response: reqwest::Response, missing_ok: bool) -> Result<T, AppError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(?retry_after, "Fitbit rate limit hit (429)");
            return Err(AppError::RateLimited { retry_after, body });
        }

        if missing_ok && matches!(status.as_u16(), 403 | 404) {
            tracing::debug!(status = status.as_u16(), "Fitbit resource has no data");
            return Ok(T::default());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                body,
            });
        }

        response.json().await.map_err(|e| AppError::Upstream {
            status: None,
            body: format!("JSON parse error: {}", e),
        })
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Upstream {
        status: None,
        body: e.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire payloads (parsed Fitbit JSON)
// ─────────────────────────────────────────────────────────────────────────────

/// Token endpoint response (both grant types).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    pub user: Option<ProfileUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub encoded_id: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepsSeriesResponse {
    #[serde(rename = "activities-steps", default)]
    pub activities_steps: Vec<StepsItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsItem {
    pub date_time: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeartRangeResponse {
    #[serde(rename = "activities-heart", default)]
    pub activities_heart: Vec<ActivityHeart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityHeart {
    pub date_time: String,
    pub value: Option<HeartValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartValue {
    pub resting_heart_rate: Option<i32>,
    #[serde(default)]
    pub heart_rate_zones: Vec<WireZone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireZone {
    pub name: Option<String>,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntradayResponse {
    #[serde(rename = "activities-heart-intraday")]
    pub intraday: Option<IntradaySeries>,
}

impl IntradayResponse {
    /// The dataset, empty when the payload carries none.
    pub fn dataset(&self) -> &[IntradayDataPoint] {
        self.intraday
            .as_ref()
            .map(|i| i.dataset.as_slice())
            .unwrap_or_default()
    }

    pub fn has_data(&self) -> bool {
        !self.dataset().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntradaySeries {
    #[serde(default)]
    pub dataset: Vec<IntradayDataPoint>,
    pub dataset_interval: Option<i32>,
    pub dataset_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntradayDataPoint {
    pub time: String,
    pub value: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivitySummaryResponse {
    pub summary: Option<ActivitySummary>,
}

impl ActivitySummaryResponse {
    /// Activity calories, zero when the summary is missing.
    pub fn activity_calories(&self) -> i32 {
        self.summary
            .as_ref()
            .and_then(|s| s.activity_calories)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub calories_out: Option<i32>,
    pub activity_calories: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeightResponse {
    #[serde(default)]
    pub weight: Vec<WeightLog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightLog {
    pub date: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleepResponse {
    #[serde(default)]
    pub sleep: Vec<SleepLog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLog {
    pub date_of_sleep: Option<String>,
    /// Session duration in milliseconds.
    pub duration: Option<i64>,
    pub efficiency: Option<i64>,
    pub is_main_sleep: Option<bool>,
    pub levels: Option<SleepLevels>,
    pub minutes_asleep: Option<i64>,
    pub minutes_awake: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_in_bed: Option<i64>,
    // Some provider versions report these snake_cased scores.
    #[serde(rename = "sleep_score")]
    pub sleep_score: Option<i32>,
    #[serde(rename = "efficiency_score")]
    pub efficiency_score: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleepLevels {
    pub summary: Option<SleepStageSummary>,
    #[serde(default)]
    pub data: Vec<SleepLevelData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleepStageSummary {
    pub deep: Option<StageDetail>,
    pub light: Option<StageDetail>,
    pub rem: Option<StageDetail>,
    pub wake: Option<StageDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageDetail {
    pub minutes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLevelData {
    pub date_time: String,
    pub level: String,
    pub seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HrvResponse {
    #[serde(default)]
    pub hrv: Vec<HrvEntry>,
}

impl HrvResponse {
    /// Daily samples in payload order, skipping entries without a value.
    pub fn daily_samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.hrv
            .iter()
            .filter_map(|e| e.value.as_ref().and_then(|v| v.daily_sample))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrvEntry {
    pub date_time: Option<String>,
    pub value: Option<HrvValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrvValue {
    pub daily_sample: Option<f64>,
    pub deep_sleep: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardioScoreResponse {
    #[serde(default)]
    pub cardioscore: Vec<CardioEntry>,
}

impl CardioScoreResponse {
    /// The reported VO2-max text, e.g. `"45-49"`.
    pub fn vo2_max_text(&self) -> Option<&str> {
        self.cardioscore
            .first()
            .and_then(|e| e.value.as_ref())
            .and_then(|v| v.vo2_max.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioEntry {
    pub date_time: Option<String>,
    pub value: Option<CardioValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioValue {
    pub vo2_max: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_level_probe_order() {
        let names: Vec<&str> = DetailLevel::PROBE_ORDER
            .iter()
            .map(|l| l.as_str())
            .collect();
        assert_eq!(names, vec!["1min", "5min", "15min"]);
    }

    #[test]
    fn test_heart_range_payload_parses() {
        let json = r#"{
            "activities-heart": [
                {
                    "dateTime": "2026-08-30",
                    "value": {
                        "restingHeartRate": 58,
                        "heartRateZones": [
                            {"name": "Out of Range", "min": 30, "max": 110, "minutes": 1200}
                        ]
                    }
                }
            ]
        }"#;
        let parsed: HeartRangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.activities_heart.len(), 1);
        let value = parsed.activities_heart[0].value.as_ref().unwrap();
        assert_eq!(value.resting_heart_rate, Some(58));
        assert_eq!(value.heart_rate_zones[0].minutes, Some(1200));
    }

    #[test]
    fn test_intraday_payload_dataset() {
        let json = r#"{
            "activities-heart-intraday": {
                "dataset": [{"time": "00:00:00", "value": 61}],
                "datasetInterval": 1,
                "datasetType": "minute"
            }
        }"#;
        let parsed: IntradayResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.has_data());
        assert_eq!(parsed.dataset()[0].value, 61);

        let empty: IntradayResponse = serde_json::from_str("{}").unwrap();
        assert!(!empty.has_data());
    }

    #[test]
    fn test_hrv_payload_samples() {
        let json = r#"{
            "hrv": [
                {"dateTime": "2026-08-29", "value": {"dailySample": 52.5, "deepSleep": 48.0}},
                {"dateTime": "2026-08-30", "value": null}
            ]
        }"#;
        let parsed: HrvResponse = serde_json::from_str(json).unwrap();
        let samples: Vec<f64> = parsed.daily_samples().collect();
        assert_eq!(samples, vec![52.5]);

        let empty: HrvResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.daily_samples().count(), 0);
    }

    #[test]
    fn test_cardio_score_text() {
        let json = r#"{"cardioscore": [{"dateTime": "2026-08-30", "value": {"vo2Max": "45-49"}}]}"#;
        let parsed: CardioScoreResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.vo2_max_text(), Some("45-49"));
    }
}
