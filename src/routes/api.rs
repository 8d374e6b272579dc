// SPDX-License-Identifier: MIT

//! Authenticated metric endpoints. Every handler resolves the subject from
//! the session middleware and delegates to a service.

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    HeartIntradayDay, HeartRateDay, HeartRateRange, MetricRange, ReadinessCard, SleepReport,
    StepsSeries, WeightSeries,
};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/readiness", get(get_readiness))
        .route("/api/sleep", get(get_sleep))
        .route("/api/heartrate/day", get(get_heart_day))
        .route("/api/heartrate/range", get(get_heart_range))
        .route("/api/heartrate/intraday", get(get_heart_intraday))
        .route("/api/steps", get(get_steps))
        .route("/api/weight", get(get_weight))
}

#[derive(Deserialize)]
pub struct DateQuery {
    date: Option<NaiveDate>,
}

impl DateQuery {
    fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

#[derive(Deserialize)]
pub struct RangeQuery {
    range: Option<String>,
    date: Option<NaiveDate>,
}

impl RangeQuery {
    fn resolve(&self) -> Result<(MetricRange, NaiveDate)> {
        let range = match self.range.as_deref() {
            Some(raw) => raw
                .parse::<MetricRange>()
                .map_err(|_| AppError::BadRequest(format!("unknown range: {}", raw)))?,
            None => MetricRange::Last7Days,
        };
        Ok((range, self.date.unwrap_or_else(|| Utc::now().date_naive())))
    }
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let token = state.tokens.get_valid_token(&user.subject).await?;
    let profile = state.fitbit.get_profile(&token.access_token).await?;
    let user_info = profile.user.unwrap_or_default();
    Ok(Json(serde_json::json!({
        "userId": token.fitbit_user_id,
        "fullName": user_info.full_name,
        "age": user_info.age,
        "gender": user_info.gender,
    })))
}

async fn get_readiness(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ReadinessCard>> {
    let card = state
        .readiness
        .get_readiness_card(&user.subject, query.date_or_today())
        .await?;
    Ok(Json(card))
}

async fn get_sleep(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SleepReport>> {
    let report = state
        .sleep
        .get_sleep(&user.subject, query.date_or_today())
        .await?;
    Ok(Json(report))
}

async fn get_heart_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<HeartRateDay>> {
    let day = state
        .heart
        .get_day(&user.subject, query.date_or_today())
        .await?;
    Ok(Json(day))
}

async fn get_heart_range(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<HeartRateRange>> {
    let (range, date) = query.resolve()?;
    let series = state.heart.get_range(&user.subject, range, date).await?;
    Ok(Json(series))
}

async fn get_heart_intraday(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DateQuery>,
) -> Result<Json<HeartIntradayDay>> {
    let day = state
        .intraday
        .get_day(&user.subject, query.date_or_today())
        .await?;
    Ok(Json(day))
}

async fn get_steps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<StepsSeries>> {
    let (range, date) = query.resolve()?;
    let series = state.steps.get_steps(&user.subject, range, date).await?;
    Ok(Json(series))
}

async fn get_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<WeightSeries>> {
    let (range, date) = query.resolve()?;
    let series = state.weight.get_weight(&user.subject, range, date).await?;
    Ok(Json(series))
}
