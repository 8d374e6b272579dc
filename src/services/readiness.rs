// SPDX-License-Identifier: MIT

//! Readiness card aggregation.
//!
//! Fans out to the upstream endpoints concurrently and composes a card
//! that is always fully populated: every branch failure below this layer
//! is folded to a documented neutral default. The exceptions are rate
//! limiting (surfaced so the caller can back off with the retry-after
//! hint) and credential failures (no point degrading gracefully without
//! any token).

use crate::error::AppError;
use crate::models::heart::{HeartRateDay, HeartRateRange, HeartZones};
use crate::models::{
    ActivityLoad, MetricRange, ReadinessCard, ReadinessInputs, SleepReport, SleepTrend,
};
use crate::scoring::estimate_readiness;
use crate::services::fitbit::{ActivitySummaryResponse, CardioScoreResponse, FitbitClient, HrvResponse};
use crate::services::heart::HeartRateService;
use crate::services::sleep::SleepService;
use crate::services::token::TokenService;
use chrono::{Days, NaiveDate};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Total deadline for one card composition.
const AGGREGATION_DEADLINE_SECS: u64 = 30;

/// Exercise-day threshold on activity calories.
const EXERCISE_DAY_CALORIES: i32 = 250;

/// Neutral resting heart rate when no data exists at all.
const RHR_BASELINE_BPM: i32 = 60;

/// Neutral HRV daily sample when no data exists at all.
const HRV_BASELINE: f64 = 50.0;

pub struct ReadinessService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
    heart: Arc<HeartRateService>,
    sleep: Arc<SleepService>,
}

impl ReadinessService {
    pub fn new(
        tokens: Arc<TokenService>,
        client: FitbitClient,
        heart: Arc<HeartRateService>,
        sleep: Arc<SleepService>,
    ) -> Self {
        Self {
            tokens,
            client,
            heart,
            sleep,
        }
    }

    /// Compose the readiness card for one date.
    pub async fn get_readiness_card(
        &self,
        subject: &str,
        date: NaiveDate,
    ) -> Result<ReadinessCard, AppError> {
        // Credential failures abort before any fan-out.
        let token = self.tokens.get_valid_token(subject).await?;

        tokio::time::timeout(
            Duration::from_secs(AGGREGATION_DEADLINE_SECS),
            self.compose(subject, &token.access_token, date),
        )
        .await
        .map_err(|_| AppError::Upstream {
            status: None,
            body: "readiness aggregation deadline exceeded".to_string(),
        })?
    }

    async fn compose(
        &self,
        subject: &str,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<ReadinessCard, AppError> {
        let (vo2, exercise_days, readiness_score) = tokio::join!(
            self.client.get_cardio_score(access_token, date),
            self.exercise_days(access_token, date),
            self.estimate(subject, access_token, date),
        );

        let vo2 = or_neutral(vo2, CardioScoreResponse::default, "vo2-max")?;
        let exercise_days = exercise_days?;
        let readiness_score = readiness_score?;

        let vo2_max = vo2.vo2_max_text().map(str::to_string);
        let cardio_load_score = vo2_max.as_deref().and_then(parse_vo2_lower_bound);

        Ok(ReadinessCard {
            date,
            readiness_score,
            cardio_load_score,
            readiness_status: "ESTIMATED".to_string(),
            vo2_max,
            exercise_days,
        })
    }

    /// Count days from the Monday of `date`'s week through `date` whose
    /// activity calories exceed the exercise threshold. A single day's
    /// failure is swallowed; it neither counts nor aborts the others.
    async fn exercise_days(&self, access_token: &str, date: NaiveDate) -> Result<u32, AppError> {
        let monday = MetricRange::CurrentWeek.start_date(date);
        let mut days = Vec::new();
        let mut current = monday;
        while current <= date {
            days.push(current);
            current = current + Days::new(1);
        }

        let fetches = days
            .iter()
            .map(|d| self.client.get_activity_summary(access_token, *d));
        let results = join_all(fetches).await;

        let mut count = 0;
        for (day, result) in days.iter().zip(results) {
            match result {
                Ok(summary) if summary.activity_calories() > EXERCISE_DAY_CALORIES => count += 1,
                Ok(_) => {}
                Err(e) if e.is_fatal_for_aggregation() => return Err(e),
                Err(e) => {
                    tracing::warn!(date = %day, error = %e, "Activity summary fetch failed during exercise-day count");
                }
            }
        }

        Ok(count)
    }

    /// Fan out the six estimation inputs, fold failures to neutral
    /// defaults, and run the estimator. Always yields a clamped score.
    async fn estimate(
        &self,
        subject: &str,
        access_token: &str,
        date: NaiveDate,
    ) -> Result<i32, AppError> {
        let hrv_range_start = date - Days::new(7);
        let hrv_range_end = date - Days::new(1);

        let (today_hr, week_hr, sleep, activity, hrv_today, hrv_range) = tokio::join!(
            self.heart.get_day(subject, date),
            self.heart.get_range(subject, MetricRange::Last7Days, date),
            self.sleep.get_sleep(subject, date),
            self.client.get_activity_summary(access_token, date),
            self.client.get_hrv(access_token, date),
            self.client.get_hrv_range(access_token, hrv_range_start, hrv_range_end),
        );

        let today_hr = or_neutral(
            today_hr,
            || HeartRateDay {
                date,
                resting_hr: None,
                zones: HeartZones::default(),
            },
            "today-heart",
        )?;
        let week_hr = or_neutral(
            week_hr,
            || HeartRateRange {
                range: MetricRange::Last7Days.as_str().to_string(),
                start: MetricRange::Last7Days.start_date(date),
                end: date,
                points: Vec::new(),
            },
            "week-heart",
        )?;
        let sleep = or_neutral(sleep, || SleepReport::empty(&date.to_string()), "sleep")?;
        let activity = or_neutral(activity, ActivitySummaryResponse::default, "activity")?;
        let hrv_today = or_neutral(hrv_today, HrvResponse::default, "hrv-today")?;
        let hrv_range = or_neutral(hrv_range, HrvResponse::default, "hrv-range")?;

        let (hrv_percent_change, rhr_delta_bpm) = (
            hrv_percent_change(&hrv_today, &hrv_range),
            rhr_delta(&today_hr, &week_hr),
        );

        let sleep_trend = SleepTrend::from_score(Some(sleep.sleep_score).filter(|s| *s > 0));
        let activity_load = ActivityLoad::from_activity_calories(activity.activity_calories());

        let inputs = ReadinessInputs {
            hrv_percent_change,
            rhr_delta_bpm,
            sleep_trend,
            activity_load,
        };

        Ok(estimate_readiness(&inputs))
    }
}

/// Fold a branch result: keep successes, convert non-fatal failures to the
/// neutral default, and let rate-limit/credential errors abort.
fn or_neutral<T>(
    result: Result<T, AppError>,
    neutral: impl FnOnce() -> T,
    branch: &str,
) -> Result<T, AppError> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_fatal_for_aggregation() => Err(e),
        Err(e) => {
            tracing::warn!(branch, error = %e, "Readiness branch failed, using neutral default");
            Ok(neutral())
        }
    }
}

/// Lower bound of a `"NN-MM"` VO2-max range.
fn parse_vo2_lower_bound(text: &str) -> Option<i32> {
    text.split('-').next()?.trim().parse().ok()
}

/// Resting-heart-rate delta against the zero-excluded 7-day average.
///
/// Today's value falls back, in order: most recent non-zero range value,
/// range average, fixed 60 bpm baseline.
fn rhr_delta(today: &HeartRateDay, week: &HeartRateRange) -> i32 {
    let week_values: Vec<i32> = week
        .points
        .iter()
        .filter_map(|p| p.resting_hr)
        .filter(|r| *r > 0)
        .collect();

    let average = if week_values.is_empty() {
        None
    } else {
        Some(week_values.iter().map(|v| f64::from(*v)).sum::<f64>() / week_values.len() as f64)
    };

    let today_rhr = today
        .resting_hr
        .filter(|r| *r > 0)
        .or_else(|| week_values.last().copied())
        .or_else(|| average.map(|a| a.round() as i32))
        .unwrap_or(RHR_BASELINE_BPM);

    let average = average.unwrap_or(f64::from(today_rhr));
    (f64::from(today_rhr) - average) as i32
}

/// HRV percent change of today's sample against the trailing-range average.
///
/// Today's sample falls back to the latest non-zero range sample, then to
/// the fixed neutral baseline.
fn hrv_percent_change(today: &HrvResponse, range: &HrvResponse) -> f64 {
    let range_samples: Vec<f64> = range.daily_samples().filter(|v| *v > 0.0).collect();

    let today_sample = today
        .daily_samples()
        .find(|v| *v > 0.0)
        .or_else(|| range_samples.last().copied())
        .unwrap_or(HRV_BASELINE);

    let average = if range_samples.is_empty() {
        today_sample
    } else {
        range_samples.iter().sum::<f64>() / range_samples.len() as f64
    };

    (today_sample - average) / average.max(1.0) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::heart::HeartRangePoint;

    fn day(resting_hr: Option<i32>) -> HeartRateDay {
        HeartRateDay {
            date: "2026-08-30".parse().unwrap(),
            resting_hr,
            zones: HeartZones::default(),
        }
    }

    fn week(values: &[Option<i32>]) -> HeartRateRange {
        let base: NaiveDate = "2026-08-24".parse().unwrap();
        HeartRateRange {
            range: "LAST_7_DAYS".to_string(),
            start: base,
            end: "2026-08-30".parse().unwrap(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| HeartRangePoint {
                    date: base + Days::new(i as u64),
                    resting_hr: *v,
                    zones: HeartZones::default(),
                })
                .collect(),
        }
    }

    fn hrv(samples: &[f64]) -> HrvResponse {
        let json = serde_json::json!({
            "hrv": samples
                .iter()
                .map(|s| serde_json::json!({"value": {"dailySample": s}}))
                .collect::<Vec<_>>()
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_vo2_lower_bound() {
        assert_eq!(parse_vo2_lower_bound("45-49"), Some(45));
        assert_eq!(parse_vo2_lower_bound(" 38 -42"), Some(38));
        assert_eq!(parse_vo2_lower_bound("not-a-range"), None);
        assert_eq!(parse_vo2_lower_bound(""), None);
    }

    #[test]
    fn test_rhr_delta_against_week_average() {
        // today 62, week average (60+58+62)/3 = 60 -> delta 2
        let delta = rhr_delta(&day(Some(62)), &week(&[Some(60), Some(58), Some(62)]));
        assert_eq!(delta, 2);
    }

    #[test]
    fn test_rhr_missing_today_uses_latest_week_value() {
        // today absent -> 58 (last non-zero), average 59 -> delta -1
        let delta = rhr_delta(&day(None), &week(&[Some(60), Some(0), Some(58)]));
        assert_eq!(delta, -1);
    }

    #[test]
    fn test_rhr_everything_missing_falls_back_to_baseline() {
        // No data anywhere: 60 bpm baseline, delta 0.
        let delta = rhr_delta(&day(None), &week(&[]));
        assert_eq!(delta, 0);

        let delta = rhr_delta(&day(Some(0)), &week(&[None, Some(0)]));
        assert_eq!(delta, 0);
    }

    #[test]
    fn test_hrv_percent_change() {
        // today 60 vs average 50 -> +20%
        let pct = hrv_percent_change(&hrv(&[60.0]), &hrv(&[45.0, 55.0]));
        assert!((pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_hrv_missing_today_uses_latest_range_sample() {
        // today absent -> latest range sample 55, average 50 -> +10%
        let pct = hrv_percent_change(&hrv(&[]), &hrv(&[45.0, 55.0]));
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_hrv_everything_missing_is_neutral() {
        let pct = hrv_percent_change(&hrv(&[]), &hrv(&[]));
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn test_or_neutral_folds_upstream_but_not_rate_limit() {
        let folded = or_neutral::<i32>(
            Err(AppError::Upstream {
                status: Some(500),
                body: String::new(),
            }),
            || 7,
            "test",
        );
        assert_eq!(folded.unwrap(), 7);

        let fatal = or_neutral::<i32>(
            Err(AppError::RateLimited {
                retry_after: Some(30),
                body: String::new(),
            }),
            || 7,
            "test",
        );
        assert!(matches!(fatal, Err(AppError::RateLimited { .. })));
    }
}
