// SPDX-License-Identifier: MIT

//! Readiness card DTO and estimator input types.

use chrono::NaiveDate;
use serde::Serialize;

/// Composed readiness card returned to the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessCard {
    pub date: NaiveDate,
    /// Always a clamped integer in [1, 100], even under total upstream
    /// unavailability.
    pub readiness_score: i32,
    /// Lower bound of the VO2-max range, when Fitbit reports one.
    pub cardio_load_score: Option<i32>,
    pub readiness_status: String,
    pub vo2_max: Option<String>,
    /// Days this week (Monday through `date`) with activity calories > 250.
    pub exercise_days: u32,
}

/// Inputs to the readiness estimator, recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessInputs {
    pub hrv_percent_change: f64,
    pub rhr_delta_bpm: i32,
    pub sleep_trend: Option<SleepTrend>,
    pub activity_load: ActivityLoad,
}

/// Sleep quality bucket derived from the estimated sleep score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SleepTrend {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SleepTrend {
    /// Bucket a sleep score; `None` when the score is unavailable.
    pub fn from_score(score: Option<i32>) -> Option<Self> {
        let score = score?;
        Some(if score >= 80 {
            SleepTrend::Excellent
        } else if score >= 70 {
            SleepTrend::Good
        } else if score >= 60 {
            SleepTrend::Fair
        } else {
            SleepTrend::Poor
        })
    }
}

/// Categorized active-calorie burn for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLoad {
    Rest,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ActivityLoad {
    pub fn from_activity_calories(calories: i32) -> Self {
        if calories > 1500 {
            ActivityLoad::VeryHigh
        } else if calories > 1000 {
            ActivityLoad::High
        } else if calories > 500 {
            ActivityLoad::Moderate
        } else if calories > 200 {
            ActivityLoad::Low
        } else {
            ActivityLoad::Rest
        }
    }
}
