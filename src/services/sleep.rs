// SPDX-License-Identifier: MIT

//! Sleep report composition with estimated quality score.

use crate::error::AppError;
use crate::models::sleep::{SleepSegment, StageSummary};
use crate::models::SleepReport;
use crate::scoring::{estimate_sleep_score, SleepInputs};
use crate::services::fitbit::{FitbitClient, SleepLog};
use crate::services::token::TokenService;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct SleepService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
}

impl SleepService {
    pub fn new(tokens: Arc<TokenService>, client: FitbitClient) -> Self {
        Self { tokens, client }
    }

    /// Sleep report for one date: main-session stages, segments and the
    /// estimated quality score.
    pub async fn get_sleep(&self, subject: &str, date: NaiveDate) -> Result<SleepReport, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;
        let raw = self.client.get_sleep(&token.access_token, date).await?;

        if raw.sleep.is_empty() {
            return Ok(SleepReport::empty(&date.to_string()));
        }

        // isMainSleep marks the primary session; naps are extra sessions.
        let main = raw
            .sleep
            .iter()
            .find(|s| s.is_main_sleep == Some(true))
            .unwrap_or(&raw.sleep[0]);

        let summary = stage_summary(main);
        let segments = segments(main);

        let total_sleep_min = main.minutes_asleep.unwrap_or(0) as i32;
        let session_count = raw.sleep.len() as i32;
        // Session duration is reported in milliseconds.
        let longest_session_min = main.duration.map(|ms| (ms / 60_000) as i32).unwrap_or(0);

        let score = self.score(main, &summary, total_sleep_min, session_count, longest_session_min);

        Ok(SleepReport {
            date: main
                .date_of_sleep
                .clone()
                .unwrap_or_else(|| date.to_string()),
            total_minutes_asleep: total_sleep_min,
            total_time_in_bed: main.time_in_bed.unwrap_or(0) as i32,
            sleep_score: score,
            start_time: main.start_time.clone(),
            end_time: main.end_time.clone(),
            levels_summary: summary,
            segments,
        })
    }

    /// Estimated score, falling back to whatever score the provider reports
    /// when the estimator cannot run.
    fn score(
        &self,
        main: &SleepLog,
        summary: &StageSummary,
        total_sleep_min: i32,
        session_count: i32,
        longest_session_min: i32,
    ) -> i32 {
        if total_sleep_min > 0 {
            let inputs = SleepInputs {
                total_sleep_min,
                rem_min: summary.rem,
                deep_min: summary.deep,
                awake_min: main.minutes_awake.unwrap_or(0) as i32,
                session_count,
                longest_session_min,
            };
            if let Ok(result) = estimate_sleep_score(&inputs) {
                return result.score;
            }
        }

        if let Some(s) = main.sleep_score.filter(|s| *s > 0) {
            s
        } else if let Some(s) = main.efficiency_score.filter(|s| *s > 0) {
            s
        } else {
            main.efficiency.unwrap_or(0) as i32
        }
    }
}

fn stage_summary(main: &SleepLog) -> StageSummary {
    let Some(summary) = main.levels.as_ref().and_then(|l| l.summary.as_ref()) else {
        return StageSummary::default();
    };

    let minutes = |d: &Option<crate::services::fitbit::StageDetail>| {
        d.as_ref().and_then(|d| d.minutes).unwrap_or(0)
    };

    StageSummary {
        deep: minutes(&summary.deep),
        light: minutes(&summary.light),
        rem: minutes(&summary.rem),
        awake: minutes(&summary.wake),
    }
}

fn segments(main: &SleepLog) -> Vec<SleepSegment> {
    main.levels
        .as_ref()
        .map(|levels| {
            levels
                .data
                .iter()
                .map(|dp| SleepSegment {
                    start_time: dp.date_time.clone(),
                    level: dp.level.clone(),
                    duration_seconds: dp.seconds.unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default()
}
