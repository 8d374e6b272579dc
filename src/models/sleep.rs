// SPDX-License-Identifier: MIT

//! Sleep report DTO.

use serde::Serialize;

/// Sleep report for one night, with the estimated quality score.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepReport {
    /// Date of sleep as reported by Fitbit (`YYYY-MM-DD`).
    pub date: String,
    pub total_minutes_asleep: i32,
    pub total_time_in_bed: i32,
    /// Estimated 1-100 score; 0 when no sleep was logged.
    pub sleep_score: i32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub levels_summary: StageSummary,
    pub segments: Vec<SleepSegment>,
}

impl SleepReport {
    /// Empty report for a date with no logged sleep.
    pub fn empty(date: &str) -> Self {
        Self {
            date: date.to_string(),
            total_minutes_asleep: 0,
            total_time_in_bed: 0,
            sleep_score: 0,
            start_time: None,
            end_time: None,
            levels_summary: StageSummary::default(),
            segments: Vec::new(),
        }
    }
}

/// Minutes per sleep stage for the main sleep session.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub deep: i32,
    pub light: i32,
    pub rem: i32,
    pub awake: i32,
}

/// One stage segment of the main sleep session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSegment {
    pub start_time: String,
    pub level: String,
    pub duration_seconds: i32,
}
