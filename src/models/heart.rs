// SPDX-License-Identifier: MIT

//! Heart-rate DTOs: daily summary, multi-day range and intraday series.

use chrono::NaiveDate;
use serde::Serialize;

/// Minutes spent in each named heart-rate zone.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartZones {
    pub out_of_range: i32,
    pub fat_burn: i32,
    pub cardio: i32,
    pub peak: i32,
}

/// Daily heart-rate summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateDay {
    pub date: NaiveDate,
    pub resting_hr: Option<i32>,
    pub zones: HeartZones,
}

/// Heart-rate summaries over a named date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateRange {
    pub range: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<HeartRangePoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRangePoint {
    pub date: NaiveDate,
    pub resting_hr: Option<i32>,
    pub zones: HeartZones,
}

/// High-resolution heart-rate day for the intraday chart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartIntradayDay {
    pub date: NaiveDate,
    pub resting_hr: Option<i32>,
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub calories_out: Option<i32>,
    pub activity_calories: Option<i32>,
    pub detail_level: Option<String>,
    pub zones: Vec<ZoneMinutes>,
    pub points: Vec<IntradayPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMinutes {
    pub name: String,
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntradayPoint {
    pub time: String,
    pub bpm: i32,
}
