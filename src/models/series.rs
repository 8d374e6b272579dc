// SPDX-License-Identifier: MIT

//! Named date ranges and the steps/weight series DTOs.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

/// Named trailing window for series endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricRange {
    Last7Days,
    Last14Days,
    Last30Days,
    CurrentWeek,
}

impl MetricRange {
    /// First day of the window ending at `base_date` (inclusive).
    pub fn start_date(&self, base_date: NaiveDate) -> NaiveDate {
        match self {
            MetricRange::Last7Days => base_date - Days::new(6),
            MetricRange::Last14Days => base_date - Days::new(13),
            MetricRange::Last30Days => base_date - Days::new(29),
            MetricRange::CurrentWeek => {
                let offset = base_date.weekday().days_since(Weekday::Mon);
                base_date - Days::new(offset as u64)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricRange::Last7Days => "LAST_7_DAYS",
            MetricRange::Last14Days => "LAST_14_DAYS",
            MetricRange::Last30Days => "LAST_30_DAYS",
            MetricRange::CurrentWeek => "CURRENT_WEEK",
        }
    }
}

impl std::str::FromStr for MetricRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LAST_7_DAYS" => Ok(MetricRange::Last7Days),
            "LAST_14_DAYS" => Ok(MetricRange::Last14Days),
            "LAST_30_DAYS" => Ok(MetricRange::Last30Days),
            "CURRENT_WEEK" => Ok(MetricRange::CurrentWeek),
            other => Err(format!("unknown range: {}", other)),
        }
    }
}

/// Daily step counts over a named range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsSeries {
    pub range: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<StepsPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsPoint {
    pub date: NaiveDate,
    pub steps: i64,
}

/// Weight log entries over a named range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSeries {
    pub range: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub points: Vec<WeightPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightPoint {
    pub date: NaiveDate,
    pub weight_kg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_trailing_windows() {
        let base = d("2026-08-30");
        assert_eq!(MetricRange::Last7Days.start_date(base), d("2026-08-24"));
        assert_eq!(MetricRange::Last14Days.start_date(base), d("2026-08-17"));
        assert_eq!(MetricRange::Last30Days.start_date(base), d("2026-08-01"));
    }

    #[test]
    fn test_current_week_starts_monday() {
        // 2026-08-30 is a Sunday; the week started Monday 2026-08-24.
        assert_eq!(
            MetricRange::CurrentWeek.start_date(d("2026-08-30")),
            d("2026-08-24")
        );
        // A Monday is its own week start.
        assert_eq!(
            MetricRange::CurrentWeek.start_date(d("2026-08-24")),
            d("2026-08-24")
        );
    }

    #[test]
    fn test_range_parse_roundtrip() {
        for range in [
            MetricRange::Last7Days,
            MetricRange::Last14Days,
            MetricRange::Last30Days,
            MetricRange::CurrentWeek,
        ] {
            assert_eq!(range.as_str().parse::<MetricRange>().unwrap(), range);
        }
        assert!("LAST_YEAR".parse::<MetricRange>().is_err());
    }
}
