// SPDX-License-Identifier: MIT

//! Daily and ranged heart-rate summaries.

use crate::error::AppError;
use crate::models::heart::{HeartRangePoint, HeartRateDay, HeartRateRange, HeartZones};
use crate::models::MetricRange;
use crate::services::fitbit::{FitbitClient, WireZone};
use crate::services::token::TokenService;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct HeartRateService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
}

impl HeartRateService {
    pub fn new(tokens: Arc<TokenService>, client: FitbitClient) -> Self {
        Self { tokens, client }
    }

    /// Resting heart rate and zone minutes for one day.
    pub async fn get_day(&self, subject: &str, date: NaiveDate) -> Result<HeartRateDay, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;
        let raw = self.client.get_heart_for_day(&token.access_token, date).await?;

        let Some(item) = raw.activities_heart.first() else {
            return Ok(HeartRateDay {
                date,
                resting_hr: None,
                zones: HeartZones::default(),
            });
        };

        Ok(HeartRateDay {
            date: item.date_time.parse().unwrap_or(date),
            resting_hr: item.value.as_ref().and_then(|v| v.resting_heart_rate),
            zones: map_zones(item.value.as_ref().map(|v| v.heart_rate_zones.as_slice())),
        })
    }

    /// Daily summaries over a named trailing range ending at `base_date`.
    pub async fn get_range(
        &self,
        subject: &str,
        range: MetricRange,
        base_date: NaiveDate,
    ) -> Result<HeartRateRange, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;
        let start = range.start_date(base_date);
        let raw = self
            .client
            .get_heart_range(&token.access_token, start, base_date)
            .await?;

        let points = raw
            .activities_heart
            .iter()
            .filter_map(|item| {
                let date: NaiveDate = item.date_time.parse().ok()?;
                Some(HeartRangePoint {
                    date,
                    resting_hr: item.value.as_ref().and_then(|v| v.resting_heart_rate),
                    zones: map_zones(item.value.as_ref().map(|v| v.heart_rate_zones.as_slice())),
                })
            })
            .collect();

        Ok(HeartRateRange {
            range: range.as_str().to_string(),
            start,
            end: base_date,
            points,
        })
    }
}

/// Sum zone minutes into the four named buckets by zone-name match.
fn map_zones(zones: Option<&[WireZone]>) -> HeartZones {
    let mut out = HeartZones::default();
    let Some(zones) = zones else {
        return out;
    };

    for zone in zones {
        let name = zone.name.as_deref().unwrap_or("").to_lowercase();
        let minutes = zone.minutes.unwrap_or(0);

        if name.contains("out") {
            out.out_of_range += minutes;
        } else if name.contains("fat") {
            out.fat_burn += minutes;
        } else if name.contains("cardio") {
            out.cardio += minutes;
        } else if name.contains("peak") {
            out.peak += minutes;
        }
    }

    out
}
