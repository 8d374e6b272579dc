// SPDX-License-Identifier: MIT

//! Weight log series.

use crate::error::AppError;
use crate::models::series::WeightPoint;
use crate::models::{MetricRange, WeightSeries};
use crate::services::fitbit::FitbitClient;
use crate::services::token::TokenService;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct WeightService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
}

impl WeightService {
    pub fn new(tokens: Arc<TokenService>, client: FitbitClient) -> Self {
        Self { tokens, client }
    }

    /// Weight log entries over a named trailing range ending at `base_date`.
    pub async fn get_weight(
        &self,
        subject: &str,
        range: MetricRange,
        base_date: NaiveDate,
    ) -> Result<WeightSeries, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;
        let start = range.start_date(base_date);
        let raw = self
            .client
            .get_weight_series(&token.access_token, start, base_date)
            .await?;

        let points = raw
            .weight
            .iter()
            .filter_map(|log| {
                let date: NaiveDate = log.date.parse().ok()?;
                Some(WeightPoint {
                    date,
                    weight_kg: log.weight?,
                })
            })
            .collect();

        Ok(WeightSeries {
            range: range.as_str().to_string(),
            start,
            end: base_date,
            points,
        })
    }
}
