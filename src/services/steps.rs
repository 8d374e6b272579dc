// SPDX-License-Identifier: MIT

//! Daily step-count series.

use crate::error::AppError;
use crate::models::series::StepsPoint;
use crate::models::{MetricRange, StepsSeries};
use crate::services::fitbit::FitbitClient;
use crate::services::token::TokenService;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct StepsService {
    tokens: Arc<TokenService>,
    client: FitbitClient,
}

impl StepsService {
    pub fn new(tokens: Arc<TokenService>, client: FitbitClient) -> Self {
        Self { tokens, client }
    }

    /// Step counts over a named trailing range ending at `base_date`.
    pub async fn get_steps(
        &self,
        subject: &str,
        range: MetricRange,
        base_date: NaiveDate,
    ) -> Result<StepsSeries, AppError> {
        let token = self.tokens.get_valid_token(subject).await?;
        let start = range.start_date(base_date);
        let raw = self
            .client
            .get_steps_series(&token.access_token, start, base_date)
            .await?;

        let points = raw
            .activities_steps
            .iter()
            .filter_map(|item| {
                let date: NaiveDate = item.date_time.parse().ok()?;
                Some(StepsPoint {
                    date,
                    // Fitbit reports step counts as strings.
                    steps: item.value.parse().unwrap_or(0),
                })
            })
            .collect();

        Ok(StepsSeries {
            range: range.as_str().to_string(),
            start,
            end: base_date,
            points,
        })
    }
}
