// SPDX-License-Identifier: MIT

//! Fitdash: aggregation and estimation backend for a Fitbit dashboard.
//!
//! This crate provides the backend API that talks to the Fitbit Web API,
//! derives readiness and sleep scores, and serves per-metric endpoints
//! to the dashboard frontend.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod scoring;
pub mod services;

use std::sync::Arc;

use config::Config;
use services::{
    FitbitClient, HeartIntradayService, HeartRateService, LiveFeed, ReadinessService,
    SleepService, StepsService, TokenService, WeightService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub fitbit: FitbitClient,
    pub tokens: Arc<TokenService>,
    pub heart: Arc<HeartRateService>,
    pub sleep: Arc<SleepService>,
    pub steps: StepsService,
    pub weight: WeightService,
    pub intraday: HeartIntradayService,
    pub readiness: ReadinessService,
    pub live: LiveFeed,
}

impl AppState {
    /// Wire up every service against one Fitbit client.
    pub fn new(config: Config) -> Self {
        let fitbit = FitbitClient::new(
            config.api_base_uri.clone(),
            config.token_uri.clone(),
            config.fitbit_client_id.clone(),
            config.fitbit_client_secret.clone(),
        );

        let tokens = Arc::new(TokenService::new(fitbit.clone()));
        let heart = Arc::new(HeartRateService::new(tokens.clone(), fitbit.clone()));
        let sleep = Arc::new(SleepService::new(tokens.clone(), fitbit.clone()));
        let steps = StepsService::new(tokens.clone(), fitbit.clone());
        let weight = WeightService::new(tokens.clone(), fitbit.clone());
        let intraday = HeartIntradayService::new(tokens.clone(), fitbit.clone());
        let readiness = ReadinessService::new(
            tokens.clone(),
            fitbit.clone(),
            heart.clone(),
            sleep.clone(),
        );

        Self {
            config,
            fitbit,
            tokens,
            heart,
            sleep,
            steps,
            weight,
            intraday,
            readiness,
            live: LiveFeed::default(),
        }
    }
}
