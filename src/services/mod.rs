// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod fitbit;
pub mod heart;
pub mod intraday;
pub mod live;
pub mod readiness;
pub mod sleep;
pub mod steps;
pub mod token;
pub mod weight;

pub use fitbit::{DetailLevel, FitbitClient};
pub use heart::HeartRateService;
pub use intraday::{HeartIntradayService, IntradayResolver, ResolvedIntraday};
pub use live::LiveFeed;
pub use readiness::ReadinessService;
pub use sleep::SleepService;
pub use steps::StepsService;
pub use token::{TokenService, TokenStore};
pub use weight::WeightService;
