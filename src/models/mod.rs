// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod heart;
pub mod live;
pub mod readiness;
pub mod series;
pub mod sleep;
pub mod token;

pub use heart::{HeartIntradayDay, HeartRateDay, HeartRateRange, HeartZones};
pub use live::LiveSample;
pub use readiness::{ActivityLoad, ReadinessCard, ReadinessInputs, SleepTrend};
pub use series::{MetricRange, StepsSeries, WeightSeries};
pub use sleep::SleepReport;
pub use token::TokenRecord;
