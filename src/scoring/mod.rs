// SPDX-License-Identifier: MIT

//! Deterministic scoring: pure functions from biometric inputs to
//! clamped integer scores.

pub mod readiness;
pub mod sleep;

pub use readiness::estimate_readiness;
pub use sleep::{estimate_sleep_score, SleepInputs, SleepScore};
