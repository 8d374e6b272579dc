// SPDX-License-Identifier: MIT

//! Live device sample DTO.

use serde::{Deserialize, Serialize};

/// One sample pushed by a companion device; metrics are nullable because
/// devices report them independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSample {
    /// Sample timestamp, epoch milliseconds.
    pub ts: i64,
    pub hr: Option<f64>,
    pub steps: Option<i64>,
    pub distance_m: Option<f64>,
    pub calories: Option<f64>,
}
