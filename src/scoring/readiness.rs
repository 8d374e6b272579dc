// SPDX-License-Identifier: MIT

//! Readiness score estimation.
//!
//! HRV is the dominant signal: it caps the achievable score regardless of
//! how favorable the other inputs are. Sleep and resting heart rate provide
//! fine adjustment; high strain is penalized heavily since recovery need
//! outweighs other positive signals.

use crate::models::{ActivityLoad, ReadinessInputs, SleepTrend};

/// Estimate a 1-100 readiness score from the given inputs.
pub fn estimate_readiness(inputs: &ReadinessInputs) -> i32 {
    let ceiling = readiness_ceiling(inputs.hrv_percent_change);
    let base = base_score(inputs.hrv_percent_change);

    let sleep_adj = sleep_adjustment(inputs.sleep_trend);
    let rhr_adj = rhr_adjustment(inputs.rhr_delta_bpm);
    let strain_adj = strain_penalty(inputs.activity_load);

    let raw = base + sleep_adj + rhr_adj + strain_adj;
    let score = raw.min(ceiling).clamp(1, 100);

    tracing::debug!(
        hrv_pct = inputs.hrv_percent_change,
        ceiling,
        base,
        sleep_adj,
        rhr_adj,
        strain_adj,
        raw,
        score,
        "Readiness estimated"
    );

    score
}

/// HRV trend bounds the maximum possible score.
fn readiness_ceiling(hrv_pct: f64) -> i32 {
    if hrv_pct >= 20.0 {
        100
    } else if hrv_pct >= 10.0 {
        85
    } else if hrv_pct >= 5.0 {
        75
    } else if hrv_pct >= -5.0 {
        70 // "about usual"
    } else {
        60
    }
}

fn base_score(hrv_pct: f64) -> i32 {
    if hrv_pct >= 20.0 {
        88
    } else if hrv_pct >= 10.0 {
        75
    } else if hrv_pct >= 5.0 {
        68
    } else if hrv_pct >= -5.0 {
        65
    } else {
        55
    }
}

fn sleep_adjustment(trend: Option<SleepTrend>) -> i32 {
    match trend {
        Some(SleepTrend::Excellent) => 4,
        Some(SleepTrend::Good) => 2,
        Some(SleepTrend::Fair) => -3,
        Some(SleepTrend::Poor) => -7,
        None => 0,
    }
}

fn rhr_adjustment(delta: i32) -> i32 {
    match delta {
        d if d <= -3 => 4,
        -2 => 3,
        -1 => 1,
        0 => 0,
        _ => -3,
    }
}

fn strain_penalty(load: ActivityLoad) -> i32 {
    match load {
        ActivityLoad::Rest => 0,
        ActivityLoad::Low => -3,
        ActivityLoad::Moderate => -8,
        ActivityLoad::High => -15,
        ActivityLoad::VeryHigh => -22,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        hrv_percent_change: f64,
        rhr_delta_bpm: i32,
        sleep_trend: Option<SleepTrend>,
        activity_load: ActivityLoad,
    ) -> ReadinessInputs {
        ReadinessInputs {
            hrv_percent_change,
            rhr_delta_bpm,
            sleep_trend,
            activity_load,
        }
    }

    #[test]
    fn test_strong_recovery_scenario() {
        // base 88, ceiling 100, sleep +4, rhr +4, strain 0 -> 96
        let score = estimate_readiness(&inputs(
            25.0,
            -3,
            Some(SleepTrend::Excellent),
            ActivityLoad::Rest,
        ));
        assert_eq!(score, 96);
    }

    #[test]
    fn test_high_hrv_lifts_ceiling_to_100() {
        for pct in [20.0, 25.0, 60.0] {
            let score = estimate_readiness(&inputs(
                pct,
                -3,
                Some(SleepTrend::Excellent),
                ActivityLoad::Rest,
            ));
            assert!(score <= 100);
            assert_eq!(score, 96, "for hrv pct {}", pct);
        }
    }

    #[test]
    fn test_hrv_ceiling_caps_favorable_inputs() {
        // Everything favorable but HRV well below usual: capped at 60.
        let score = estimate_readiness(&inputs(
            -10.0,
            -5,
            Some(SleepTrend::Excellent),
            ActivityLoad::Rest,
        ));
        assert!(score <= 60);
    }

    #[test]
    fn test_neutral_defaults_stay_in_range() {
        // The aggregator's all-defaults case: hrv 0%, delta 0, no sleep, rest.
        let score = estimate_readiness(&inputs(0.0, 0, None, ActivityLoad::Rest));
        assert!((1..=100).contains(&score));
        assert_eq!(score, 65);
    }

    #[test]
    fn test_score_always_in_range() {
        let trends = [
            None,
            Some(SleepTrend::Excellent),
            Some(SleepTrend::Good),
            Some(SleepTrend::Fair),
            Some(SleepTrend::Poor),
        ];
        let loads = [
            ActivityLoad::Rest,
            ActivityLoad::Low,
            ActivityLoad::Moderate,
            ActivityLoad::High,
            ActivityLoad::VeryHigh,
        ];
        for hrv in [-80.0, -5.0, 0.0, 4.9, 5.0, 19.9, 20.0, 300.0] {
            for delta in [-10, -3, -2, -1, 0, 1, 10] {
                for trend in trends {
                    for load in loads {
                        let score = estimate_readiness(&inputs(hrv, delta, trend, load));
                        assert!(
                            (1..=100).contains(&score),
                            "out of range for hrv={} delta={} trend={:?} load={:?}",
                            hrv,
                            delta,
                            trend,
                            load
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_heavy_strain_drags_score_down() {
        let rest = estimate_readiness(&inputs(12.0, 0, Some(SleepTrend::Good), ActivityLoad::Rest));
        let heavy = estimate_readiness(&inputs(
            12.0,
            0,
            Some(SleepTrend::Good),
            ActivityLoad::VeryHigh,
        ));
        assert!(heavy < rest);
        assert_eq!(rest - heavy, 22);
    }
}
