// SPDX-License-Identifier: MIT

//! Sleep quality score estimation.
//!
//! Duration contributes with diminishing returns (square root) up to 8
//! hours; quality rewards REM/deep proportions up to target ratios;
//! fragmentation (multiple sessions, or no single session covering most of
//! total sleep) is penalized independently of raw duration.

use crate::error::AppError;

/// Sleep-session metrics feeding the estimator.
#[derive(Debug, Clone, Copy)]
pub struct SleepInputs {
    pub total_sleep_min: i32,
    pub rem_min: i32,
    pub deep_min: i32,
    pub awake_min: i32,
    pub session_count: i32,
    pub longest_session_min: i32,
}

/// Estimated score with its component breakdown.
#[derive(Debug, Clone, Copy)]
pub struct SleepScore {
    /// Rounded, clamped to [0, 100].
    pub score: i32,
    pub duration_score: f64,
    pub quality_score: f64,
    pub awake_penalty: f64,
    pub fragmentation_penalty: f64,
    pub rem_ratio: f64,
    pub deep_ratio: f64,
    pub awake_ratio: f64,
    pub longest_ratio: f64,
}

/// Estimate a sleep quality score for one night.
///
/// Fails with [`AppError::InvalidInput`] when `total_sleep_min <= 0` or a
/// count is negative. Stage sums exceeding total sleep are tolerated but
/// logged as suspicious.
pub fn estimate_sleep_score(inputs: &SleepInputs) -> Result<SleepScore, AppError> {
    validate(inputs)?;

    let total = inputs.total_sleep_min;
    let rem = inputs.rem_min.max(0);
    let deep = inputs.deep_min.max(0);
    let awake = inputs.awake_min.max(0);
    let sessions = inputs.session_count.max(1);
    let longest = inputs.longest_session_min.max(0);

    let t = f64::from(total);
    let rem_ratio = f64::from(rem) / t;
    let deep_ratio = f64::from(deep) / t;
    let awake_ratio = f64::from(awake) / t;

    let longest_ratio = if longest <= 0 {
        1.0
    } else {
        (f64::from(longest) / t).min(1.0)
    };

    // Duration (0-47), diminishing returns up to 8 hours.
    let duration_score = 47.0 * (f64::from(total.min(480)) / 480.0).sqrt();

    // Quality (0-28), REM and deep proportions against target ratios.
    let quality_score =
        28.0 * (0.66 * cap01(rem_ratio / 0.23) + 0.34 * cap01(deep_ratio / 0.22));

    // Awake penalty (approx 0-14).
    let awake_penalty = 11.2 * cap01(awake_ratio / 0.196) + 3.2 * cap01(f64::from(awake) / 60.0);

    // Fragmentation penalty.
    let fragmented = sessions > 1 || longest_ratio < 0.784;
    let fragmentation_penalty = if fragmented {
        let longest_shortfall = (0.784 - longest_ratio).max(0.0);
        4.6 * cap01(longest_shortfall / 0.401) + 4.4 * f64::from((sessions - 1).max(0))
    } else {
        0.0
    };

    let raw = 20.0 + duration_score + quality_score - awake_penalty - fragmentation_penalty;
    let score = raw.clamp(0.0, 100.0).round() as i32;

    tracing::debug!(
        score,
        raw,
        total,
        rem,
        deep,
        awake,
        sessions,
        longest,
        duration_score,
        quality_score,
        awake_penalty,
        fragmentation_penalty,
        "Sleep score estimated"
    );

    Ok(SleepScore {
        score,
        duration_score,
        quality_score,
        awake_penalty,
        fragmentation_penalty,
        rem_ratio,
        deep_ratio,
        awake_ratio,
        longest_ratio,
    })
}

fn validate(inputs: &SleepInputs) -> Result<(), AppError> {
    if inputs.total_sleep_min <= 0 {
        return Err(AppError::InvalidInput(
            "total_sleep_min must be > 0".to_string(),
        ));
    }
    if inputs.session_count < 0 {
        return Err(AppError::InvalidInput(
            "session_count must be >= 0".to_string(),
        ));
    }
    if inputs.longest_session_min < 0 {
        return Err(AppError::InvalidInput(
            "longest_session_min must be >= 0".to_string(),
        ));
    }

    let total = inputs.total_sleep_min;
    let rem = inputs.rem_min.max(0);
    let deep = inputs.deep_min.max(0);
    let awake = inputs.awake_min.max(0);
    if rem > total || deep > total || awake > total {
        tracing::warn!(
            total,
            rem,
            deep,
            awake,
            "Sleep inputs look inconsistent (stage exceeds total)"
        );
    }

    Ok(())
}

fn cap01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        total_sleep_min: i32,
        rem_min: i32,
        deep_min: i32,
        awake_min: i32,
        session_count: i32,
        longest_session_min: i32,
    ) -> SleepInputs {
        SleepInputs {
            total_sleep_min,
            rem_min,
            deep_min,
            awake_min,
            session_count,
            longest_session_min,
        }
    }

    #[test]
    fn test_rejects_non_positive_total() {
        assert!(matches!(
            estimate_sleep_score(&inputs(0, 0, 0, 0, 1, 0)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            estimate_sleep_score(&inputs(-30, 0, 0, 0, 1, 0)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_near_ideal_night() {
        // 8h total, strong REM/deep, one uninterrupted session.
        let result = estimate_sleep_score(&inputs(480, 110, 100, 20, 1, 480)).unwrap();
        assert_eq!(result.fragmentation_penalty, 0.0);
        assert!((result.duration_score - 47.0).abs() < 1e-9);
        assert!(result.quality_score > 27.0);
        assert!(result.score >= 90, "got {}", result.score);
    }

    #[test]
    fn test_duration_monotonic_up_to_eight_hours() {
        // Fixed stage ratios; the score never decreases as duration grows.
        let mut last = 0;
        for total in (60..=480).step_by(30) {
            let rem = total * 23 / 100;
            let deep = total * 22 / 100;
            let result = estimate_sleep_score(&inputs(total, rem, deep, 0, 1, total)).unwrap();
            assert!(
                result.score >= last,
                "score decreased at {} min: {} < {}",
                total,
                result.score,
                last
            );
            last = result.score;
        }
    }

    #[test]
    fn test_fragmentation_penalized() {
        let whole = estimate_sleep_score(&inputs(420, 90, 80, 15, 1, 420)).unwrap();
        let split = estimate_sleep_score(&inputs(420, 90, 80, 15, 3, 200)).unwrap();
        assert!(split.fragmentation_penalty > 0.0);
        assert!(split.score < whole.score);
    }

    #[test]
    fn test_short_longest_session_counts_as_fragmented() {
        // One session reported, but it covers less than 78.4% of the total.
        let result = estimate_sleep_score(&inputs(400, 80, 70, 10, 1, 200)).unwrap();
        assert!(result.fragmentation_penalty > 0.0);
    }

    #[test]
    fn test_missing_longest_session_not_penalized() {
        // longest = 0 means "not reported" and is treated as a full ratio.
        let result = estimate_sleep_score(&inputs(400, 80, 70, 10, 1, 0)).unwrap();
        assert_eq!(result.longest_ratio, 1.0);
        assert_eq!(result.fragmentation_penalty, 0.0);
    }

    #[test]
    fn test_inconsistent_stages_tolerated() {
        // REM exceeding total is suspicious but not rejected.
        let result = estimate_sleep_score(&inputs(100, 150, 0, 0, 1, 100)).unwrap();
        assert!((0..=100).contains(&result.score));
    }

    #[test]
    fn test_score_clamped_to_range() {
        let awful = estimate_sleep_score(&inputs(30, 0, 0, 30, 6, 5)).unwrap();
        assert!((0..=100).contains(&awful.score));
    }
}
