//! Activity dimension: how recently and how much the subject has been seen
//! on-chain.

use super::{clamp, normalize, Scorer, StrategyError};
use crate::types::ReputationData;

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

/// Scores recency of the last observed event and total event volume,
/// half-weighted each. Recency decays linearly to zero over 30 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityStrategy;

impl Scorer for ActivityStrategy {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn compute(&self, data: &ReputationData, now: i64) -> Result<f64, StrategyError> {
        let recency_score = recency(data.last_activity_at, now) * 0.5;
        let volume_score = normalize(data.total_transactions as f64, 0.0, 100.0) * 0.5;

        Ok(clamp(recency_score + volume_score, 0.0, 100.0))
    }
}

fn recency(last_activity_at: i64, now: i64) -> f64 {
    let elapsed = now - last_activity_at;
    // Timestamps ahead of our clock count as current activity.
    if elapsed < 0 {
        return 100.0;
    }
    if elapsed > THIRTY_DAYS_SECS {
        return 0.0;
    }
    normalize(
        (THIRTY_DAYS_SECS - elapsed) as f64,
        0.0,
        THIRTY_DAYS_SECS as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn data(last_activity_at: i64, total_transactions: u64) -> ReputationData {
        ReputationData {
            last_activity_at,
            total_transactions,
            ..Default::default()
        }
    }

    #[test]
    fn activity_today_with_seven_events() {
        let score = ActivityStrategy.compute(&data(NOW, 7), NOW).unwrap();
        assert!((score - 53.5).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn no_records_means_stale_and_empty() {
        // last_activity_at of 0 is far past the 30-day window.
        let score = ActivityStrategy.compute(&data(0, 0), NOW).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn future_activity_counts_as_current() {
        let score = ActivityStrategy.compute(&data(NOW + 3600, 0), NOW).unwrap();
        assert_eq!(score, 50.0);
    }

    #[test]
    fn recency_decays_linearly() {
        let fifteen_days = 15 * 24 * 60 * 60;
        let score = ActivityStrategy
            .compute(&data(NOW - fifteen_days, 0), NOW)
            .unwrap();
        assert!((score - 25.0).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn volume_saturates_at_one_hundred_events() {
        let score = ActivityStrategy.compute(&data(NOW, 250), NOW).unwrap();
        assert_eq!(score, 100.0);
    }
}
