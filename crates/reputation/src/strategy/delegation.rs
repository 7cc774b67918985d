//! Delegation dimension: how many capabilities the subject has granted, how
//! varied the scopes are, and how long the grants have been standing.

use std::collections::HashSet;

use super::{clamp, normalize, Scorer, StrategyError};
use crate::types::ReputationData;

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

/// Scores non-revoked, non-expired delegations by count, scope variety, and
/// age: a grant only earns full age credit once it has stood for 30 days.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegationStrategy;

impl Scorer for DelegationStrategy {
    fn name(&self) -> &'static str {
        "delegation"
    }

    fn compute(&self, data: &ReputationData, now: i64) -> Result<f64, StrategyError> {
        let active: Vec<_> = data
            .delegations
            .iter()
            .filter(|d| d.is_active(now))
            .collect();

        if active.is_empty() {
            return Ok(0.0);
        }

        let count_score = normalize(active.len() as f64, 0.0, 15.0) * 0.4;

        let unique_scopes: HashSet<u64> = active.iter().map(|d| d.scope.bits()).collect();
        let scope_score = normalize(unique_scopes.len() as f64, 0.0, 8.0) * 0.35;

        let total_age: f64 = active
            .iter()
            .map(|d| {
                let age_ratio = (now - d.created_at) as f64 / THIRTY_DAYS_SECS as f64;
                age_ratio.max(0.0).min(1.0)
            })
            .sum();
        let age_score = total_age / active.len() as f64 * 100.0 * 0.25;

        Ok(clamp(count_score + scope_score + age_score, 0.0, 100.0))
    }
}
