//! Attestation dimension: how many credentials the subject holds, how varied,
//! and how fresh.

use std::collections::HashSet;

use super::{clamp, exponential_decay, normalize, Scorer, StrategyError};
use crate::types::ReputationData;

const NINETY_DAYS_SECS: i64 = 90 * 24 * 60 * 60;

/// Scores non-revoked, non-expired attestations by count, schema variety,
/// and issuance freshness, plus a flat issuer-quality placeholder until
/// issuer reputations feed back into scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttestationStrategy;

impl Scorer for AttestationStrategy {
    fn name(&self) -> &'static str {
        "attestation"
    }

    fn compute(&self, data: &ReputationData, now: i64) -> Result<f64, StrategyError> {
        let valid: Vec<_> = data
            .attestations
            .iter()
            .filter(|a| a.is_valid(now))
            .collect();

        if valid.is_empty() {
            return Ok(0.0);
        }

        let count_score = normalize(valid.len() as f64, 0.0, 20.0) * 0.25;

        let unique_schemas: HashSet<&str> = valid.iter().map(|a| a.schema_id.as_str()).collect();
        let schema_score = normalize(unique_schemas.len() as f64, 0.0, 10.0) * 0.25;

        let total_decay: f64 = valid
            .iter()
            .map(|a| exponential_decay(now - a.issued_at, NINETY_DAYS_SECS, 100.0))
            .sum();
        let freshness_score = total_decay / valid.len() as f64 * 0.25;

        let issuer_score = 25.0 * 0.25;

        Ok(clamp(
            count_score + schema_score + freshness_score + issuer_score,
            0.0,
            100.0,
        ))
    }
}
