//! Scoring strategies.
//!
//! Each strategy scores one dimension of a subject's reputation data on a
//! 0-100 scale. The engine weights and combines them; a strategy failure
//! degrades that dimension to 0 instead of failing the composite.

mod activity;
mod attestation;
mod delegation;

pub use activity::ActivityStrategy;
pub use attestation::AttestationStrategy;
pub use delegation::DelegationStrategy;

use crate::types::ReputationData;

/// Strategy evaluation errors.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// Input data was internally inconsistent.
    #[error("invalid reputation data: {0}")]
    InvalidData(String),
}

/// A single reputation dimension scorer.
pub trait Scorer {
    /// Strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Score `data` at time `now` (epoch seconds), returning a value in
    /// [0, 100].
    fn compute(&self, data: &ReputationData, now: i64) -> Result<f64, StrategyError>;
}

/// Clamp a value into [lo, hi].
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

/// Linearly map `value` from [min, max] onto [0, 100], clamped.
///
/// Returns 0 when the range is empty or inverted.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    clamp((value - min) / (max - min) * 100.0, 0.0, 100.0)
}

/// Exponential decay from `max` with the given half-life.
///
/// At `elapsed == half_life` the result is `max / 2`.
pub fn exponential_decay(elapsed: i64, half_life: i64, max: f64) -> f64 {
    max * 0.5_f64.powf(elapsed as f64 / half_life as f64)
}
