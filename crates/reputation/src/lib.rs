//! # AgentTrust Reputation
//!
//! Composite reputation scoring for indexed agent identities.
//!
//! The engine gathers an identity's attestations and delegations from a
//! [`ReputationStore`], runs three independent scoring strategies over them,
//! combines the results into a weighted 0-100 score with a tier, risk flags,
//! and a human-readable explanation, and attaches a Merkle inclusion proof so
//! the score can be verified later without re-reading the underlying data.
//!
//! ## Features
//!
//! - **Strategies**: attestation, delegation, and activity scorers behind the
//!   [`Scorer`] trait
//! - **Engine**: weighted composite, tiering, risk flags, trust graph edges
//! - **Cache**: per-subject TTL memoization of computed scores
//! - **Proofs**: keccak score leaves with sorted-pair Merkle folding

#![warn(missing_docs)]

pub mod cache;
pub mod engine;
pub mod error;
pub mod proof;
pub mod strategy;
pub mod types;

pub use cache::ScoreCache;
pub use engine::{ReputationEngine, ReputationStore};
pub use error::{ReputationError, Result};
pub use proof::{generate_score_proof, verify_score_proof};
pub use strategy::{Scorer, StrategyError};
pub use types::*;
