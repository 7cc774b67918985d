//! Client SDK for the AgentTrust resolver.
//!
//! This crate provides:
//! - [`ResolverClient`] - HTTP client for trust profiles, reputation scores,
//!   and proof verification
//! - [`verify_score_proof`] - offline verification of served score proofs
//! - [`Did`] and [`DelegationScope`] re-exports for building requests and
//!   reading delegation bitmasks
//! - [`LegacyTier`] - the historical 0-1000 tier ladder
//!
//! # Example
//!
//! ```no_run
//! use agenttrust_sdk::{verify_score_proof, ResolverClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ResolverClient::new("http://localhost:8080")?;
//! let profile = client
//!     .get_trust_profile("did:agent:84532:4242424242424242424242424242424242424242")
//!     .await?;
//! assert!(verify_score_proof(&profile.score_proof()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod tier;

pub use client::{
    CredentialEntry, DelegationEntry, ResolverClient, TrustProfile, VerifyOutcome,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use tier::LegacyTier;

pub use agenttrust_core::{DelegationScope, Did};
pub use agenttrust_reputation::{
    verify_score_proof, ReputationScore, RiskFlag, ScoreBreakdown, ScoreProof, Tier,
};
