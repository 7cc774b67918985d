//! # AgentTrust Core
//!
//! Core types, DID codec, and hashing utilities for the AgentTrust trust layer.
//!
//! This crate provides the fundamental building blocks used across all AgentTrust
//! components, ensuring consistent identifiers and cryptographic operations between
//! the indexer, the reputation engine, and the resolver API.
//!
//! ## Features
//!
//! - **Ethereum Types**: Uses Alloy primitives for Address, B256, and keccak256
//! - **DID Codec**: `did:agent:<chainId>:<address>` parsing and formatting
//! - **Delegation Scopes**: capability bitmask shared with the on-chain registry
//! - **Hashing**: Keccak256 utilities for score proof leaves and Merkle folding

#![warn(missing_docs)]

pub mod did;
pub mod error;
pub mod hashing;
pub mod types;

// Re-export commonly used items
pub use did::Did;
pub use error::{CoreError, Result};
pub use hashing::{combine_sorted, compute_score_leaf, fold_proof, keccak256};
pub use types::*;

// Re-export Alloy primitives for convenience
pub use alloy_primitives::{Address, B256};
