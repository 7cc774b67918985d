//! Axum-based resolver API for AgentTrust.
//!
//! This crate provides:
//! - `/identity/{did}` - DID document lookup (also accepts a bare 0x address)
//! - `/identity/{did}/trust-profile` - Portable trust profile with score proof
//! - `/credentials`, `/delegations`, `/schemas` - Filterable registry listings
//! - `/reputation/{subject}` - Reputation score with Merkle score proof
//! - `/reputation/verify` - Offline verification of a submitted score proof
//!
//! All endpoints read the SQLite database maintained by the indexer; the API
//! itself never writes.

#![warn(missing_docs)]

pub mod db;
/// API server runtime and in-process app builder.
pub mod server;
pub mod store;
