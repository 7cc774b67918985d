//! Registry event ingestion for the AgentTrust network.
//!
//! This crate provides:
//! - Event decoding for the five AgentTrust registry contracts
//! - A cursor-based sync engine over JSON-RPC
//! - Per-registry event processors with idempotent upsert semantics
//! - SQLite storage shared with the API service
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  agenttrust-indexer (this)       │
//! │                                  │
//! │  ┌──────────────┐                │
//! │  │ Sync Engine  │ ← Ethereum RPC │
//! │  │ (tokio task) │   5 registries │
//! │  └──────┬───────┘                │
//! │         │ decoded events         │
//! │  ┌──────▼───────┐                │
//! │  │  Processors  │                │
//! │  │ (per registry)                │
//! │  └──────┬───────┘                │
//! │         │ upserts                │
//! │  ┌──────▼───────┐                │
//! │  │   Storage    │ ← SQLite       │
//! │  │  + cursor    │                │
//! │  └──────────────┘                │
//! └─────────┬────────────────────────┘
//!           │
//!           │ Shared DB
//!           │
//! ┌─────────▼────────────────────────┐
//! │  agenttrust-api (separate)       │
//! │  • identity resolution           │
//! │  • reputation scoring + proofs   │
//! │  • credential queries            │
//! └──────────────────────────────────┘
//! ```
//!
//! # Separation of Concerns
//!
//! - **indexer**: Writes registry state behind a monotonic cursor (this crate)
//! - **api**: Reads registry state, scores reputation, serves HTTP (agenttrust-api)
//! - **reputation**: Scoring and proof library (agenttrust-reputation)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod listener;
pub mod processor;
pub mod storage;
