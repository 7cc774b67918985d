//! Event listener for the AgentTrust registry contracts.
//!
//! This module provides:
//! - Event type definitions and topic-based decoding
//! - RPC provider wrapper for chain communication
//! - Sync engine for cursor-based block processing

pub mod events;
pub mod provider;
pub mod sync;

pub use events::{
    AttestationEvent, DelegationEvent, DidEvent, EventMeta, RegistryEvents, RevocationEvent,
    SchemaEvent,
};
pub use provider::{EventSource, RpcProvider};
pub use sync::{SyncEngine, TickOutcome};
