//! Database record types for the indexer storage layer.
//!
//! Addresses and 32-byte identifiers live in their typed alloy forms here;
//! they are rendered to lowercase 0x-hex TEXT at the bind boundary and
//! parsed back by the row converters.

use agenttrust_core::DelegationScope;
use alloy::primitives::{Address, B256};
use anyhow::{anyhow, Result};

/// An identity record as stored in the `dids` table.
///
/// `id` is the owner address. Rows are created on the first `DIDCreated`
/// event and never deleted; recovery only reassigns the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidRecord {
    /// Owner address (table key)
    pub id: Address,

    /// Current controller address
    pub controller: Address,

    /// CID of the off-chain identity metadata document
    pub metadata_cid: String,

    /// Active flag (no current event clears it)
    pub active: bool,

    /// Unix timestamp carried by the creating event; later upserts keep it
    pub updated_at: i64,

    /// Transaction hash of the latest applied event
    pub tx_hash: B256,

    /// Block number of the latest applied event
    pub block_number: u64,
}

/// A schema definition as stored in the `schemas` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    /// Schema id (bytes32 table key)
    pub id: B256,

    /// Creator address
    pub creator: Address,

    /// Human-readable schema name
    pub name: String,

    /// Schema version string
    pub version: String,

    /// CID of the schema document
    pub schema_cid: String,

    /// Unix timestamp of first ingestion; later upserts keep it
    pub created_at: i64,

    /// Active flag (no current event clears it)
    pub active: bool,

    /// Transaction hash of the latest applied event
    pub tx_hash: B256,
}

/// An attestation as stored in the `attestations` table.
///
/// Revocation state is one-way: once `revoked` is set, a re-delivered
/// issuance upsert must not clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    /// Attestation uid (bytes32 table key)
    pub uid: B256,

    /// Schema the attestation conforms to
    pub schema_id: B256,

    /// Issuer address
    pub issuer: Address,

    /// Subject address
    pub subject: Address,

    /// Issuance time carried by the event, unix seconds
    pub issued_at: i64,

    /// Expiry time, unix seconds. `None` when the event carried 0.
    pub expires_at: Option<i64>,

    /// CID of the attestation payload
    pub data_cid: String,

    /// Whether a revocation event has been applied for this uid
    pub revoked: bool,

    /// When the revocation was ingested, unix seconds
    pub revoked_at: Option<i64>,

    /// Transaction hash of the latest applied issuance event
    pub tx_hash: B256,

    /// Block number of the issuance event
    pub block_number: u64,
}

/// A delegation as stored in the `delegations` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    /// Delegation id (bytes32 table key)
    pub id: B256,

    /// Granting identity
    pub owner: Address,

    /// Receiving agent
    pub agent: Address,

    /// Capability bitmask. Stored as a decimal TEXT column because the
    /// full u64 range does not fit a signed SQLite INTEGER.
    pub scope: DelegationScope,

    /// Expiry time, unix seconds. `None` when the event carried 0.
    pub expires_at: Option<i64>,

    /// Unix timestamp of first ingestion; later upserts keep it
    pub created_at: i64,

    /// Whether a revocation event has been applied for this id
    pub revoked: bool,

    /// When the revocation was ingested, unix seconds
    pub revoked_at: Option<i64>,

    /// Transaction hash of the latest applied creation event
    pub tx_hash: B256,
}

/// A standalone credential revocation as stored in the `revocations` table.
///
/// Insert-if-absent: the first revocation observed for a credential id wins
/// and the row is never updated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRecord {
    /// Revoked credential id (bytes32 table key)
    pub credential_id: B256,

    /// Address that performed the revocation
    pub revoker: Address,

    /// When the revocation was ingested, unix seconds
    pub revoked_at: i64,

    /// Optional revocation reason. `None` when the event carried an empty string.
    pub reason: Option<String>,

    /// Transaction hash of the revocation event
    pub tx_hash: B256,
}

/// Per-chain sync cursor.
///
/// Tracks the last block fully processed for one chain; only the sync
/// engine mutates it, after all processors for a range succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    /// Chain id this cursor belongs to
    pub chain_id: u64,

    /// Last fully processed block number
    pub last_processed_block: u64,
}

/// Parse a lowercase 0x-hex address column.
pub(crate) fn parse_address(s: &str) -> Result<Address> {
    s.parse::<Address>()
        .map_err(|_| anyhow!("Invalid address in database: {}", s))
}

/// Parse a lowercase 0x-hex 32-byte column.
pub(crate) fn parse_b256(s: &str) -> Result<B256> {
    s.parse::<B256>()
        .map_err(|_| anyhow!("Invalid 32-byte value in database: {}", s))
}

/// Parse a decimal delegation scope column.
pub(crate) fn parse_scope(s: &str) -> Result<DelegationScope> {
    s.parse::<u64>()
        .map(DelegationScope::from)
        .map_err(|_| anyhow!("Invalid delegation scope in database: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenttrust_core::{address_hex, bytes32_hex};

    #[test]
    fn test_parse_address_roundtrip() {
        let addr = Address::repeat_byte(0xab);
        let parsed = parse_address(&address_hex(&addr)).unwrap();
        assert_eq!(parsed, addr);

        assert!(parse_address("not-an-address").is_err());
        assert!(parse_address("0x1234").is_err());
    }

    #[test]
    fn test_parse_b256_roundtrip() {
        let hash = B256::repeat_byte(0x42);
        let parsed = parse_b256(&bytes32_hex(&hash)).unwrap();
        assert_eq!(parsed, hash);

        assert!(parse_b256("0xzz").is_err());
    }

    #[test]
    fn test_parse_scope_full_range() {
        assert_eq!(parse_scope("9").unwrap(), DelegationScope::from(9));
        assert_eq!(
            parse_scope(&u64::MAX.to_string()).unwrap(),
            DelegationScope::from(u64::MAX)
        );
        assert!(parse_scope("-1").is_err());
        assert!(parse_scope("").is_err());
    }
}
