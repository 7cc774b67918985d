//! Event definitions and decoding for the five AgentTrust registries.
//!
//! Raw logs are decoded into per-registry tagged enums keyed by the log's
//! topic0. Unknown topics decode to `None` and are skipped by the caller;
//! a log that matches a known topic but fails ABI decoding is an error.

use alloy::primitives::{Address, B256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};

sol! {
    /// Emitted by the DID registry when an identity is registered.
    #[derive(Debug, PartialEq, Eq)]
    event DIDCreated(
        address indexed identity,
        address indexed controller,
        string metadataCid,
        uint64 timestamp
    );

    /// Emitted by the DID registry when a recovery reassigns the controller.
    #[derive(Debug, PartialEq, Eq)]
    event RecoveryExecuted(
        address indexed identity,
        address indexed newController,
        uint64 timestamp
    );

    /// Emitted by the schema registry on schema registration.
    #[derive(Debug, PartialEq, Eq)]
    event SchemaRegistered(
        bytes32 indexed schemaId,
        address indexed creator,
        string name,
        string version,
        string schemaCid
    );

    /// Emitted by the attestation registry on issuance.
    #[derive(Debug, PartialEq, Eq)]
    event AttestationIssued(
        bytes32 indexed uid,
        bytes32 indexed schemaId,
        address indexed issuer,
        address subject,
        uint64 issuedAt,
        uint64 expiresAt,
        string dataCid
    );

    /// Emitted by the attestation registry on revocation.
    #[derive(Debug, PartialEq, Eq)]
    event AttestationRevoked(bytes32 indexed uid, address indexed revoker);

    /// Emitted by the delegation registry when an owner grants authority.
    #[derive(Debug, PartialEq, Eq)]
    event DelegationCreated(
        bytes32 indexed id,
        address indexed owner,
        address indexed agent,
        uint64 scope,
        uint64 expiresAt
    );

    /// Emitted by the delegation registry on revocation.
    #[derive(Debug, PartialEq, Eq)]
    event DelegationRevoked(bytes32 indexed id, address indexed revoker);

    /// Emitted by the revocation registry for standalone credential revocations.
    #[derive(Debug, PartialEq, Eq)]
    event CredentialRevoked(
        bytes32 indexed credentialId,
        address indexed revoker,
        string reason
    );
}

/// Block coordinates attached to every decoded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMeta {
    /// Block number where the event occurred
    pub block_number: u64,

    /// Position of the log within its block
    pub log_index: u64,

    /// Transaction hash
    pub tx_hash: B256,
}

impl EventMeta {
    fn from_log(log: &Log) -> Result<Self> {
        let block_number = log.block_number.context("Log missing block_number")?;
        let log_index = log.log_index.context("Log missing log_index")?;
        let tx_hash = log
            .transaction_hash
            .context("Log missing transaction_hash")?;

        Ok(Self {
            block_number,
            log_index,
            tx_hash,
        })
    }
}

/// Decoded DID registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DidEvent {
    /// A new identity was registered.
    Created {
        /// Owner address of the identity
        identity: Address,
        /// Initial controller
        controller: Address,
        /// CID of the identity metadata document
        metadata_cid: String,
        /// Registration time, unix seconds
        timestamp: u64,
        /// Block coordinates
        meta: EventMeta,
    },
    /// A recovery reassigned the controller of an existing identity.
    Recovered {
        /// Owner address of the identity
        identity: Address,
        /// Controller after recovery
        new_controller: Address,
        /// Recovery time, unix seconds
        timestamp: u64,
        /// Block coordinates
        meta: EventMeta,
    },
}

impl DidEvent {
    /// Decode a DID registry log by topic0. `None` for topics we do not index.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };

        if *topic0 == DIDCreated::SIGNATURE_HASH {
            let decoded = DIDCreated::decode_log(log.as_ref(), true)
                .context("Failed to decode DIDCreated event")?;
            let meta = EventMeta::from_log(log)?;
            let DIDCreated {
                identity,
                controller,
                metadataCid: metadata_cid,
                timestamp,
            } = decoded.data;

            Ok(Some(DidEvent::Created {
                identity,
                controller,
                metadata_cid,
                timestamp,
                meta,
            }))
        } else if *topic0 == RecoveryExecuted::SIGNATURE_HASH {
            let decoded = RecoveryExecuted::decode_log(log.as_ref(), true)
                .context("Failed to decode RecoveryExecuted event")?;
            let meta = EventMeta::from_log(log)?;
            let RecoveryExecuted {
                identity,
                newController: new_controller,
                timestamp,
            } = decoded.data;

            Ok(Some(DidEvent::Recovered {
                identity,
                new_controller,
                timestamp,
                meta,
            }))
        } else {
            Ok(None)
        }
    }
}

/// Decoded schema registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEvent {
    /// A schema was registered.
    Registered {
        /// Schema id
        schema_id: B256,
        /// Creator address
        creator: Address,
        /// Human-readable schema name
        name: String,
        /// Schema version string
        version: String,
        /// CID of the schema document
        schema_cid: String,
        /// Block coordinates
        meta: EventMeta,
    },
}

impl SchemaEvent {
    /// Decode a schema registry log by topic0. `None` for topics we do not index.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };

        if *topic0 == SchemaRegistered::SIGNATURE_HASH {
            let decoded = SchemaRegistered::decode_log(log.as_ref(), true)
                .context("Failed to decode SchemaRegistered event")?;
            let meta = EventMeta::from_log(log)?;
            let SchemaRegistered {
                schemaId: schema_id,
                creator,
                name,
                version,
                schemaCid: schema_cid,
            } = decoded.data;

            Ok(Some(SchemaEvent::Registered {
                schema_id,
                creator,
                name,
                version,
                schema_cid,
                meta,
            }))
        } else {
            Ok(None)
        }
    }
}

/// Decoded attestation registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationEvent {
    /// An attestation was issued.
    Issued {
        /// Attestation uid
        uid: B256,
        /// Schema the attestation conforms to
        schema_id: B256,
        /// Issuer address
        issuer: Address,
        /// Subject address
        subject: Address,
        /// Issuance time, unix seconds
        issued_at: u64,
        /// Expiry time, unix seconds; 0 means no expiry
        expires_at: u64,
        /// CID of the attestation payload
        data_cid: String,
        /// Block coordinates
        meta: EventMeta,
    },
    /// An attestation was revoked.
    Revoked {
        /// Attestation uid
        uid: B256,
        /// Address that performed the revocation
        revoker: Address,
        /// Block coordinates
        meta: EventMeta,
    },
}

impl AttestationEvent {
    /// Decode an attestation registry log by topic0. `None` for topics we do not index.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };

        if *topic0 == AttestationIssued::SIGNATURE_HASH {
            let decoded = AttestationIssued::decode_log(log.as_ref(), true)
                .context("Failed to decode AttestationIssued event")?;
            let meta = EventMeta::from_log(log)?;
            let AttestationIssued {
                uid,
                schemaId: schema_id,
                issuer,
                subject,
                issuedAt: issued_at,
                expiresAt: expires_at,
                dataCid: data_cid,
            } = decoded.data;

            Ok(Some(AttestationEvent::Issued {
                uid,
                schema_id,
                issuer,
                subject,
                issued_at,
                expires_at,
                data_cid,
                meta,
            }))
        } else if *topic0 == AttestationRevoked::SIGNATURE_HASH {
            let decoded = AttestationRevoked::decode_log(log.as_ref(), true)
                .context("Failed to decode AttestationRevoked event")?;
            let meta = EventMeta::from_log(log)?;
            let AttestationRevoked { uid, revoker } = decoded.data;

            Ok(Some(AttestationEvent::Revoked { uid, revoker, meta }))
        } else {
            Ok(None)
        }
    }
}

/// Decoded delegation registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationEvent {
    /// An owner granted authority to an agent.
    Created {
        /// Delegation id
        id: B256,
        /// Granting identity
        owner: Address,
        /// Receiving agent
        agent: Address,
        /// Capability bitmask
        scope: u64,
        /// Expiry time, unix seconds; 0 means no expiry
        expires_at: u64,
        /// Block coordinates
        meta: EventMeta,
    },
    /// A delegation was revoked.
    Revoked {
        /// Delegation id
        id: B256,
        /// Address that performed the revocation
        revoker: Address,
        /// Block coordinates
        meta: EventMeta,
    },
}

impl DelegationEvent {
    /// Decode a delegation registry log by topic0. `None` for topics we do not index.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };

        if *topic0 == DelegationCreated::SIGNATURE_HASH {
            let decoded = DelegationCreated::decode_log(log.as_ref(), true)
                .context("Failed to decode DelegationCreated event")?;
            let meta = EventMeta::from_log(log)?;
            let DelegationCreated {
                id,
                owner,
                agent,
                scope,
                expiresAt: expires_at,
            } = decoded.data;

            Ok(Some(DelegationEvent::Created {
                id,
                owner,
                agent,
                scope,
                expires_at,
                meta,
            }))
        } else if *topic0 == DelegationRevoked::SIGNATURE_HASH {
            let decoded = DelegationRevoked::decode_log(log.as_ref(), true)
                .context("Failed to decode DelegationRevoked event")?;
            let meta = EventMeta::from_log(log)?;
            let DelegationRevoked { id, revoker } = decoded.data;

            Ok(Some(DelegationEvent::Revoked { id, revoker, meta }))
        } else {
            Ok(None)
        }
    }
}

/// Decoded revocation registry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationEvent {
    /// A credential was revoked through the standalone registry.
    Revoked {
        /// Revoked credential id
        credential_id: B256,
        /// Address that performed the revocation
        revoker: Address,
        /// Optional revocation reason; empty string means none
        reason: String,
        /// Block coordinates
        meta: EventMeta,
    },
}

impl RevocationEvent {
    /// Decode a revocation registry log by topic0. `None` for topics we do not index.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };

        if *topic0 == CredentialRevoked::SIGNATURE_HASH {
            let decoded = CredentialRevoked::decode_log(log.as_ref(), true)
                .context("Failed to decode CredentialRevoked event")?;
            let meta = EventMeta::from_log(log)?;
            let CredentialRevoked {
                credentialId: credential_id,
                revoker,
                reason,
            } = decoded.data;

            Ok(Some(RevocationEvent::Revoked {
                credential_id,
                revoker,
                reason,
                meta,
            }))
        } else {
            Ok(None)
        }
    }
}

/// Event batches fetched from all five registries for one block range.
#[derive(Debug, Clone, Default)]
pub struct RegistryEvents {
    /// DID registry events
    pub dids: Vec<DidEvent>,

    /// Schema registry events
    pub schemas: Vec<SchemaEvent>,

    /// Attestation registry events
    pub attestations: Vec<AttestationEvent>,

    /// Delegation registry events
    pub delegations: Vec<DelegationEvent>,

    /// Revocation registry events
    pub revocations: Vec<RevocationEvent>,
}

impl RegistryEvents {
    /// Total number of decoded events across all registries.
    pub fn len(&self) -> usize {
        self.dids.len()
            + self.schemas.len()
            + self.attestations.len()
            + self.delegations.len()
            + self.revocations.len()
    }

    /// True when no registry produced an event.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    fn wrap(data: LogData, block_number: u64) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x11),
                data,
            },
            block_hash: None,
            block_number: Some(block_number),
            block_timestamp: None,
            transaction_hash: Some(B256::repeat_byte(0xaa)),
            transaction_index: Some(0),
            log_index: Some(3),
            removed: false,
        }
    }

    #[test]
    fn test_decode_did_created() {
        let raw = DIDCreated {
            identity: Address::repeat_byte(0x01),
            controller: Address::repeat_byte(0x02),
            metadataCid: "QmIdentityDoc".to_string(),
            timestamp: 1_700_000_000,
        };
        let log = wrap(raw.encode_log_data(), 42);

        let event = DidEvent::from_log(&log).unwrap().unwrap();
        match event {
            DidEvent::Created {
                identity,
                controller,
                metadata_cid,
                timestamp,
                meta,
            } => {
                assert_eq!(identity, Address::repeat_byte(0x01));
                assert_eq!(controller, Address::repeat_byte(0x02));
                assert_eq!(metadata_cid, "QmIdentityDoc");
                assert_eq!(timestamp, 1_700_000_000);
                assert_eq!(meta.block_number, 42);
                assert_eq!(meta.log_index, 3);
                assert_eq!(meta.tx_hash, B256::repeat_byte(0xaa));
            }
            other => panic!("Expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_recovery_executed() {
        let raw = RecoveryExecuted {
            identity: Address::repeat_byte(0x01),
            newController: Address::repeat_byte(0x03),
            timestamp: 1_700_000_100,
        };
        let log = wrap(raw.encode_log_data(), 43);

        let event = DidEvent::from_log(&log).unwrap().unwrap();
        assert_eq!(
            event,
            DidEvent::Recovered {
                identity: Address::repeat_byte(0x01),
                new_controller: Address::repeat_byte(0x03),
                timestamp: 1_700_000_100,
                meta: EventMeta {
                    block_number: 43,
                    log_index: 3,
                    tx_hash: B256::repeat_byte(0xaa),
                },
            }
        );
    }

    #[test]
    fn test_unknown_topic_is_skipped() {
        // A schema registration log handed to the DID decoder.
        let raw = SchemaRegistered {
            schemaId: B256::repeat_byte(0x10),
            creator: Address::repeat_byte(0x01),
            name: "KYCVerification".to_string(),
            version: "1.0.0".to_string(),
            schemaCid: "QmSchemaDoc".to_string(),
        };
        let log = wrap(raw.encode_log_data(), 44);

        assert!(DidEvent::from_log(&log).unwrap().is_none());
        assert!(SchemaEvent::from_log(&log).unwrap().is_some());
    }

    #[test]
    fn test_decode_fails_without_block_number() {
        let raw = AttestationRevoked {
            uid: B256::repeat_byte(0x20),
            revoker: Address::repeat_byte(0x01),
        };
        let mut log = wrap(raw.encode_log_data(), 45);
        log.block_number = None;

        let err = AttestationEvent::from_log(&log).unwrap_err();
        assert!(err.to_string().contains("block_number"));
    }

    #[test]
    fn test_decode_attestation_issued_zero_expiry() {
        let raw = AttestationIssued {
            uid: B256::repeat_byte(0x20),
            schemaId: B256::repeat_byte(0x10),
            issuer: Address::repeat_byte(0x01),
            subject: Address::repeat_byte(0x02),
            issuedAt: 1_700_000_000,
            expiresAt: 0,
            dataCid: "QmAttestation".to_string(),
        };
        let log = wrap(raw.encode_log_data(), 46);

        let event = AttestationEvent::from_log(&log).unwrap().unwrap();
        match event {
            AttestationEvent::Issued {
                uid,
                issued_at,
                expires_at,
                ..
            } => {
                assert_eq!(uid, B256::repeat_byte(0x20));
                assert_eq!(issued_at, 1_700_000_000);
                // Zero stays zero here; the processor maps it to NULL.
                assert_eq!(expires_at, 0);
            }
            other => panic!("Expected Issued, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delegation_created() {
        let raw = DelegationCreated {
            id: B256::repeat_byte(0x30),
            owner: Address::repeat_byte(0x01),
            agent: Address::repeat_byte(0x02),
            scope: 5,
            expiresAt: 1_800_000_000,
        };
        let log = wrap(raw.encode_log_data(), 47);

        let event = DelegationEvent::from_log(&log).unwrap().unwrap();
        match event {
            DelegationEvent::Created {
                id, scope, expires_at, ..
            } => {
                assert_eq!(id, B256::repeat_byte(0x30));
                assert_eq!(scope, 5);
                assert_eq!(expires_at, 1_800_000_000);
            }
            other => panic!("Expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_credential_revoked() {
        let raw = CredentialRevoked {
            credentialId: B256::repeat_byte(0x40),
            revoker: Address::repeat_byte(0x01),
            reason: "key compromise".to_string(),
        };
        let log = wrap(raw.encode_log_data(), 48);

        let event = RevocationEvent::from_log(&log).unwrap().unwrap();
        let RevocationEvent::Revoked {
            credential_id,
            reason,
            ..
        } = event;
        assert_eq!(credential_id, B256::repeat_byte(0x40));
        assert_eq!(reason, "key compromise");
    }

    #[test]
    fn test_registry_events_len() {
        let mut events = RegistryEvents::default();
        assert!(events.is_empty());

        events.dids.push(DidEvent::Recovered {
            identity: Address::repeat_byte(0x01),
            new_controller: Address::repeat_byte(0x02),
            timestamp: 0,
            meta: EventMeta {
                block_number: 1,
                log_index: 0,
                tx_hash: B256::ZERO,
            },
        });
        events.revocations.push(RevocationEvent::Revoked {
            credential_id: B256::ZERO,
            revoker: Address::ZERO,
            reason: String::new(),
            meta: EventMeta {
                block_number: 1,
                log_index: 0,
                tx_hash: B256::ZERO,
            },
        });

        assert_eq!(events.len(), 2);
        assert!(!events.is_empty());
    }
}
