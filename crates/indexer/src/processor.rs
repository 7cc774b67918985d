//! Event processors applying decoded registry events to storage.
//!
//! Events are applied in delivery order within each registry. A failing
//! event aborts the whole batch, so the sync cursor never advances over a
//! partially applied range and the range is retried as a unit.
//!
//! Creation events upsert so re-delivered ranges stay idempotent; revocation
//! events only flip existing rows and never resurrect cleared state.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use agenttrust_core::{address_hex, bytes32_hex, DelegationScope};
use crate::listener::events::{
    AttestationEvent, DelegationEvent, DidEvent, RegistryEvents, RevocationEvent, SchemaEvent,
};
use crate::storage::{
    AttestationRecord, DelegationRecord, DidRecord, RevocationRecord, SchemaRecord, Storage,
};

/// Apply one fetched batch of registry events.
pub async fn apply(storage: &Storage, events: RegistryEvents) -> Result<()> {
    tokio::try_join!(
        process_did_events(storage, &events.dids),
        process_schema_events(storage, &events.schemas),
        process_attestation_events(storage, &events.attestations),
        process_delegation_events(storage, &events.delegations),
        process_revocation_events(storage, &events.revocations),
    )?;

    Ok(())
}

/// Apply DID registry events: creations upsert, recoveries reassign the
/// controller of an already indexed identity.
pub async fn process_did_events(storage: &Storage, events: &[DidEvent]) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    for event in events {
        match event {
            DidEvent::Created {
                identity,
                controller,
                metadata_cid,
                timestamp,
                meta,
            } => {
                let record = DidRecord {
                    id: *identity,
                    controller: *controller,
                    metadata_cid: metadata_cid.clone(),
                    active: true,
                    updated_at: *timestamp as i64,
                    tx_hash: meta.tx_hash,
                    block_number: meta.block_number,
                };
                storage
                    .upsert_did(&record)
                    .await
                    .context("Failed to apply DIDCreated event")?;

                info!(
                    "Indexed DID creation: identity={}, block={}",
                    address_hex(identity),
                    meta.block_number
                );
            }
            DidEvent::Recovered {
                identity,
                new_controller,
                timestamp: _,
                meta,
            } => {
                let updated = storage
                    .set_did_controller(identity, new_controller, &meta.tx_hash, meta.block_number)
                    .await
                    .context("Failed to apply RecoveryExecuted event")?;

                if updated {
                    info!(
                        "Indexed DID recovery: identity={}, new_controller={}, block={}",
                        address_hex(identity),
                        address_hex(new_controller),
                        meta.block_number
                    );
                } else {
                    warn!(
                        "Recovery for unknown DID: identity={}, block={}",
                        address_hex(identity),
                        meta.block_number
                    );
                }
            }
        }
    }

    Ok(())
}

/// Apply schema registry events.
pub async fn process_schema_events(storage: &Storage, events: &[SchemaEvent]) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    for event in events {
        let SchemaEvent::Registered {
            schema_id,
            creator,
            name,
            version,
            schema_cid,
            meta,
        } = event;

        let record = SchemaRecord {
            id: *schema_id,
            creator: *creator,
            name: name.clone(),
            version: version.clone(),
            schema_cid: schema_cid.clone(),
            created_at: chrono::Utc::now().timestamp(),
            active: true,
            tx_hash: meta.tx_hash,
        };
        storage
            .upsert_schema(&record)
            .await
            .context("Failed to apply SchemaRegistered event")?;

        info!(
            "Indexed schema: id={}, name={}, version={}",
            bytes32_hex(schema_id),
            name,
            version
        );
    }

    Ok(())
}

/// Apply attestation registry events: issuances upsert, revocations flip
/// the revoked flag on already indexed rows.
pub async fn process_attestation_events(
    storage: &Storage,
    events: &[AttestationEvent],
) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    for event in events {
        match event {
            AttestationEvent::Issued {
                uid,
                schema_id,
                issuer,
                subject,
                issued_at,
                expires_at,
                data_cid,
                meta,
            } => {
                let record = AttestationRecord {
                    uid: *uid,
                    schema_id: *schema_id,
                    issuer: *issuer,
                    subject: *subject,
                    issued_at: *issued_at as i64,
                    // The contract emits 0 for attestations without expiry.
                    expires_at: (*expires_at > 0).then(|| *expires_at as i64),
                    data_cid: data_cid.clone(),
                    revoked: false,
                    revoked_at: None,
                    tx_hash: meta.tx_hash,
                    block_number: meta.block_number,
                };
                storage
                    .upsert_attestation(&record)
                    .await
                    .context("Failed to apply AttestationIssued event")?;

                info!(
                    "Indexed attestation: uid={}, subject={}, block={}",
                    bytes32_hex(uid),
                    address_hex(subject),
                    meta.block_number
                );
            }
            AttestationEvent::Revoked { uid, revoker, meta } => {
                let updated = storage
                    .mark_attestation_revoked(uid, chrono::Utc::now().timestamp(), &meta.tx_hash)
                    .await
                    .context("Failed to apply AttestationRevoked event")?;

                if updated {
                    info!(
                        "Indexed attestation revocation: uid={}, revoker={}",
                        bytes32_hex(uid),
                        address_hex(revoker)
                    );
                } else {
                    warn!("Revocation for unknown attestation: uid={}", bytes32_hex(uid));
                }
            }
        }
    }

    Ok(())
}

/// Apply delegation registry events.
pub async fn process_delegation_events(
    storage: &Storage,
    events: &[DelegationEvent],
) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    for event in events {
        match event {
            DelegationEvent::Created {
                id,
                owner,
                agent,
                scope,
                expires_at,
                meta,
            } => {
                let record = DelegationRecord {
                    id: *id,
                    owner: *owner,
                    agent: *agent,
                    scope: DelegationScope::from(*scope),
                    expires_at: (*expires_at > 0).then(|| *expires_at as i64),
                    created_at: chrono::Utc::now().timestamp(),
                    revoked: false,
                    revoked_at: None,
                    tx_hash: meta.tx_hash,
                };
                storage
                    .upsert_delegation(&record)
                    .await
                    .context("Failed to apply DelegationCreated event")?;

                info!(
                    "Indexed delegation: id={}, owner={}, agent={}",
                    bytes32_hex(id),
                    address_hex(owner),
                    address_hex(agent)
                );
            }
            DelegationEvent::Revoked { id, revoker, meta } => {
                let updated = storage
                    .mark_delegation_revoked(id, chrono::Utc::now().timestamp(), &meta.tx_hash)
                    .await
                    .context("Failed to apply DelegationRevoked event")?;

                if updated {
                    info!(
                        "Indexed delegation revocation: id={}, revoker={}",
                        bytes32_hex(id),
                        address_hex(revoker)
                    );
                } else {
                    warn!("Revocation for unknown delegation: id={}", bytes32_hex(id));
                }
            }
        }
    }

    Ok(())
}

/// Apply standalone revocation registry events. The first revocation seen
/// for a credential id wins; later duplicates are ignored.
pub async fn process_revocation_events(
    storage: &Storage,
    events: &[RevocationEvent],
) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }

    for event in events {
        let RevocationEvent::Revoked {
            credential_id,
            revoker,
            reason,
            meta,
        } = event;

        let record = RevocationRecord {
            credential_id: *credential_id,
            revoker: *revoker,
            revoked_at: chrono::Utc::now().timestamp(),
            reason: (!reason.is_empty()).then(|| reason.clone()),
            tx_hash: meta.tx_hash,
        };
        let inserted = storage
            .insert_revocation(&record)
            .await
            .context("Failed to apply CredentialRevoked event")?;

        if inserted {
            info!(
                "Indexed credential revocation: credential_id={}, revoker={}",
                bytes32_hex(credential_id),
                address_hex(revoker)
            );
        } else {
            debug!(
                "Duplicate credential revocation ignored: credential_id={}",
                bytes32_hex(credential_id)
            );
        }
    }

    Ok(())
}
