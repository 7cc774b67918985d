//! Chain access for the sync engine.
//!
//! [`EventSource`] abstracts the chain so the engine can be driven by a mock
//! in tests. The production implementation queries each registry contract
//! over JSON-RPC with one `eth_getLogs` call per registry and decodes the
//! results in block order (node responses are ordered by block and log index).

use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::trace;

use crate::config::ContractsConfig;
use crate::listener::events::{
    AttestationEvent, DelegationEvent, DidEvent, RegistryEvents, RevocationEvent, SchemaEvent,
};

/// Source of registry events for a block range.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Latest block number the chain has reached.
    async fn chain_head(&self) -> Result<u64>;

    /// Fetch and decode all registry events in `[from_block, to_block]`,
    /// inclusive on both ends.
    async fn fetch_events(&self, from_block: u64, to_block: u64) -> Result<RegistryEvents>;
}

/// JSON-RPC backed event source.
#[derive(Clone)]
pub struct RpcProvider {
    provider: RootProvider<Http<Client>>,
    contracts: ContractsConfig,
}

impl RpcProvider {
    /// Connect to an HTTP JSON-RPC endpoint.
    pub fn new(rpc_url: &str, contracts: ContractsConfig) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            provider,
            contracts,
        })
    }

    /// Fetch raw logs emitted by one registry contract in the range.
    async fn registry_logs(
        &self,
        address: alloy::primitives::Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(address)
            .from_block(from_block)
            .to_block(to_block);

        self.provider
            .get_logs(&filter)
            .await
            .with_context(|| format!("Failed to fetch logs for registry {}", address))
    }
}

/// Decode every log from one registry, skipping topics the indexer does not
/// track. A log that matches a tracked topic but fails to decode aborts the
/// whole fetch so the cursor never advances past it.
fn decode_registry<T>(
    logs: &[Log],
    decode: fn(&Log) -> Result<Option<T>>,
    registry: &str,
) -> Result<Vec<T>> {
    let mut events = Vec::with_capacity(logs.len());
    for log in logs {
        match decode(log)? {
            Some(event) => events.push(event),
            None => {
                trace!(
                    registry,
                    topic0 = ?log.topic0(),
                    "Skipping untracked event topic"
                );
            }
        }
    }

    Ok(events)
}

#[async_trait]
impl EventSource for RpcProvider {
    async fn chain_head(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to fetch chain head")
    }

    async fn fetch_events(&self, from_block: u64, to_block: u64) -> Result<RegistryEvents> {
        let (dids, schemas, attestations, delegations, revocations) = tokio::try_join!(
            self.registry_logs(self.contracts.did_registry, from_block, to_block),
            self.registry_logs(self.contracts.schema_registry, from_block, to_block),
            self.registry_logs(self.contracts.attestation_registry, from_block, to_block),
            self.registry_logs(self.contracts.delegation_registry, from_block, to_block),
            self.registry_logs(self.contracts.revocation_registry, from_block, to_block),
        )?;

        Ok(RegistryEvents {
            dids: decode_registry(&dids, DidEvent::from_log, "did")?,
            schemas: decode_registry(&schemas, SchemaEvent::from_log, "schema")?,
            attestations: decode_registry(&attestations, AttestationEvent::from_log, "attestation")?,
            delegations: decode_registry(&delegations, DelegationEvent::from_log, "delegation")?,
            revocations: decode_registry(&revocations, RevocationEvent::from_log, "revocation")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256};
    use alloy::sol_types::SolEvent;

    use crate::listener::events::{AttestationIssued, DIDCreated};

    fn wrap(data: alloy::primitives::LogData, block_number: u64) -> Log {
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
            log_index: Some(0),
            removed: false,
        }
    }

    #[test]
    fn test_decode_registry_skips_untracked_topics() {
        let did_log = wrap(
            DIDCreated {
                identity: Address::repeat_byte(0x01),
                controller: Address::repeat_byte(0x02),
                metadataCid: "QmDoc".to_string(),
                timestamp: 1_700_000_000,
            }
            .encode_log_data(),
            10,
        );
        let foreign_log = wrap(
            AttestationIssued {
                uid: B256::repeat_byte(0x20),
                schemaId: B256::repeat_byte(0x10),
                issuer: Address::repeat_byte(0x01),
                subject: Address::repeat_byte(0x02),
                issuedAt: 1_700_000_000,
                expiresAt: 0,
                dataCid: "QmAtt".to_string(),
            }
            .encode_log_data(),
            11,
        );

        let events =
            decode_registry(&[did_log, foreign_log], DidEvent::from_log, "did").unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_decode_registry_propagates_metadata_errors() {
        let mut log = wrap(
            DIDCreated {
                identity: Address::repeat_byte(0x01),
                controller: Address::repeat_byte(0x02),
                metadataCid: "QmDoc".to_string(),
                timestamp: 1_700_000_000,
            }
            .encode_log_data(),
            10,
        );
        log.transaction_hash = None;

        let err = decode_registry(&[log], DidEvent::from_log, "did").unwrap_err();
        assert!(err.to_string().contains("transaction_hash"));
    }

    #[test]
    fn test_rejects_invalid_rpc_url() {
        let contracts = ContractsConfig {
            did_registry: Address::repeat_byte(0x01),
            schema_registry: Address::repeat_byte(0x02),
            attestation_registry: Address::repeat_byte(0x03),
            delegation_registry: Address::repeat_byte(0x04),
            revocation_registry: Address::repeat_byte(0x05),
        };

        assert!(RpcProvider::new("not a url", contracts).is_err());
    }
}
