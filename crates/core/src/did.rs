//! `did:agent` identifier codec.
//!
//! AgentTrust identifies on-chain agents with DIDs of the form
//! `did:agent:<chainId>:<address>` where the address part is lowercase hex
//! without the `0x` prefix. The mapping between an address and its DID is a
//! pure, reversible string transform for a fixed chain id.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::address_hex;

/// DID method name used by AgentTrust identities.
pub const DID_METHOD: &str = "agent";

/// A parsed agent DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Did {
    /// Chain the identity is anchored on.
    pub chain_id: u64,
    /// On-chain identity address.
    pub address: Address,
}

impl Did {
    /// Create a DID from its parts.
    pub const fn new(chain_id: u64, address: Address) -> Self {
        Did { chain_id, address }
    }

    /// The lowercase 0x-prefixed address string this DID resolves to.
    ///
    /// This is the canonical key used for storage lookups.
    pub fn address_hex(&self) -> String {
        address_hex(&self.address)
    }

    /// Parse a subject that may be either a DID string or a bare address.
    ///
    /// Bare addresses (with or without `0x`, any case) are bound to
    /// `chain_id`. DID strings carry their own chain id, which is kept.
    pub fn parse_subject(subject: &str, chain_id: u64) -> Result<Self, CoreError> {
        if subject.starts_with("did:") {
            return subject.parse();
        }
        let address = Address::from_str(subject)
            .map_err(|_| CoreError::InvalidAddress(subject.to_string()))?;
        Ok(Did { chain_id, address })
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "did:{}:{}:{}",
            DID_METHOD,
            self.chain_id,
            hex::encode(self.address.as_slice())
        )
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidDid(s.to_string());

        let mut parts = s.split(':');
        let (scheme, method, chain, addr) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(scheme), Some(method), Some(chain), Some(addr)) => {
                    (scheme, method, chain, addr)
                }
                _ => return Err(invalid()),
            };
        if parts.next().is_some() || scheme != "did" || method != DID_METHOD {
            return Err(invalid());
        }

        let chain_id: u64 = chain.parse().map_err(|_| invalid())?;
        let address = Address::from_str(addr).map_err(|_| invalid())?;
        Ok(Did { chain_id, address })
    }
}

// DIDs travel as strings on the wire; validation runs through FromStr on the
// way back in.
impl Serialize for Did {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
