//! Core types for AgentTrust.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export Alloy types for convenience
pub use alloy_primitives::Address as EthAddress;
pub use alloy_primitives::B256 as Bytes32;

/// Delegation capability bitmask.
///
/// Scopes are emitted on-chain as a uint64 with one bit per capability.
/// Unknown bits are preserved rather than rejected so that registry upgrades
/// adding new scopes do not break older readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelegationScope(pub u64);

impl DelegationScope {
    /// Read access to the owner's resources.
    pub const READ: DelegationScope = DelegationScope(1);

    /// Write access to the owner's resources.
    pub const WRITE: DelegationScope = DelegationScope(1 << 1);

    /// Permission to issue attestations on the owner's behalf.
    pub const ATTEST: DelegationScope = DelegationScope(1 << 2);

    /// Permission to delegate further.
    pub const DELEGATE: DelegationScope = DelegationScope(1 << 3);

    /// Scope with no capabilities set.
    pub const fn empty() -> Self {
        DelegationScope(0)
    }

    /// Get the raw bitmask value.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether every bit of `other` is set in this scope.
    pub const fn contains(&self, other: DelegationScope) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two scopes.
    pub const fn union(&self, other: DelegationScope) -> Self {
        DelegationScope(self.0 | other.0)
    }

    /// Number of capability bits set.
    pub const fn capability_count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Names of the known capabilities set in this scope.
    pub fn capability_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::READ) {
            names.push("read");
        }
        if self.contains(Self::WRITE) {
            names.push("write");
        }
        if self.contains(Self::ATTEST) {
            names.push("attest");
        }
        if self.contains(Self::DELEGATE) {
            names.push("delegate");
        }
        names
    }
}

impl From<u64> for DelegationScope {
    fn from(bits: u64) -> Self {
        DelegationScope(bits)
    }
}

// Scope values may exceed 2^53, so the wire form for clients is the decimal
// string rendered here rather than a JSON number.
impl fmt::Display for DelegationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase 0x-prefixed hex rendering of an address.
///
/// Storage and lookups key on this form; Alloy's `Display` produces the
/// EIP-55 checksummed form, which must never reach the database.
pub fn address_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr.as_slice()))
}

/// Lowercase 0x-prefixed hex rendering of a 32-byte value.
pub fn bytes32_hex(b: &B256) -> String {
    format!("0x{}", hex::encode(b.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_scope_constants_are_disjoint() {
        let all = [
            DelegationScope::READ,
            DelegationScope::WRITE,
            DelegationScope::ATTEST,
            DelegationScope::DELEGATE,
        ];
        for (i, a) in all.iter().enumerate() {
            assert_eq!(a.capability_count(), 1);
            for b in all.iter().skip(i + 1) {
                assert_eq!(a.bits() & b.bits(), 0);
            }
        }
    }

    #[test]
    fn test_scope_contains() {
        let scope = DelegationScope::READ.union(DelegationScope::ATTEST);
        assert!(scope.contains(DelegationScope::READ));
        assert!(scope.contains(DelegationScope::ATTEST));
        assert!(!scope.contains(DelegationScope::WRITE));
        assert!(!scope.contains(DelegationScope::DELEGATE));
        assert!(scope.contains(DelegationScope::empty()));
        assert_eq!(scope.capability_count(), 2);
    }

    #[test]
    fn test_scope_preserves_unknown_bits() {
        let raw = (1u64 << 40) | DelegationScope::WRITE.bits();
        let scope = DelegationScope::from(raw);
        assert_eq!(scope.bits(), raw);
        assert!(scope.contains(DelegationScope::WRITE));
        assert_eq!(scope.capability_names(), vec!["write"]);
    }

    #[test]
    fn test_scope_capability_names() {
        let scope = DelegationScope::READ
            .union(DelegationScope::WRITE)
            .union(DelegationScope::ATTEST)
            .union(DelegationScope::DELEGATE);
        assert_eq!(
            scope.capability_names(),
            vec!["read", "write", "attest", "delegate"]
        );
        assert!(DelegationScope::empty().capability_names().is_empty());
    }

    #[test]
    fn test_scope_display_is_decimal() {
        let scope = DelegationScope::from(13);
        assert_eq!(scope.to_string(), "13");
        assert_eq!(DelegationScope(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn test_scope_serde_transparent() {
        let scope = DelegationScope::READ.union(DelegationScope::DELEGATE);
        let json = serde_json::to_string(&scope).unwrap();
        assert_eq!(json, "9");
        let back: DelegationScope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scope);
    }

    #[test]
    fn test_address_hex_is_lowercase() {
        let addr = Address::from(hex!("AbCdEF1234567890abcdef1234567890ABCDEF12"));
        let rendered = address_hex(&addr);
        assert_eq!(rendered, "0xabcdef1234567890abcdef1234567890abcdef12");
        // The checksummed Display form differs in case.
        assert_ne!(rendered, addr.to_string());
        assert_eq!(rendered, addr.to_string().to_lowercase());
    }

    #[test]
    fn test_bytes32_hex() {
        let b = B256::from(hex!(
            "430FAA5635B6F437D8B5A2D66333FE4FBCF75602232A76B67E94FD4A3275169B"
        ));
        assert_eq!(
            bytes32_hex(&b),
            "0x430faa5635b6f437d8b5a2d66333fe4fbcf75602232a76b67e94fd4a3275169b"
        );
    }
}
