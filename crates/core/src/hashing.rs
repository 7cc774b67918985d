//! Hashing utilities for AgentTrust score proofs.
//!
//! Provides keccak256 hashing, score leaf computation, and the sorted-pair
//! Merkle fold used by proof generation and verification.

use alloy_primitives::{keccak256 as alloy_keccak256, B256};

/// Compute keccak256 hash of input data.
///
/// This is a re-export of Alloy's keccak256 for convenience.
///
/// # Example
///
/// ```
/// use agenttrust_core::hashing::keccak256;
///
/// let data = b"hello";
/// let hash = keccak256(data);
/// ```
pub fn keccak256(data: &[u8]) -> B256 {
    alloy_keccak256(data)
}

/// Compute the Merkle leaf for a reputation score.
///
/// The leaf preimage is the UTF-8 string `{subject}:{score}:{timestamp}`:
/// `subject` is the lowercase 0x-prefixed address string, `score` the shortest
/// decimal rendering of the f64 (so `45.0` hashes as `"45"`), and `timestamp`
/// epoch seconds. Verifiers on any platform can rebuild the preimage from the
/// three submitted fields alone.
///
/// # Example
///
/// ```
/// use agenttrust_core::hashing::compute_score_leaf;
///
/// let leaf = compute_score_leaf("0x1111111111111111111111111111111111111111", 45.0, 1_700_000_000);
/// ```
pub fn compute_score_leaf(subject: &str, score: f64, timestamp: i64) -> B256 {
    let preimage = format!("{}:{}:{}", subject, score, timestamp);
    keccak256(preimage.as_bytes())
}

/// Hash a pair of nodes, ordering the pair byte-wise first.
///
/// The hash is `keccak256(min(a,b) || max(a,b))`. Sorting makes the fold
/// commutative, so proofs carry no left/right position bits.
pub fn combine_sorted(a: &B256, b: &B256) -> B256 {
    let mut data = [0u8; 64];
    if a.as_slice() <= b.as_slice() {
        data[..32].copy_from_slice(a.as_slice());
        data[32..].copy_from_slice(b.as_slice());
    } else {
        data[..32].copy_from_slice(b.as_slice());
        data[32..].copy_from_slice(a.as_slice());
    }
    keccak256(&data)
}

/// Fold a leaf through a sibling path, returning the implied Merkle root.
///
/// An empty path returns the leaf itself (the root of a one-leaf tree).
pub fn fold_proof(leaf: B256, siblings: &[B256]) -> B256 {
    siblings
        .iter()
        .fold(leaf, |acc, sibling| combine_sorted(&acc, sibling))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn test_keccak256() {
        // Known Keccak256 vectors (not SHA3-256!)
        let input = b"";
        let expected = B256::from(hex!(
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        ));
        assert_eq!(keccak256(input), expected);

        let input = b"abc";
        let expected = B256::from(hex!(
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        ));
        assert_eq!(keccak256(input), expected);
    }

    #[test]
    fn test_score_leaf_matches_manual_preimage() {
        let subject = "0x1234567890abcdef1234567890abcdef12345678";
        let leaf = compute_score_leaf(subject, 72.5, 1_700_000_000);

        let preimage = format!("{}:72.5:1700000000", subject);
        assert_eq!(leaf, keccak256(preimage.as_bytes()));
    }

    #[test]
    fn test_score_leaf_integral_score_renders_without_fraction() {
        // 45.0 must hash the same as the literal string "45".
        let subject = "0x1234567890abcdef1234567890abcdef12345678";
        let leaf = compute_score_leaf(subject, 45.0, 1_700_000_000);

        let preimage = format!("{}:45:1700000000", subject);
        assert_eq!(leaf, keccak256(preimage.as_bytes()));
    }

    #[test]
    fn test_score_leaf_sensitive_to_every_field() {
        let subject = "0x1234567890abcdef1234567890abcdef12345678";
        let leaf = compute_score_leaf(subject, 45.0, 1_700_000_000);

        assert_ne!(
            leaf,
            compute_score_leaf(
                "0x1234567890abcdef1234567890abcdef12345679",
                45.0,
                1_700_000_000
            )
        );
        assert_ne!(leaf, compute_score_leaf(subject, 45.1, 1_700_000_000));
        assert_ne!(leaf, compute_score_leaf(subject, 45.0, 1_700_000_001));
    }

    #[test]
    fn test_combine_sorted_is_commutative() {
        let a = B256::from(hex!(
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
        ));
        let b = B256::from(hex!(
            "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
        ));

        assert_eq!(combine_sorted(&a, &b), combine_sorted(&b, &a));

        // The sorted preimage is min || max.
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(a.as_slice());
        preimage.extend_from_slice(b.as_slice());
        assert_eq!(combine_sorted(&a, &b), keccak256(&preimage));
    }

    #[test]
    fn test_combine_sorted_equal_inputs() {
        let a = B256::from(hex!(
            "1111111111111111111111111111111111111111111111111111111111111111"
        ));
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(a.as_slice());
        preimage.extend_from_slice(a.as_slice());
        assert_eq!(combine_sorted(&a, &a), keccak256(&preimage));
    }

    #[test]
    fn test_fold_proof_empty_path_is_identity() {
        let leaf = compute_score_leaf("0x1111111111111111111111111111111111111111", 50.0, 1);
        assert_eq!(fold_proof(leaf, &[]), leaf);
    }

    #[test]
    fn test_fold_proof_pair_order_independent_but_level_order_dependent() {
        let leaf = B256::from(hex!(
            "0101010101010101010101010101010101010101010101010101010101010101"
        ));
        let s1 = B256::from(hex!(
            "0202020202020202020202020202020202020202020202020202020202020202"
        ));
        let s2 = B256::from(hex!(
            "0303030303030303030303030303030303030303030303030303030303030303"
        ));

        let root = fold_proof(leaf, &[s1, s2]);
        assert_eq!(root, combine_sorted(&combine_sorted(&leaf, &s1), &s2));

        // Each pair is sorted, but the fold applies siblings level by level.
        assert_ne!(root, fold_proof(leaf, &[s2, s1]));
    }
}
