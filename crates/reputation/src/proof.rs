//! Score proof generation and verification.
//!
//! A score proof is a Merkle inclusion proof over a tree whose leaves are
//! keccak hashes of `{subject}:{score}:{timestamp}` strings. The engine
//! currently builds one-leaf trees (root = leaf, empty sibling path), but
//! verification folds arbitrary paths so batched trees verify the same way.

use agenttrust_core::hashing::{compute_score_leaf, fold_proof};

use crate::types::ScoreProof;

/// Build the inclusion proof for a single score.
pub fn generate_score_proof(subject: &str, score: f64, timestamp: i64) -> ScoreProof {
    let leaf = compute_score_leaf(subject, score, timestamp);

    ScoreProof {
        subject: subject.to_string(),
        score,
        merkle_root: leaf,
        proof: Vec::new(),
        timestamp,
    }
}

/// Check a submitted proof against its own claimed root.
///
/// Recomputes the leaf from the submitted subject, score, and timestamp,
/// folds it through the sibling path, and compares with the submitted root.
/// Any tampered field changes the recomputed root and fails the comparison.
pub fn verify_score_proof(proof: &ScoreProof) -> bool {
    let leaf = compute_score_leaf(&proof.subject, proof.score, proof.timestamp);
    fold_proof(leaf, &proof.proof) == proof.merkle_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenttrust_core::hashing::combine_sorted;
    use alloy_primitives::B256;

    const SUBJECT: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn generated_proofs_verify() {
        let proof = generate_score_proof(SUBJECT, 45.0, 1_700_000_000);
        assert!(proof.proof.is_empty());
        assert!(verify_score_proof(&proof));
    }

    #[test]
    fn fractional_scores_verify() {
        let proof = generate_score_proof(SUBJECT, 32.645833333333336, 1_700_000_000);
        assert!(verify_score_proof(&proof));
    }

    #[test]
    fn tampered_fields_fail() {
        let proof = generate_score_proof(SUBJECT, 45.0, 1_700_000_000);

        let mut tampered = proof.clone();
        tampered.score = 99.0;
        assert!(!verify_score_proof(&tampered));

        let mut tampered = proof.clone();
        tampered.subject = "0x1234567890abcdef1234567890abcdef12345679".to_string();
        assert!(!verify_score_proof(&tampered));

        let mut tampered = proof.clone();
        tampered.timestamp += 1;
        assert!(!verify_score_proof(&tampered));
    }

    #[test]
    fn flipped_root_byte_fails() {
        let proof = generate_score_proof(SUBJECT, 45.0, 1_700_000_000);

        for i in 0..32 {
            let mut tampered = proof.clone();
            let mut bytes = tampered.merkle_root.0;
            bytes[i] ^= 0x01;
            tampered.merkle_root = B256::from(bytes);
            assert!(!verify_score_proof(&tampered), "flip at byte {}", i);
        }
    }

    #[test]
    fn sibling_paths_fold_into_the_root() {
        // A two-leaf tree: the root is the sorted pair hash, and each leaf
        // proves inclusion with the other as its sibling.
        let leaf = agenttrust_core::hashing::compute_score_leaf(SUBJECT, 45.0, 1_700_000_000);
        let sibling = agenttrust_core::hashing::compute_score_leaf(
            "0x9999999999999999999999999999999999999999",
            12.0,
            1_700_000_000,
        );
        let root = combine_sorted(&leaf, &sibling);

        let proof = ScoreProof {
            subject: SUBJECT.to_string(),
            score: 45.0,
            merkle_root: root,
            proof: vec![sibling],
            timestamp: 1_700_000_000,
        };
        assert!(verify_score_proof(&proof));

        let mut wrong_sibling = proof.clone();
        wrong_sibling.proof = vec![leaf];
        assert!(!verify_score_proof(&wrong_sibling));
    }
}
