//! Stateless proof verification.
//!
//! Every function here is total: malformed or hostile proofs yield
//! `false`, never a panic, and no store access happens at verification
//! time.

use crate::{
    constant::ZERO_HASH,
    hasher::{hash_key, leaf_hash, merge_hash},
    tree::path::divergence_index,
    types::{Hash, MismatchProof, NonExistenceProof, Proof, ProofNode},
};

/// Reconstructs a root commitment by folding a sibling chain over a
/// starting hash: direction `0` combines `H(sibling ‖ acc)`, anything else
/// `H(acc ‖ sibling)`.
pub fn calculate_root(start: &Hash, nodes: &[ProofNode]) -> Hash {
    let mut acc = *start;
    for node in nodes {
        acc = if node.direction == 0 {
            merge_hash(&node.hash, &acc)
        } else {
            merge_hash(&acc, &node.hash)
        };
    }
    acc
}

/// Verifies an inclusion proof: `key` maps to `value` under `proof.root`.
pub fn verify(key: &[u8], value: &[u8], proof: &Proof) -> bool {
    calculate_root(&leaf_hash(key, value), &proof.nodes) == proof.root
}

/// Verifies a non-existence proof for `key`.
///
/// The empty-tree variant is accepted only in its canonical form. The
/// neighbor variant must satisfy all three of:
///
/// 1. the proven node's hash folds to the committed root;
/// 2. the proven path differs from the target's;
/// 3. no sibling is presented at exactly the depth where the target
///    diverges from the proven path.
///
/// The third check rejects ambiguity: a sibling at the divergence depth
/// would mean the branch the target disappears into is populated, so the
/// proof would show a neighbor without showing absence.
pub fn verify_non_existence(key: &[u8], proof: &NonExistenceProof) -> bool {
    match proof {
        NonExistenceProof::EmptyTree { proof } => {
            proof.root == ZERO_HASH && proof.nodes.is_empty()
        }
        NonExistenceProof::Neighbor {
            proven_path,
            proven_hash,
            proof,
        } => {
            let target = hash_key(key);
            let divergence = divergence_index(proven_path, &target);
            calculate_root(proven_hash, &proof.nodes) == proof.root
                && proven_path != &target
                && !proof.nodes.iter().any(|node| node.len == divergence)
        }
    }
}

/// Verifies a mismatch proof: `key` is present under `proof.proof.root`
/// with a value whose hash differs from `H(key ‖ claimed_value)`.
pub fn verify_mismatch(key: &[u8], claimed_value: &[u8], proof: &MismatchProof) -> bool {
    proof.actual_hash != leaf_hash(key, claimed_value)
        && calculate_root(&proof.actual_hash, &proof.proof.nodes) == proof.proof.root
}
