//! Proof construction over the backing store.

use crate::{
    constant::{TREE_DEPTH, ZERO_HASH},
    hasher::{hash_key, leaf_hash},
    proof::ProofError,
    traits::OrderedStore,
    tree::path::{divergence_index, get_bit},
    tree::Hubt,
    types::{MismatchProof, NodeKey, NonExistenceProof, Path, Proof, ProofNode},
};
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Wraps a backend read failure into the prover error type.
fn store_err<E: Debug>(err: E) -> ProofError {
    ProofError::Store(format!("{err:?}"))
}

/// Prefix-affinity of a candidate neighbor: shared bits with the target,
/// capped at the candidate's own depth so zero-padding beyond it cannot
/// inflate the score.
fn neighbor_score(target: &Path, key: &NodeKey) -> u16 {
    divergence_index(target, &key.path).min(key.len)
}

impl<'a, S: OrderedStore> Hubt<'a, S> {
    /// Proves that `key` maps to `value`.
    ///
    /// Returns [`ProofError::NotFound`] when the key is absent — or
    /// present with a different value, since an inclusion proof for the
    /// wrong value could never verify.
    pub fn prove(&self, key: &[u8], value: &[u8]) -> Result<Proof, ProofError> {
        let path = hash_key(key);
        let leaf = leaf_hash(key, value);
        let stored = self
            .store
            .lookup(&NodeKey::leaf(path))
            .map_err(store_err)?;
        if stored != Some(leaf) {
            return Err(ProofError::NotFound);
        }
        Ok(Proof {
            root: self.root().map_err(store_err)?,
            nodes: self.proof_nodes(&path, TREE_DEPTH)?,
        })
    }

    /// Proves that `key` is absent from the tree.
    ///
    /// For a non-empty tree the proof shows membership of the stored node
    /// sharing the longest path prefix with the target — picked between the
    /// target position's two sort-order neighbors, ties going to the lower
    /// one. The verifier then checks that the target's path branches away
    /// from the proven node into an empty subtree.
    pub fn prove_non_existence(&self, key: &[u8]) -> Result<NonExistenceProof, ProofError> {
        let target = hash_key(key);
        let leaf_key = NodeKey::leaf(target);
        let below = self.store.floor(&leaf_key).map_err(store_err)?;
        let above = self.store.next(&leaf_key).map_err(store_err)?;

        let (winner, winner_hash) = match (below, above) {
            (None, None) => {
                return Ok(NonExistenceProof::EmptyTree {
                    proof: Proof {
                        root: ZERO_HASH,
                        nodes: Vec::new(),
                    },
                })
            }
            (Some(entry), None) | (None, Some(entry)) => entry,
            (Some(prev_entry), Some(next_entry)) => {
                if neighbor_score(&target, &next_entry.0) > neighbor_score(&target, &prev_entry.0) {
                    next_entry
                } else {
                    prev_entry
                }
            }
        };

        if winner.is_leaf() && winner.path == target {
            return Err(ProofError::KeyExists);
        }
        Ok(NonExistenceProof::Neighbor {
            proven_path: winner.path,
            proven_hash: winner_hash,
            proof: Proof {
                root: self.root().map_err(store_err)?,
                nodes: self.proof_nodes(&winner.path, winner.len)?,
            },
        })
    }

    /// Proves that `key` is present but maps to a value other than
    /// `claimed_value`.
    pub fn prove_mismatch(
        &self,
        key: &[u8],
        claimed_value: &[u8],
    ) -> Result<MismatchProof, ProofError> {
        let path = hash_key(key);
        let claimed = leaf_hash(key, claimed_value);
        let Some(actual) = self
            .store
            .lookup(&NodeKey::leaf(path))
            .map_err(store_err)?
        else {
            return Err(ProofError::KeyNotFound);
        };
        if actual == claimed {
            return Err(ProofError::ValueMatches);
        }
        Ok(MismatchProof {
            actual_hash: actual,
            claimed_hash: claimed,
            proof: Proof {
                root: self.root().map_err(store_err)?,
                nodes: self.proof_nodes(&path, TREE_DEPTH)?,
            },
        })
    }

    /// Sibling chain for the node at `(path, len)`, ordered from the leaf
    /// end upward.
    ///
    /// Collects the stored ancestors strictly above `len`, deepest first,
    /// and emits for each the hash of the subtree on the opposite side of
    /// the target path.
    fn proof_nodes(&self, path: &Path, len: u16) -> Result<Vec<ProofNode>, ProofError> {
        let mut chain = BTreeSet::new();
        self.collect_path_nodes(path, &mut chain).map_err(store_err)?;

        let mut ancestors: Vec<NodeKey> = chain.into_iter().filter(|k| k.len < len).collect();
        ancestors.sort_unstable_by(|a, b| b.len.cmp(&a.len));

        let mut nodes = Vec::with_capacity(ancestors.len());
        for ancestor in ancestors {
            let sibling_dir = 1 - get_bit(path, ancestor.len);
            let hash = self
                .child_hash(&ancestor.path, ancestor.len, sibling_dir)
                .map_err(store_err)?;
            nodes.push(ProofNode {
                hash,
                direction: sibling_dir,
                len: ancestor.len,
            });
        }
        Ok(nodes)
    }
}
