//! Types shared between the tree engine, the storage layer and the proof
//! machinery.

use crate::constant::{ENCODED_NODE_KEY_LEN, NODE_TAG, TREE_DEPTH};
use derive_more::{Deref, DerefMut};
use serde::{Deserialize, Serialize};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 256-bit tree path: the SHA-256 of a raw key, read as an MSB-first
/// bitstring. Stored paths are always zero-padded beyond the depth of the
/// node they address.
pub type Path = [u8; 32];

/// Addresses a node in the backing store: a 256-bit padded path plus the
/// number of leading bits that are semantically meaningful.
///
/// Leaves sit at `len == 256`; branching internal nodes at `len ∈ [0, 255]`.
/// The derived ordering — `path` as a big-endian integer first, then `len`
/// ascending — matches the byte-lexicographic order of [`Self::encode`], so
/// an ordered store may index nodes either way.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeKey {
    /// The zero-padded 256-bit path.
    pub path: Path,
    /// Number of meaningful leading bits, `0..=256`.
    pub len: u16,
}

impl NodeKey {
    /// The key of the leaf at `path`.
    #[inline]
    pub const fn leaf(path: Path) -> Self {
        Self {
            path,
            len: TREE_DEPTH,
        }
    }

    /// Whether this key addresses a leaf.
    #[inline]
    pub const fn is_leaf(&self) -> bool {
        self.len == TREE_DEPTH
    }

    /// Serializes to the canonical store encoding
    /// `tag ‖ path[0..32] ‖ len_be_u16`.
    pub fn encode(&self) -> EncodedNodeKey {
        let mut bytes = [0u8; ENCODED_NODE_KEY_LEN];
        bytes[0] = NODE_TAG;
        bytes[1..33].copy_from_slice(&self.path);
        bytes[33..35].copy_from_slice(&self.len.to_be_bytes());
        EncodedNodeKey(bytes)
    }
}

/// The canonical byte encoding of a [`NodeKey`].
///
/// Plain byte-wise comparison of encoded keys induces the same order as
/// [`NodeKey`]'s derived `Ord`, which is what lets a byte-lexicographic
/// store (a `BTreeMap` over raw bytes, RocksDB, ...) recover tree topology
/// from its own sort order.
#[derive(Clone, Copy, Debug, Deref, DerefMut, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedNodeKey(pub [u8; ENCODED_NODE_KEY_LEN]);

impl EncodedNodeKey {
    /// Deserializes back to the structured key.
    pub fn decode(&self) -> NodeKey {
        let mut path = [0u8; 32];
        path.copy_from_slice(&self.0[1..33]);
        let len = u16::from_be_bytes([self.0[33], self.0[34]]);
        NodeKey { path, len }
    }
}

/// A single mutation accepted by `batch_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Insert or overwrite the value stored under a key.
    Insert(Vec<u8>, Vec<u8>),
    /// Remove a key. Deleting an absent key is a no-op.
    Delete(Vec<u8>),
}

/// One step of a root reconstruction: the sibling hash at a join, the side
/// the sibling sits on (`0` = sibling is the left child, `1` = right), and
/// the depth of the parent join node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// The sibling subtree's hash.
    pub hash: Hash,
    /// Side of the sibling: `0` folds `H(sibling ‖ acc)`, anything else
    /// folds `H(acc ‖ sibling)`.
    pub direction: u8,
    /// Depth of the parent join node.
    pub len: u16,
}

/// An inclusion proof: the root commitment the proof was generated against
/// and the sibling chain from the leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Root commitment at proving time.
    pub root: Hash,
    /// Sibling chain, ordered from the leaf upward toward the root.
    pub nodes: Vec<ProofNode>,
}

/// Proof that a key is absent from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonExistenceProof {
    /// The tree was empty: the commitment is all zeros and there is nothing
    /// to prove membership of.
    EmptyTree {
        /// Carries `root == ZERO_HASH` and an empty sibling chain.
        proof: Proof,
    },
    /// The tree was non-empty: membership of the closest proven node is
    /// shown, and the absent key's path demonstrably branches away from it
    /// into an empty subtree.
    Neighbor {
        /// Padded path of the proven neighbor node (leaf or internal).
        proven_path: Path,
        /// Stored hash of the proven neighbor node.
        proven_hash: Hash,
        /// Membership proof for the neighbor.
        proof: Proof,
    },
}

/// Proof that a key is present but maps to a value other than the
/// claimant's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchProof {
    /// The leaf hash actually stored under the key.
    pub actual_hash: Hash,
    /// The claimant's leaf hash `H(k ‖ v_claimed)`, carried for reference.
    pub claimed_hash: Hash,
    /// Membership proof for the actual leaf.
    pub proof: Proof,
}
