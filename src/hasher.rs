//! SHA-256 helpers used throughout the engine.
//!
//! All commitments in the tree are built from two primitives: the path of a
//! key is `SHA-256(key)`, and every stored hash is either a leaf hash
//! `SHA-256(key ‖ value)` or an internal hash `SHA-256(left ‖ right)`.

use crate::types::{Hash, Path};
use sha2::{Digest, Sha256};

/// Maps a raw key to its 256-bit tree path.
#[inline]
pub fn hash_key(key: &[u8]) -> Path {
    Sha256::digest(key).into()
}

/// Leaf commitment `SHA-256(key ‖ value)`.
#[inline]
pub fn leaf_hash(key: &[u8], value: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize().into()
}

/// Internal-node commitment `SHA-256(left ‖ right)`.
#[inline]
pub fn merge_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
