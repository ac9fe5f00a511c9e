//! Constants that determine the shape of the tree and its store encoding.
use crate::types::Hash;

/// Number of bits in a path, and therefore the depth of a leaf. Paths are
/// SHA-256 digests of the raw key, so the tree is at most 256 levels deep.
pub const TREE_DEPTH: u16 = 256;

/// Sentinel hash for "absent" / "empty subtree". Also the root commitment
/// of an empty tree.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Discriminator byte prefixed to every encoded node key. Keeps tree nodes
/// in their own keyspace when the backing store is shared with other data.
pub const NODE_TAG: u8 = 0x01;

/// Byte length of an encoded node key: `tag (1) ‖ path (32) ‖ len (2)`.
pub const ENCODED_NODE_KEY_LEN: usize = 35;
