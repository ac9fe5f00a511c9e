//! The storage abstraction the tree engine runs over.
use crate::types::{Hash, NodeKey};
use std::fmt::Debug;

/// An ordered key/value container holding the tree's node hashes.
///
/// This is the only persistent state of the engine; everything else is
/// stateless computation over it. Implementations must order entries by
/// [`NodeKey`]'s `Ord` — equivalently, byte-lexicographically by
/// [`NodeKey::encode`] — because topology is recovered purely from that
/// sort order: a plain hash map cannot back this tree.
///
/// Reads must be safe to run concurrently (`Send + Sync`). Mutations take
/// `&self` so a store handle can be shared; the engine itself serializes
/// writers at the batch level.
pub trait OrderedStore: Debug + Send + Sync {
    /// Backend-specific error type.
    type Error: Debug + Send;

    /// The entry with the smallest key, if any. Its hash is the root
    /// commitment.
    fn first(&self) -> Result<Option<(NodeKey, Hash)>, Self::Error>;

    /// Point lookup of a single node hash.
    fn lookup(&self, key: &NodeKey) -> Result<Option<Hash>, Self::Error>;

    /// The entry with the greatest key `<= key`.
    fn floor(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error>;

    /// The entry with the smallest key `>= key`.
    fn ceiling(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error>;

    /// The entry with the greatest key strictly `< key`.
    fn prev(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error>;

    /// The entry with the smallest key strictly `> key`.
    fn next(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error>;

    /// Inserts or overwrites a node hash.
    fn insert(&self, key: NodeKey, hash: Hash) -> Result<(), Self::Error>;

    /// Removes a node. Removing an absent key is a no-op.
    fn remove(&self, key: &NodeKey) -> Result<(), Self::Error>;

    /// Whether the store holds no entries at all.
    fn is_empty(&self) -> Result<bool, Self::Error> {
        Ok(self.first()?.is_none())
    }
}
