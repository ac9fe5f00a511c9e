//! In-memory storage backend.
//!
//! [`MemStore`] is a reference implementation of [`OrderedStore`] over a
//! [`BTreeMap`] keyed by the canonical 35-byte node-key encoding, so the
//! map's own ordering is exactly the byte-lexicographic order the engine
//! relies on.
//!
//! # Note
//!
//! `MemStore` is a storage backend, not the tree itself. It is intended
//! for unit and integration testing, development, and as the reference
//! implementation of the storage trait; production deployments back
//! [`OrderedStore`] with an ordered KV engine instead.
//!
//! # Thread safety
//!
//! All access goes through an [`RwLock`], allowing concurrent readers or a
//! single writer.

use crate::traits::OrderedStore;
use crate::types::{EncodedNodeKey, Hash, NodeKey};
use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
    sync::RwLock,
};

/// In-memory [`OrderedStore`] over an `RwLock<BTreeMap>`.
#[derive(Debug, Default)]
pub struct MemStore {
    nodes: RwLock<BTreeMap<EncodedNodeKey, Hash>>,
}

impl Clone for MemStore {
    fn clone(&self) -> Self {
        Self {
            nodes: RwLock::new(self.nodes.read().expect("node lock poisoned").clone()),
        }
    }
}

impl MemStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes (leaves plus branching internals).
    pub fn len(&self) -> usize {
        self.nodes.read().expect("node lock poisoned").len()
    }

    /// All entries in key order. Intended for inspection in tests.
    pub fn entries(&self) -> Vec<(NodeKey, Hash)> {
        self.nodes
            .read()
            .expect("node lock poisoned")
            .iter()
            .map(|(k, v)| (k.decode(), *v))
            .collect()
    }
}

impl OrderedStore for MemStore {
    /// Static strings keep the reference backend simple; real backends
    /// surface their own error type here.
    type Error = &'static str;

    fn first(&self) -> Result<Option<(NodeKey, Hash)>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes.iter().next().map(|(k, v)| (k.decode(), *v)))
    }

    fn lookup(&self, key: &NodeKey) -> Result<Option<Hash>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes.get(&key.encode()).copied())
    }

    fn floor(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes
            .range(..=key.encode())
            .next_back()
            .map(|(k, v)| (k.decode(), *v)))
    }

    fn ceiling(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes
            .range(key.encode()..)
            .next()
            .map(|(k, v)| (k.decode(), *v)))
    }

    fn prev(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes
            .range(..key.encode())
            .next_back()
            .map(|(k, v)| (k.decode(), *v)))
    }

    fn next(&self, key: &NodeKey) -> Result<Option<(NodeKey, Hash)>, Self::Error> {
        let nodes = self.nodes.read().expect("node lock poisoned");
        Ok(nodes
            .range((Excluded(key.encode()), Unbounded))
            .next()
            .map(|(k, v)| (k.decode(), *v)))
    }

    fn insert(&self, key: NodeKey, hash: Hash) -> Result<(), Self::Error> {
        let mut nodes = self.nodes.write().expect("node lock poisoned");
        nodes.insert(key.encode(), hash);
        Ok(())
    }

    fn remove(&self, key: &NodeKey) -> Result<(), Self::Error> {
        let mut nodes = self.nodes.write().expect("node lock poisoned");
        nodes.remove(&key.encode());
        Ok(())
    }
}
