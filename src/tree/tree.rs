//! This module implements [`Hubt`], the batch-updating tree engine.
//!
//! No parent→child pointers are ever stored. The store holds leaf hashes at
//! `(path, 256)` and branching-internal hashes at `(path, len)`, and the
//! engine recovers structure from sort order alone: a child subtree is
//! found with a ceiling seek ("closest or next"), and the ancestor chain of
//! a path is found by walking `floor` seeks downward with LCP-guided jumps.
//! All walks are iterative; tree depth never turns into stack depth.

use crate::{
    constant::{TREE_DEPTH, ZERO_HASH},
    hasher::{hash_key, leaf_hash, merge_hash},
    traits::OrderedStore,
    tree::path::{lcp, padded_prefix, prefix_match, set_bit},
    types::{Hash, NodeKey, Op, Path},
};
use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// An op normalized to leaf form: `path = H(k)` and, for inserts, the leaf
/// hash `H(k ‖ v)`.
struct PreparedOp {
    path: Path,
    leaf: Option<Hash>,
}

/// Handle over an [`OrderedStore`] exposing the tree operations.
///
/// The handle holds no state of its own; any number of handles (and
/// independent trees over separate stores) may coexist. Reads take `&self`
/// and may run concurrently; [`Hubt::batch_update`] takes `&mut self`, so
/// one writer runs at a time per handle.
#[derive(Debug)]
pub struct Hubt<'a, S> {
    pub(crate) store: &'a S,
}

impl<'a, S: OrderedStore> Hubt<'a, S> {
    /// Creates a tree handle over the given storage backend.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The current root commitment: the stored hash of the smallest ordered
    /// key, or `ZERO_HASH` for an empty tree.
    pub fn root(&self) -> Result<Hash, S::Error> {
        Ok(self.store.first()?.map(|(_, hash)| hash).unwrap_or(ZERO_HASH))
    }

    /// Applies a batch of insert/delete operations and restores all tree
    /// invariants.
    ///
    /// Ops are normalized to leaf form (hashed in parallel) and
    /// stable-sorted by path, so the result is deterministic regardless of
    /// the order ops were supplied in. Within one batch, deletes are
    /// applied before inserts and later inserts of the same key win; a
    /// key both deleted and inserted in the same batch therefore ends up
    /// present. Deleting an absent key is a no-op.
    pub fn batch_update(&mut self, ops: Vec<Op>) -> Result<(), S::Error> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut prepared: Vec<PreparedOp> = ops
            .into_par_iter()
            .map(|op| match op {
                Op::Insert(k, v) => PreparedOp {
                    path: hash_key(&k),
                    leaf: Some(leaf_hash(&k, &v)),
                },
                Op::Delete(k) => PreparedOp {
                    path: hash_key(&k),
                    leaf: None,
                },
            })
            .collect();
        // Stable: later inserts of the same path must stay later.
        prepared.par_sort_by(|a, b| a.path.cmp(&b.path));
        debug!(
            ops = prepared.len(),
            inserts = prepared.iter().filter(|op| op.leaf.is_some()).count(),
            "applying batch"
        );

        // Remove old leaves first so neighbor scans below see the
        // post-delete world.
        for op in prepared.iter().filter(|op| op.leaf.is_none()) {
            self.store.remove(&NodeKey::leaf(op.path))?;
        }

        // Write new leaves.
        let mut dirty: BTreeSet<NodeKey> = BTreeSet::new();
        for op in prepared.iter() {
            if let Some(leaf) = op.leaf {
                let key = NodeKey::leaf(op.path);
                self.store.insert(key, leaf)?;
                dirty.insert(key);
            }
        }

        // Create the branch points each new leaf hangs off.
        for op in prepared.iter() {
            if let Some(leaf) = op.leaf {
                self.ensure_split_points(&op.path, &leaf, &mut dirty)?;
            }
        }

        // Every ancestor of a touched path may have changed.
        for op in prepared.iter() {
            self.collect_path_nodes(&op.path, &mut dirty)?;
        }

        self.rehash_and_prune(&dirty)?;

        #[cfg(debug_assertions)]
        self.assert_consistent();
        Ok(())
    }

    /// Hash of the child subtree of `(path, len)` on side `dir`, or
    /// `ZERO_HASH` when that subtree is empty.
    ///
    /// The child may not be stored explicitly: a collapsed subtree is
    /// represented by its deepest entry, whose stored hash is the subtree
    /// root. A ceiling seek from `(child_path, len + 1)` finds that
    /// representative; anything it returns outside the child's prefix
    /// means the subtree is empty.
    pub(crate) fn child_hash(&self, path: &Path, len: u16, dir: u8) -> Result<Hash, S::Error> {
        let mut target = padded_prefix(path, len);
        set_bit(&mut target, len, dir);
        let key = NodeKey {
            path: target,
            len: len + 1,
        };
        Ok(match self.store.ceiling(&key)? {
            Some((found, hash)) if prefix_match(&found.path, &target, len + 1) => hash,
            _ => ZERO_HASH,
        })
    }

    /// Writes the branch points a freshly inserted leaf needs, derived from
    /// its strict sort-order neighbors.
    ///
    /// The LCP with either neighbor's padded path marks where the new leaf
    /// joins the existing tree; the deeper of the two is the (single) new
    /// branch, the other already exists. Hashes written here are
    /// provisional: every split point is an ancestor of the inserted path,
    /// so the dirty sweep always rehashes it — or prunes it again if it
    /// turned out not to branch. Neighbors sharing the leaf's full padded
    /// path (spine entries above the leaf) are skipped.
    fn ensure_split_points(
        &mut self,
        path: &Path,
        leaf: &Hash,
        dirty: &mut BTreeSet<NodeKey>,
    ) -> Result<(), S::Error> {
        let leaf_key = NodeKey::leaf(*path);
        let neighbors = [self.store.prev(&leaf_key)?, self.store.next(&leaf_key)?];
        for (n_key, n_hash) in neighbors.into_iter().flatten() {
            let (split_path, split_len) = lcp(path, &n_key.path);
            if split_len >= TREE_DEPTH {
                continue;
            }
            let provisional = if n_key.is_leaf() {
                merge_hash(leaf, &n_hash)
            } else {
                ZERO_HASH
            };
            let split = NodeKey {
                path: split_path,
                len: split_len,
            };
            self.store.insert(split, provisional)?;
            dirty.insert(split);
        }
        Ok(())
    }

    /// Collects every stored node lying on `target`'s path (the leaf, if
    /// present, and all its ancestors) into `acc`.
    ///
    /// Walks `floor` seeks downward from `(target, 256)`. An on-path entry
    /// is recorded and the cursor drops just below it; an off-path entry
    /// means the cursor overshot into a sibling subtree, so it jumps back
    /// to just inside the divergence point (or steps to the entry itself
    /// when the jump would not make progress). O(effective depth),
    /// amortized further by hot-path key clustering.
    pub(crate) fn collect_path_nodes(
        &self,
        target: &Path,
        acc: &mut BTreeSet<NodeKey>,
    ) -> Result<(), S::Error> {
        let mut cursor = NodeKey::leaf(*target);
        loop {
            let Some((found, _)) = self.store.floor(&cursor)? else {
                break;
            };
            let at_cursor = found == cursor;
            if prefix_match(target, &found.path, found.len) {
                acc.insert(found);
                if found.len == 0 {
                    break;
                }
                cursor = NodeKey {
                    path: found.path,
                    len: found.len - 1,
                };
            } else {
                let (jump_path, jump_len) = lcp(target, &found.path);
                let jump = NodeKey {
                    path: jump_path,
                    len: jump_len + 1,
                };
                if jump < found {
                    cursor = jump;
                } else if at_cursor {
                    if found.len == 0 {
                        break;
                    }
                    cursor = NodeKey {
                        path: found.path,
                        len: found.len - 1,
                    };
                } else {
                    cursor = found;
                }
            }
        }
        Ok(())
    }

    /// Recomputes every dirty node bottom-up, deleting the ones that no
    /// longer branch.
    ///
    /// Deepest-first order finalizes children before their parents read
    /// them; deletions are visible to later (shallower) child seeks
    /// immediately, which is what lets chains of single-child interiors
    /// collapse in one pass.
    fn rehash_and_prune(&mut self, dirty: &BTreeSet<NodeKey>) -> Result<(), S::Error> {
        let mut nodes: Vec<&NodeKey> = dirty.iter().collect();
        nodes.sort_unstable_by(|a, b| b.len.cmp(&a.len));
        trace!(dirty = nodes.len(), "rehashing dirty nodes");

        for node in nodes {
            if node.is_leaf() {
                continue;
            }
            let left = self.child_hash(&node.path, node.len, 0)?;
            let right = self.child_hash(&node.path, node.len, 1)?;
            if left != ZERO_HASH && right != ZERO_HASH {
                self.store.insert(*node, merge_hash(&left, &right))?;
            } else {
                self.store.remove(node)?;
            }
        }
        Ok(())
    }

    /// Full-store structural sweep: every stored path is zero-padded beyond
    /// its depth, and every internal node branches and carries the hash of
    /// its two child subtrees.
    ///
    /// O(n log n) over the whole store — wired into the end of every batch
    /// in debug builds only.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn assert_consistent(&self) {
        let mut entry = self.store.first().expect("store read failed");
        while let Some((key, hash)) = entry {
            assert!(key.len <= TREE_DEPTH, "node depth out of range: {}", key.len);
            assert_eq!(
                padded_prefix(&key.path, key.len),
                key.path,
                "stored path not zero-padded beyond depth {}",
                key.len
            );
            if !key.is_leaf() {
                let left = self
                    .child_hash(&key.path, key.len, 0)
                    .expect("store read failed");
                let right = self
                    .child_hash(&key.path, key.len, 1)
                    .expect("store read failed");
                assert_ne!(
                    left, ZERO_HASH,
                    "internal node at depth {} has no left subtree",
                    key.len
                );
                assert_ne!(
                    right, ZERO_HASH,
                    "internal node at depth {} has no right subtree",
                    key.len
                );
                assert_eq!(
                    hash,
                    merge_hash(&left, &right),
                    "internal hash out of sync at depth {}",
                    key.len
                );
            }
            entry = self.store.next(&key).expect("store read failed");
        }
    }
}
