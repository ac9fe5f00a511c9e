//! Randomized end-to-end testing for the tree engine.
//!
//! Drives a tree over [`MemStore`] with batches of operations drawn from a
//! fixed key pool and validates it against a reference `BTreeMap` oracle:
//!
//! - **State consistency**: after every batch the full structural sweep
//!   passes and every oracle entry proves and verifies, while absent keys
//!   yield verifying non-existence proofs.
//! - **Root consistency**: the root is zero exactly when the oracle is
//!   empty, and rebuilding the final contents from scratch in a single
//!   batch reproduces the incrementally computed root.

use crate::{
    constant::ZERO_HASH,
    proof::{verify, verify_mismatch, verify_non_existence, ProofError},
    Hubt, MemStore, Op,
};
use std::collections::BTreeMap;

/// A state mutation for the fuzz harness.
///
/// Operations reference keys via indices into a pre-generated pool (taken
/// modulo the pool size), so the generator can focus on operation mixes
/// rather than key material.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert or overwrite the key at pool index with a single-byte value.
    Insert(u16, u8),
    /// Remove the key at pool index.
    Delete(u16),
}

/// Checks every prover/verifier behavior the engine promises for a key
/// that is not in the tree.
fn check_absent_key(tree: &Hubt<'_, MemStore>, key: &[u8]) {
    assert_eq!(
        tree.prove(key, b"any value"),
        Err(ProofError::NotFound),
        "absent key {key:?} must not prove inclusion"
    );
    assert_eq!(
        tree.prove_mismatch(key, b"any value"),
        Err(ProofError::KeyNotFound),
        "absent key {key:?} must not prove mismatch"
    );
    let proof = tree
        .prove_non_existence(key)
        .expect("absent key must prove non-existence");
    assert!(
        verify_non_existence(key, &proof),
        "non-existence proof for {key:?} must verify"
    );
}

/// Main oracle-driven harness.
pub fn oracle_fuzz_test(batches: &[Vec<Operation>]) {
    const KV_POOL_SIZE: usize = 512;
    let kv_pool: Vec<Vec<u8>> = (0..KV_POOL_SIZE)
        .map(|i| format!("key_{i:05x}").into_bytes())
        .collect();

    let store = MemStore::new();
    let mut tree = Hubt::new(&store);
    let mut oracle: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();

    for batch in batches {
        let ops: Vec<Op> = batch
            .iter()
            .map(|op| match op {
                Operation::Insert(idx, value) => Op::Insert(
                    kv_pool[*idx as usize % kv_pool.len()].clone(),
                    vec![*value],
                ),
                Operation::Delete(idx) => {
                    Op::Delete(kv_pool[*idx as usize % kv_pool.len()].clone())
                }
            })
            .collect();

        // Mirror the batch semantics in the oracle: deletes apply first,
        // then inserts with the batch's last write of a key winning.
        for op in &ops {
            if let Op::Delete(key) = op {
                oracle.remove(key);
            }
        }
        for op in &ops {
            if let Op::Insert(key, value) = op {
                oracle.insert(key.clone(), value.clone());
            }
        }

        tree.batch_update(ops).expect("batch update failed");
        tree.assert_consistent();
        assert_eq!(
            tree.root().unwrap() == ZERO_HASH,
            oracle.is_empty(),
            "root is zero iff the tree is empty"
        );

        // Present keys: inclusion proves and verifies, the wrong value is
        // rejected, and the other proof kinds refuse with their taxonomy
        // errors.
        for (key, value) in oracle.iter().take(24) {
            let proof = tree.prove(key, value).expect("present key must prove");
            assert!(verify(key, value, &proof));
            assert!(!verify(key, b"not the stored value", &proof));
            assert_eq!(tree.prove_non_existence(key), Err(ProofError::KeyExists));
            assert_eq!(
                tree.prove_mismatch(key, value),
                Err(ProofError::ValueMatches)
            );
            let mismatch = tree
                .prove_mismatch(key, b"bogus claim")
                .expect("wrong claim must prove mismatch");
            assert!(verify_mismatch(key, b"bogus claim", &mismatch));
        }

        // Absent keys, both from the pool and outside it.
        for key in kv_pool
            .iter()
            .filter(|key| !oracle.contains_key(*key))
            .take(16)
        {
            check_absent_key(&tree, key);
        }
        for i in 0..4 {
            check_absent_key(&tree, format!("never_inserted_{i}").as_bytes());
        }
    }

    // Rebuilding the final contents in one batch must reproduce the
    // incrementally maintained root.
    let rebuild_store = MemStore::new();
    let mut rebuilt = Hubt::new(&rebuild_store);
    rebuilt
        .batch_update(
            oracle
                .iter()
                .map(|(k, v)| Op::Insert(k.clone(), v.clone()))
                .collect(),
        )
        .expect("rebuild failed");
    assert_eq!(
        rebuilt.root().unwrap(),
        tree.root().unwrap(),
        "rebuilt root mismatch"
    );

    // No phantom entries: the store holds exactly one leaf per oracle key.
    let leaves = store
        .entries()
        .into_iter()
        .filter(|(key, _)| key.is_leaf())
        .count();
    assert_eq!(leaves, oracle.len(), "leaf count mismatch");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::hash_key;
    use crate::types::{MismatchProof, NonExistenceProof, Proof};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_empty_batches() {
        oracle_fuzz_test(&[]);
    }

    #[test]
    fn test_single_insert() {
        oracle_fuzz_test(&[vec![Operation::Insert(0, 42)]]);
    }

    #[test]
    fn test_insert_delete() {
        oracle_fuzz_test(&[
            vec![Operation::Insert(0, 42)],
            vec![Operation::Delete(0)],
        ]);
    }

    #[test]
    fn test_insert_delete_same_batch() {
        oracle_fuzz_test(&[vec![
            Operation::Insert(0, 1),
            Operation::Delete(0),
            Operation::Insert(1, 2),
            Operation::Insert(1, 3),
        ]]);
    }

    #[test]
    fn test_random_batches() {
        for seed in [1u64, 42, 0xe1f5] {
            let mut rng = StdRng::seed_from_u64(seed);
            let batches: Vec<Vec<Operation>> = (0..6)
                .map(|_| {
                    (0..48)
                        .map(|_| {
                            if rng.gen_bool(0.7) {
                                Operation::Insert(rng.gen(), rng.gen())
                            } else {
                                Operation::Delete(rng.gen())
                            }
                        })
                        .collect()
                })
                .collect();
            oracle_fuzz_test(&batches);
        }
    }

    /// One batch and the same ops as singleton batches in path-sort order
    /// produce the same root, provided the ops touch distinct keys.
    #[test]
    fn test_batch_matches_singletons_in_sort_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let seed_ops: Vec<Op> = (0..32u32)
            .map(|i| Op::Insert(format!("seed-{i}").into_bytes(), vec![rng.gen()]))
            .collect();

        // Distinct keys: inserts over fresh keys, deletes over seeded and
        // absent ones.
        let mut ops: Vec<Op> = (0..24u32)
            .map(|i| Op::Insert(format!("new-{i}").into_bytes(), vec![rng.gen()]))
            .collect();
        ops.extend((0..16u32).map(|i| Op::Delete(format!("seed-{i}").into_bytes())));
        ops.extend((0..4u32).map(|i| Op::Delete(format!("ghost-{i}").into_bytes())));

        let batch_store = MemStore::new();
        let mut batched = Hubt::new(&batch_store);
        batched.batch_update(seed_ops.clone()).unwrap();
        batched.batch_update(ops.clone()).unwrap();

        let single_store = MemStore::new();
        let mut singletons = Hubt::new(&single_store);
        singletons.batch_update(seed_ops).unwrap();
        let mut sorted = ops;
        sorted.sort_by_key(|op| match op {
            Op::Insert(k, _) | Op::Delete(k) => hash_key(k),
        });
        for op in sorted {
            singletons.batch_update(vec![op]).unwrap();
        }

        assert_eq!(batched.root().unwrap(), singletons.root().unwrap());
    }

    /// The same final set of key-values produces the same root regardless
    /// of insertion order or batch partitioning.
    #[test]
    fn test_root_independent_of_insertion_order() {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = (0..48u32)
            .map(|i| (format!("entry-{i}").into_bytes(), format!("value-{i}").into_bytes()))
            .collect();

        let mut roots = Vec::new();

        // One big batch, forward.
        let store = MemStore::new();
        let mut tree = Hubt::new(&store);
        tree.batch_update(
            entries
                .iter()
                .map(|(k, v)| Op::Insert(k.clone(), v.clone()))
                .collect(),
        )
        .unwrap();
        roots.push(tree.root().unwrap());

        // Singleton batches, reversed.
        let store = MemStore::new();
        let mut tree = Hubt::new(&store);
        for (k, v) in entries.iter().rev() {
            tree.batch_update(vec![Op::Insert(k.clone(), v.clone())])
                .unwrap();
        }
        roots.push(tree.root().unwrap());

        // Two interleaved batches.
        let store = MemStore::new();
        let mut tree = Hubt::new(&store);
        let (evens, odds): (Vec<_>, Vec<_>) = entries
            .iter()
            .enumerate()
            .partition(|(i, _)| i % 2 == 0);
        for half in [odds, evens] {
            tree.batch_update(
                half.into_iter()
                    .map(|(_, (k, v))| Op::Insert(k.clone(), v.clone()))
                    .collect(),
            )
            .unwrap();
        }
        roots.push(tree.root().unwrap());

        assert!(roots.windows(2).all(|pair| pair[0] == pair[1]), "{roots:?}");
    }

    /// A proof generated for one pair never verifies another random pair.
    #[test]
    fn test_forgery_resistance() {
        let store = MemStore::new();
        let mut tree = Hubt::new(&store);
        let mut rng = StdRng::seed_from_u64(99);
        let entries: Vec<(Vec<u8>, Vec<u8>)> = (0..64)
            .map(|_| {
                (
                    rng.gen::<[u8; 32]>().to_vec(),
                    rng.gen::<[u8; 32]>().to_vec(),
                )
            })
            .collect();
        tree.batch_update(
            entries
                .iter()
                .map(|(k, v)| Op::Insert(k.clone(), v.clone()))
                .collect(),
        )
        .unwrap();

        for window in entries.windows(2) {
            let (k0, v0) = &window[0];
            let (k1, v1) = &window[1];
            let proof = tree.prove(k0, v0).unwrap();
            assert!(!verify(k1, v1, &proof));
            assert!(!verify(k1, v0, &proof));
            let other: Vec<u8> = rng.gen::<[u8; 32]>().to_vec();
            assert!(!verify(&other, v0, &proof));
        }
    }

    /// Proofs survive a serialization round trip, the way they would cross
    /// a wire.
    #[test]
    fn test_proof_wire_round_trip() {
        let store = MemStore::new();
        let mut tree = Hubt::new(&store);
        tree.batch_update(vec![
            Op::Insert(b"k1".to_vec(), b"v1".to_vec()),
            Op::Insert(b"k2".to_vec(), b"v2".to_vec()),
            Op::Insert(b"k3".to_vec(), b"v3".to_vec()),
        ])
        .unwrap();

        let inclusion = tree.prove(b"k1", b"v1").unwrap();
        let encoded =
            bincode::serde::encode_to_vec(&inclusion, bincode::config::legacy()).unwrap();
        let (decoded, _): (Proof, _) =
            bincode::serde::decode_from_slice(&encoded, bincode::config::legacy()).unwrap();
        assert!(verify(b"k1", b"v1", &decoded));

        let absence = tree.prove_non_existence(b"missing").unwrap();
        let encoded = bincode::serde::encode_to_vec(&absence, bincode::config::legacy()).unwrap();
        let (decoded, _): (NonExistenceProof, _) =
            bincode::serde::decode_from_slice(&encoded, bincode::config::legacy()).unwrap();
        assert!(verify_non_existence(b"missing", &decoded));

        let mismatch = tree.prove_mismatch(b"k2", b"claimed").unwrap();
        let encoded = bincode::serde::encode_to_vec(&mismatch, bincode::config::legacy()).unwrap();
        let (decoded, _): (MismatchProof, _) =
            bincode::serde::decode_from_slice(&encoded, bincode::config::legacy()).unwrap();
        assert!(verify_mismatch(b"k2", b"claimed", &decoded));
    }
}
