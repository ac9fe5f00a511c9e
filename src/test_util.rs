//! Helpers shared by unit tests across the crate.

use crate::hasher::hash_key;
use crate::tree::path::get_bit;

/// Finds a human-readable key whose hashed path starts with the given
/// bits. Brute-force search over a counter; the probe space is effectively
/// unbounded for the short prefixes tests ask for.
pub(crate) fn key_with_path_bits(bits: &[u8]) -> Vec<u8> {
    (0u32..)
        .map(|i| format!("probe-{i}").into_bytes())
        .find(|k| {
            let path = hash_key(k);
            bits.iter()
                .enumerate()
                .all(|(i, &b)| get_bit(&path, i as u16) == b)
        })
        .expect("searchable key space")
}
