//! Proof generation and verification.
//!
//! Provers read the store through a [`crate::Hubt`] handle; verifiers are
//! pure functions over a proof and the claimant's inputs and never touch a
//! store.
use thiserror::Error;

pub mod prover;
pub mod verifier;

pub use verifier::{calculate_root, verify, verify_mismatch, verify_non_existence};

/// Error type for proof generation. Verifiers never error; they return
/// `false` for anything they cannot accept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    /// Inclusion was requested for a key/value pair not in the tree.
    #[error("key is not present with the given value")]
    NotFound,
    /// Non-existence was requested for a key that is present.
    #[error("key exists in the tree")]
    KeyExists,
    /// Mismatch was requested for a key that is absent.
    #[error("key is not present in the tree")]
    KeyNotFound,
    /// Mismatch was requested but the claimed value is the stored one.
    #[error("stored value matches the claimed value")]
    ValueMatches,
    /// A storage backend read failed while building the proof.
    #[error("store read failed: {0}")]
    Store(String),
}
