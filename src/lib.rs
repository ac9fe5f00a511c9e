#![doc = include_str!("../README.md")]

pub mod constant;
pub mod hasher;
pub mod mem_store;
pub use mem_store::MemStore;
pub mod proof;
pub use proof::{calculate_root, verify, verify_mismatch, verify_non_existence, ProofError};
pub mod traits;
pub use traits::OrderedStore;
pub mod tree;
pub use tree::Hubt;
pub mod types;
pub use types::*;

#[cfg(test)]
pub(crate) mod fuzz;
#[cfg(test)]
pub(crate) mod test_util;
