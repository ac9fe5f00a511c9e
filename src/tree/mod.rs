//! The tree engine: path utilities and the batch-updating core.
pub(crate) mod path;
#[allow(clippy::module_inception)]
pub mod tree;

pub use tree::Hubt;
