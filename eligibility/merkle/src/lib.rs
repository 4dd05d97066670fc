pub mod hash;
pub mod tree;
pub mod types;

pub use hash::{compute_root, hash_leaf, hash_pair, verify};
pub use tree::MerkleTree;
pub use types::*;
