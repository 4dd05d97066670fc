use sha2::{Digest, Sha256};

use crate::types::Hash;

/// Leaf hash for an account: SHA-256 over the raw 32 account bytes.
pub fn hash_leaf(account: &[u8; 32]) -> Hash {
    let digest = Sha256::digest(account);
    let mut leaf = [0u8; 32];
    leaf.copy_from_slice(&digest);
    leaf
}

/// Interior node hash. The pair is ordered lexicographically before hashing,
/// so `hash_pair(a, b) == hash_pair(b, a)`.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(lo);
    hasher.update(hi);
    let digest = hasher.finalize();
    let mut node = [0u8; 32];
    node.copy_from_slice(&digest);
    node
}

/// Fold a proof onto a leaf and return the implied root.
pub fn compute_root(leaf: Hash, proof: &[Hash]) -> Hash {
    proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair(&node, sibling))
}

/// Check a sorted-pair proof against a committed root.
pub fn verify(proof: &[Hash], root: &Hash, leaf: Hash) -> bool {
    compute_root(leaf, proof) == *root
}
