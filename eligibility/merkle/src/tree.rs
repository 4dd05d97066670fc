use crate::hash::{hash_leaf, hash_pair, verify};
use crate::types::{Hash, MerkleError, ProofBundle};

/// Sorted-pair Merkle tree over an allowlist of accounts.
///
/// Leaves are sorted before the tree is built and every interior node hashes
/// its children in lexicographic order. A trailing node without a sibling is
/// promoted to the next level unchanged.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `layers[0]` holds the sorted leaves, the last layer holds the root.
    layers: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from precomputed leaf hashes.
    pub fn new(mut leaves: Vec<Hash>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        leaves.sort_unstable();

        let mut layers = vec![leaves];
        while layers[layers.len() - 1].len() > 1 {
            let prev = &layers[layers.len() - 1];
            let next: Vec<Hash> = prev
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two elements"),
                })
                .collect();
            layers.push(next);
        }

        tracing::debug!(
            leaves = layers[0].len(),
            depth = layers.len() - 1,
            "built merkle tree"
        );
        Ok(Self { layers })
    }

    /// Build a tree whose leaves are `hash_leaf(account)` for every account.
    pub fn from_accounts<'a, I>(accounts: I) -> Result<Self, MerkleError>
    where
        I: IntoIterator<Item = &'a [u8; 32]>,
    {
        Self::new(accounts.into_iter().map(hash_leaf).collect())
    }

    /// The committed root.
    pub fn root(&self) -> Hash {
        self.layers[self.layers.len() - 1][0]
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Sorted leaf hashes.
    pub fn leaves(&self) -> &[Hash] {
        &self.layers[0]
    }

    /// Position of a leaf in the sorted leaf layer.
    pub fn position(&self, leaf: &Hash) -> Option<usize> {
        self.layers[0].binary_search(leaf).ok()
    }

    /// Sibling path for the leaf at `index` in the sorted leaf layer.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>, MerkleError> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(MerkleError::IndexOutOfBounds { index, leaf_count });
        }

        let mut proof = Vec::with_capacity(self.layers.len() - 1);
        let mut idx = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = idx ^ 1;
            // A promoted trailing node has no sibling at this level.
            if sibling < layer.len() {
                proof.push(layer[sibling]);
            }
            idx /= 2;
        }
        Ok(proof)
    }

    /// Sibling path for a leaf hash.
    pub fn proof_for_leaf(&self, leaf: &Hash) -> Result<Vec<Hash>, MerkleError> {
        let index = self.position(leaf).ok_or(MerkleError::LeafNotFound)?;
        self.proof(index)
    }

    /// Full proof bundle for an account.
    pub fn bundle_for_account(&self, account: &[u8; 32]) -> Result<ProofBundle, MerkleError> {
        let leaf = hash_leaf(account);
        let proof = self.proof_for_leaf(&leaf)?;
        Ok(ProofBundle {
            root: self.root(),
            leaf,
            proof,
        })
    }

    /// Verify a proof against this tree's root.
    pub fn verify(&self, proof: &[Hash], leaf: Hash) -> bool {
        verify(proof, &self.root(), leaf)
    }
}
