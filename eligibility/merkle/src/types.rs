use serde::{Deserialize, Serialize};

/// A 32-byte SHA-256 digest: leaves, interior nodes, roots and proof siblings.
pub type Hash = [u8; 32];

/// The all-zero hash. Never a valid root.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Errors produced while building trees or decoding hashes.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a merkle tree with no leaves")]
    EmptyTree,

    #[error("leaf index {index} out of bounds for {leaf_count} leaves")]
    IndexOutOfBounds { index: usize, leaf_count: usize },

    #[error("leaf not present in tree")]
    LeafNotFound,

    #[error("invalid hex hash: {0}")]
    InvalidHex(String),

    #[error("expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Parse a hash from hex, with or without a `0x` prefix.
pub fn parse_hash(s: &str) -> Result<Hash, MerkleError> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| MerkleError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(MerkleError::InvalidLength(bytes.len()));
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// Render a hash as `0x`-prefixed lowercase hex.
pub fn format_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// A self-contained membership proof, as handed to a claimant off-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// Root the proof was generated against.
    #[serde(with = "hex_hash")]
    pub root: Hash,
    /// Leaf hash of the claimant.
    #[serde(with = "hex_hash")]
    pub leaf: Hash,
    /// Sibling hashes from the leaf level upward.
    #[serde(with = "hex_hash_vec")]
    pub proof: Vec<Hash>,
}

/// Serialize a single `[u8; 32]` as a `0x`-prefixed hex string.
pub mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_hash, parse_hash, Hash};

    pub fn serialize<S>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_hash(hash))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Hash, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize a list of hashes as hex strings.
pub mod hex_hash_vec {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_hash, parse_hash, Hash};

    pub fn serialize<S>(hashes: &[Hash], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(hashes.len()))?;
        for hash in hashes {
            seq.serialize_element(&format_hash(hash))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Hash>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_hash(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
