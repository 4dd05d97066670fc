use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque storage key. Keys are usually short names such as `"distributor"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(pub Vec<u8>);

impl StorageKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for StorageKey {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic()) => write!(f, "{s}"),
            _ => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

/// Opaque storage value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageValue(pub Vec<u8>);

impl StorageValue {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for StorageValue {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for StorageValue {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

/// Errors produced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error for key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_prefers_text() {
        assert_eq!(StorageKey::from("distributor").to_string(), "distributor");
    }

    #[test]
    fn key_display_falls_back_to_hex() {
        let key = StorageKey::new(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(key.to_string(), "0xdeadbeef");
    }

    #[test]
    fn value_len() {
        let val = StorageValue::new(vec![1, 2, 3]);
        assert_eq!(val.len(), 3);
        assert!(!val.is_empty());
    }
}
