use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{StorageError, StorageKey, StorageResult, StorageValue};

/// File-backed key-value store holding distributor snapshots.
///
/// Each key is SHA-256 hashed and hex-encoded to produce a safe filename,
/// sharded by the first two hex characters. Writes go to a temporary file
/// that is renamed over the target, so a crash mid-write leaves the previous
/// value intact.
pub struct StateStore {
    base_dir: PathBuf,
}

impl StateStore {
    /// Open (or create) a store at the given directory.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let base_dir = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Retrieve a raw value by key.
    pub fn get(&self, key: &StorageKey) -> io::Result<Option<StorageValue>> {
        match fs::read(self.key_path(key)) {
            Ok(data) => Ok(Some(StorageValue(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write a raw value, replacing any previous value atomically.
    pub fn put(&self, key: &StorageKey, value: &StorageValue) -> io::Result<()> {
        let path = self.key_path(key);
        if let Some(shard_dir) = path.parent() {
            fs::create_dir_all(shard_dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &value.0)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(%key, bytes = value.len(), "stored value");
        Ok(())
    }

    /// Remove a key, returning the old value if it existed.
    pub fn remove(&self, key: &StorageKey) -> io::Result<Option<StorageValue>> {
        let path = self.key_path(key);
        match fs::read(&path) {
            Ok(data) => {
                fs::remove_file(&path)?;
                Ok(Some(StorageValue(data)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a key exists without reading the value.
    pub fn contains(&self, key: &StorageKey) -> bool {
        self.key_path(key).exists()
    }

    /// Serialize `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| {
            StorageError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;
        self.put(&StorageKey::from(key), &StorageValue(json))?;
        Ok(())
    }

    /// Load and deserialize the JSON value under `key`, if present.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.get(&StorageKey::from(key))? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(raw.as_bytes()).map_err(|source| {
            StorageError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;
        Ok(Some(value))
    }

    /// Compute the filesystem path for a given key.
    fn key_path(&self, key: &StorageKey) -> PathBuf {
        let hash = Self::hash_key(key);
        let (shard, rest) = hash.split_at(2);
        self.base_dir.join(shard).join(rest)
    }

    /// SHA-256 hash a key and return its hex encoding.
    fn hash_key(key: &StorageKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }
}
