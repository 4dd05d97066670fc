use std::path::Path;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use got_token::Address;

use crate::error::CliError;

/// On-disk keypair. The address is the Ed25519 verifying key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub address: Address,
    /// Hex-encoded 32-byte secret key.
    pub secret_key: String,
}

pub fn generate() -> KeyFile {
    let signing_key = SigningKey::generate(&mut OsRng);
    KeyFile {
        address: address_of(&signing_key),
        secret_key: hex::encode(signing_key.to_bytes()),
    }
}

pub fn address_of(key: &SigningKey) -> Address {
    Address(key.verifying_key().to_bytes())
}

pub fn write(path: &Path, key: &KeyFile) -> Result<(), CliError> {
    std::fs::write(path, serde_json::to_string_pretty(key)?)?;
    Ok(())
}

/// Load a key file and return the address its secret key controls.
pub fn load(path: &Path) -> Result<Address, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let file: KeyFile = serde_json::from_str(&contents)?;
    let signing_key = decode_secret(&file.secret_key)?;
    let address = address_of(&signing_key);
    if address != file.address {
        return Err(CliError::KeyMismatch {
            stored: file.address,
            derived: address,
        });
    }
    Ok(address)
}

fn decode_secret(secret_hex: &str) -> Result<SigningKey, CliError> {
    let bytes = hex::decode(secret_hex.trim())
        .map_err(|e| CliError::InvalidInput(format!("secret key hex: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        CliError::InvalidInput(format!("secret key must be 32 bytes, got {}", b.len()))
    })?;
    Ok(SigningKey::from_bytes(&bytes))
}
