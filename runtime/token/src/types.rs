use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Token amount in the token's smallest unit.
pub type Amount = u128;

/// A 32-byte account or contract address, rendered as `0x`-prefixed hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never a valid owner.
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| TokenError::InvalidAddress(format!("{s}: {e}")))?;
        if bytes.len() != 32 {
            return Err(TokenError::InvalidAddress(format!(
                "{s}: expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

// Hex strings keep addresses usable as JSON map keys.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Static description of a fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Errors raised by token ledgers and token hosts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("unknown token: {0}")]
    UnknownToken(Address),

    #[error("token already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("arithmetic overflow")]
    Overflow,
}

/// Parse a decimal token amount ("1.5") into smallest units.
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, TokenError> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(TokenError::InvalidAmount(value.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(TokenError::InvalidAmount(value.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(TokenError::InvalidAmount(format!(
            "{value}: more than {decimals} fractional digits"
        )));
    }

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or(TokenError::Overflow)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .map_err(|_| TokenError::Overflow)?
            .checked_mul(scale)
            .ok_or(TokenError::Overflow)?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse::<u128>().map_err(|_| TokenError::Overflow)?
    };

    whole_units
        .checked_add(frac_units)
        .ok_or(TokenError::Overflow)
}

/// Render smallest units as a decimal string, trimming trailing zeros.
/// Falls back to raw units when the scale does not fit in a `u128`.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let scale = match 10u128.checked_pow(u32::from(decimals)) {
        Some(scale) if decimals > 0 => scale,
        _ => return amount.to_string(),
    };
    let whole = amount / scale;
    let frac = amount % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
