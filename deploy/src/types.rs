use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use got_distributor::{BlockClock, DistributorError, ManualClock, WallClock};
use got_storage::StorageError;
use got_token::{Address, TokenError};

/// The reward token to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// Decimal amount in whole tokens, minted to the owner.
    pub initial_supply: String,
}

fn default_decimals() -> u8 {
    18
}

/// One stake registry seed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEntrySpec {
    pub address: Address,
    /// Decimal amount in whole tokens.
    pub amount: String,
}

/// Initial eligibility commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilitySpec {
    /// A precomputed Merkle root (hex).
    MerkleRoot { root: String },
    /// Addresses to build the Merkle allowlist from.
    Allowlist { members: Vec<Address> },
    /// Stake registry seeded with the given entries.
    Stake {
        #[serde(default)]
        entries: Vec<StakeEntrySpec>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySpec {
    #[default]
    Flat,
    StakeWeighted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorSpec {
    /// Distributor address. Derived from the owner and token when absent.
    #[serde(default)]
    pub address: Option<Address>,
    /// Decimal amount in whole tokens paid per period.
    pub rate: String,
    #[serde(default)]
    pub claim_cooldown: Option<u64>,
    #[serde(default)]
    pub policy: PolicySpec,
    pub eligibility: EligibilitySpec,
}

/// Where block heights come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSpec {
    /// Simulated chain advanced explicitly.
    Manual { height: u64 },
    /// Height derived from wall time since `genesis_time`.
    Wall {
        genesis_time: DateTime<Utc>,
        block_time_ms: u64,
    },
}

impl Default for ClockSpec {
    fn default() -> Self {
        ClockSpec::Manual { height: 0 }
    }
}

impl ClockSpec {
    pub fn build(&self) -> Box<dyn BlockClock> {
        match self {
            ClockSpec::Manual { height } => Box::new(ManualClock::new(*height)),
            ClockSpec::Wall {
                genesis_time,
                block_time_ms,
            } => Box::new(WallClock::new(*genesis_time, *block_time_ms)),
        }
    }
}

/// Deployment error.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid deploy config: {0}")]
    InvalidConfig(String),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("no deployment found in {0}")]
    NotDeployed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("distributor error: {0}")]
    Distributor(#[from] DistributorError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
