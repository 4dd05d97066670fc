use std::collections::HashSet;
use std::path::Path;

use got_distributor::{AccrualPolicy, EligibilitySet};
use got_merkle::{parse_hash, Hash, MerkleTree, ZERO_HASH};
use got_token::{parse_units, Address, Amount, TokenMetadata};

use crate::types::*;

/// Largest decimals value whose scale still fits in a `u128`.
const MAX_DECIMALS: u8 = 38;

/// Everything needed to stand up a funded reward distributor.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeployConfig {
    /// Deployer and distributor owner; receives the initial token supply.
    pub owner: Address,
    pub token: TokenSpec,
    pub distributor: DistributorSpec,
    /// Decimal amount in whole tokens moved from the owner to the distributor.
    pub fund: String,
    #[serde(default)]
    pub clock: ClockSpec,
}

impl DeployConfig {
    /// Load a deploy config, picking the format from the file extension
    /// (`.toml` or `.json`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = match extension(path).as_str() {
            "toml" => Self::from_toml_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            other => return Err(DeployError::UnsupportedFormat(other.to_string())),
        };
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, DeployError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, DeployError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Save the config in the format matching the file extension.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DeployError> {
        let path = path.as_ref();
        let contents = match extension(path).as_str() {
            "toml" => toml::to_string_pretty(self)?,
            "json" => serde_json::to_string_pretty(self)?,
            other => return Err(DeployError::UnsupportedFormat(other.to_string())),
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate every field that deployment would otherwise reject halfway.
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.owner.is_zero() {
            return Err(invalid("owner must not be the zero address"));
        }
        if self.token.name.trim().is_empty() || self.token.symbol.trim().is_empty() {
            return Err(invalid("token name and symbol must be set"));
        }
        if self.token.decimals > MAX_DECIMALS {
            return Err(invalid(format!(
                "token decimals must be at most {MAX_DECIMALS}, got {}",
                self.token.decimals
            )));
        }

        let supply = self.initial_supply()?;
        let fund = self.fund_amount()?;
        if fund > supply {
            return Err(invalid(format!(
                "funding {} exceeds initial supply {}",
                self.fund, self.token.initial_supply
            )));
        }
        self.distribution_rate()?;

        if self.distributor.claim_cooldown == Some(0) {
            return Err(invalid("claim cooldown must be non-zero"));
        }
        if self.distributor.address.is_some_and(|a| a.is_zero()) {
            return Err(invalid("distributor address must not be zero"));
        }
        if self.distributor.policy == PolicySpec::StakeWeighted
            && !matches!(self.distributor.eligibility, EligibilitySpec::Stake { .. })
        {
            return Err(invalid("stake-weighted policy requires stake eligibility"));
        }

        match &self.distributor.eligibility {
            EligibilitySpec::MerkleRoot { .. } => {
                self.merkle_root()?;
            }
            EligibilitySpec::Allowlist { members } => {
                if members.is_empty() {
                    return Err(invalid("allowlist must not be empty"));
                }
            }
            EligibilitySpec::Stake { entries } => {
                let mut seen = HashSet::new();
                for (i, entry) in entries.iter().enumerate() {
                    if !seen.insert(entry.address) {
                        return Err(invalid(format!("duplicate stake entry at index {i}")));
                    }
                }
                self.stake_entries()?;
            }
        }

        if let ClockSpec::Wall { block_time_ms: 0, .. } = self.clock {
            return Err(invalid("block time must be > 0"));
        }

        Ok(())
    }

    pub fn token_metadata(&self) -> TokenMetadata {
        TokenMetadata {
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            decimals: self.token.decimals,
        }
    }

    pub fn initial_supply(&self) -> Result<Amount, DeployError> {
        self.units(&self.token.initial_supply)
    }

    pub fn fund_amount(&self) -> Result<Amount, DeployError> {
        self.units(&self.fund)
    }

    pub fn distribution_rate(&self) -> Result<Amount, DeployError> {
        self.units(&self.distributor.rate)
    }

    /// Stake weights are scaled by the reward token's smallest unit, so a
    /// stake of one whole token earns the full rate.
    pub fn policy(&self) -> Result<AccrualPolicy, DeployError> {
        match self.distributor.policy {
            PolicySpec::Flat => Ok(AccrualPolicy::Flat),
            PolicySpec::StakeWeighted => {
                let weight_scale = 10u128
                    .checked_pow(u32::from(self.token.decimals))
                    .ok_or_else(|| invalid(format!("decimals {} too large", self.token.decimals)))?;
                Ok(AccrualPolicy::StakeWeighted { weight_scale })
            }
        }
    }

    /// Root the distributor commits to, computed from the allowlist when one
    /// is given. `None` in stake mode.
    pub fn merkle_root(&self) -> Result<Option<Hash>, DeployError> {
        let root = match &self.distributor.eligibility {
            EligibilitySpec::MerkleRoot { root } => {
                parse_hash(root).map_err(|e| invalid(format!("merkle root: {e}")))?
            }
            EligibilitySpec::Allowlist { members } => {
                MerkleTree::from_accounts(members.iter().map(|m| m.as_bytes()))
                    .map_err(|e| invalid(format!("allowlist: {e}")))?
                    .root()
            }
            EligibilitySpec::Stake { .. } => return Ok(None),
        };
        if root == ZERO_HASH {
            return Err(invalid("merkle root must not be zero"));
        }
        Ok(Some(root))
    }

    /// Seed stake entries scaled to smallest units.
    pub fn stake_entries(&self) -> Result<(Vec<Address>, Vec<Amount>), DeployError> {
        let EligibilitySpec::Stake { entries } = &self.distributor.eligibility else {
            return Ok((Vec::new(), Vec::new()));
        };
        let mut addresses = Vec::with_capacity(entries.len());
        let mut amounts = Vec::with_capacity(entries.len());
        for entry in entries {
            addresses.push(entry.address);
            amounts.push(self.units(&entry.amount)?);
        }
        Ok((addresses, amounts))
    }

    pub fn eligibility(&self) -> Result<EligibilitySet, DeployError> {
        match self.merkle_root()? {
            Some(root) => Ok(EligibilitySet::merkle(root)?),
            None => Ok(EligibilitySet::stake_registry()),
        }
    }

    fn units(&self, value: &str) -> Result<Amount, DeployError> {
        Ok(parse_units(value, self.token.decimals)?)
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn invalid(reason: impl Into<String>) -> DeployError {
    DeployError::InvalidConfig(reason.into())
}
