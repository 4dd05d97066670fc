use chrono::{DateTime, Utc};

use got_merkle::{format_hash, Hash};
use got_token::Address;

use crate::config::DeployConfig;
use crate::types::*;

/// Builder for constructing a `DeployConfig` step by step.
pub struct DeployBuilder {
    owner: Address,
    token: TokenSpec,
    distributor: DistributorSpec,
    fund: String,
    clock: ClockSpec,
}

impl DeployBuilder {
    /// Start from an 18-decimal token with a 10,000,000 supply, a flat
    /// distributor paying 10 tokens per period over an empty stake registry,
    /// no funding and a manual clock at height 0.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            token: TokenSpec {
                name: "GOT Reward Token".to_string(),
                symbol: "GOT".to_string(),
                decimals: 18,
                initial_supply: "10000000".to_string(),
            },
            distributor: DistributorSpec {
                address: None,
                rate: "10".to_string(),
                claim_cooldown: None,
                policy: PolicySpec::Flat,
                eligibility: EligibilitySpec::Stake {
                    entries: Vec::new(),
                },
            },
            fund: "0".to_string(),
            clock: ClockSpec::default(),
        }
    }

    pub fn with_token(
        mut self,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: impl Into<String>,
    ) -> Self {
        self.token = TokenSpec {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            initial_supply: initial_supply.into(),
        };
        self
    }

    pub fn with_distributor_address(mut self, address: Address) -> Self {
        self.distributor.address = Some(address);
        self
    }

    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.distributor.rate = rate.into();
        self
    }

    pub fn with_claim_cooldown(mut self, blocks: u64) -> Self {
        self.distributor.claim_cooldown = Some(blocks);
        self
    }

    pub fn with_policy(mut self, policy: PolicySpec) -> Self {
        self.distributor.policy = policy;
        self
    }

    pub fn with_merkle_root(mut self, root: Hash) -> Self {
        self.distributor.eligibility = EligibilitySpec::MerkleRoot {
            root: format_hash(&root),
        };
        self
    }

    pub fn with_allowlist(mut self, members: Vec<Address>) -> Self {
        self.distributor.eligibility = EligibilitySpec::Allowlist { members };
        self
    }

    /// Switch to stake eligibility (if not already) and add a seed entry.
    pub fn with_stake(mut self, address: Address, amount: impl Into<String>) -> Self {
        let entry = StakeEntrySpec {
            address,
            amount: amount.into(),
        };
        match &mut self.distributor.eligibility {
            EligibilitySpec::Stake { entries } => entries.push(entry),
            other => *other = EligibilitySpec::Stake { entries: vec![entry] },
        }
        self
    }

    pub fn with_funding(mut self, fund: impl Into<String>) -> Self {
        self.fund = fund.into();
        self
    }

    pub fn with_manual_clock(mut self, height: u64) -> Self {
        self.clock = ClockSpec::Manual { height };
        self
    }

    pub fn with_wall_clock(mut self, genesis_time: DateTime<Utc>, block_time_ms: u64) -> Self {
        self.clock = ClockSpec::Wall {
            genesis_time,
            block_time_ms,
        };
        self
    }

    /// Build the final config. Validates all invariants before returning.
    pub fn build(self) -> Result<DeployConfig, DeployError> {
        let config = DeployConfig {
            owner: self.owner,
            token: self.token,
            distributor: self.distributor,
            fund: self.fund,
            clock: self.clock,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address([0xaa; 32])
    }

    #[test]
    fn defaults_are_valid() {
        let config = DeployBuilder::new(owner()).build().unwrap();
        assert_eq!(config.distributor.rate, "10");
        assert!(matches!(
            config.distributor.eligibility,
            EligibilitySpec::Stake { .. }
        ));
    }

    #[test]
    fn with_stake_accumulates_entries() {
        let config = DeployBuilder::new(owner())
            .with_allowlist(vec![Address([1; 32])])
            .with_stake(Address([1; 32]), "1")
            .with_stake(Address([2; 32]), "2")
            .build()
            .unwrap();
        let (addresses, amounts) = config.stake_entries().unwrap();
        assert_eq!(addresses, vec![Address([1; 32]), Address([2; 32])]);
        assert_eq!(amounts, vec![10u128.pow(18), 2 * 10u128.pow(18)]);
    }

    #[test]
    fn merkle_root_is_stored_as_hex() {
        let config = DeployBuilder::new(owner())
            .with_merkle_root([7u8; 32])
            .build()
            .unwrap();
        assert_eq!(config.merkle_root().unwrap(), Some([7u8; 32]));
    }

    #[test]
    fn build_validates() {
        let result = DeployBuilder::new(owner())
            .with_token("T", "T", 0, "100")
            .with_funding("101")
            .build();
        assert!(matches!(result, Err(DeployError::InvalidConfig(_))));

        let result = DeployBuilder::new(Address::ZERO).build();
        assert!(matches!(result, Err(DeployError::InvalidConfig(_))));
    }

    #[test]
    fn wall_clock_settings_kept() {
        let genesis = DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let config = DeployBuilder::new(owner())
            .with_wall_clock(genesis, 6_000)
            .build()
            .unwrap();
        assert_eq!(
            config.clock,
            ClockSpec::Wall {
                genesis_time: genesis,
                block_time_ms: 6_000
            }
        );
    }
}
