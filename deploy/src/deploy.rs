use sha2::{Digest, Sha256};

use got_distributor::{BlockClock, Distributor, DistributorConfig};
use got_token::{Address, TokenHost, TokenRegistry};

use crate::config::DeployConfig;
use crate::snapshot::ChainSnapshot;
use crate::types::*;

/// A freshly deployed token and its funded distributor.
pub struct Deployment<C> {
    pub token: Address,
    pub distributor: Distributor<TokenRegistry, C>,
    pub clock: ClockSpec,
}

impl<C: BlockClock> Deployment<C> {
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot::capture(&self.distributor, self.clock.clone())
    }
}

/// Deploy with the clock described in the config.
pub fn deploy(config: &DeployConfig) -> Result<Deployment<Box<dyn BlockClock>>, DeployError> {
    deploy_with_clock(config, config.clock.build())
}

/// Deploy the reward token, the distributor, seed its stake registry and
/// fund it from the owner.
pub fn deploy_with_clock<C: BlockClock>(
    config: &DeployConfig,
    clock: C,
) -> Result<Deployment<C>, DeployError> {
    config.validate()?;
    let owner = config.owner;

    let mut registry = TokenRegistry::new();
    let token = registry.deploy(config.token_metadata(), config.initial_supply()?, owner)?;
    let address = config
        .distributor
        .address
        .unwrap_or_else(|| derive_distributor_address(&owner, &token));

    let distributor_config = DistributorConfig {
        address,
        owner,
        reward_token: token,
        eligibility: config.eligibility()?,
        distribution_rate: config.distribution_rate()?,
        policy: config.policy()?,
        claim_cooldown: config.distributor.claim_cooldown,
    };
    let mut distributor = Distributor::new(distributor_config, registry, clock)?;

    let (addresses, amounts) = config.stake_entries()?;
    if !addresses.is_empty() {
        distributor.update_stake_registry(&owner, &addresses, &amounts)?;
    }

    let fund = config.fund_amount()?;
    if fund > 0 {
        distributor
            .host_mut()
            .transfer(&token, &owner, &address, fund)?;
    }

    tracing::info!(
        token = %token,
        distributor = %address,
        funded = fund,
        stake_entries = addresses.len(),
        "deployment complete"
    );

    Ok(Deployment {
        token,
        distributor,
        clock: config.clock.clone(),
    })
}

/// SHA-256 of the owner and the reward token it deploys against.
pub fn derive_distributor_address(owner: &Address, token: &Address) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(b"got-distributor");
    hasher.update(owner.as_bytes());
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Address(bytes)
}
