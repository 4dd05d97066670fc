use got_token::TokenHost;
use serde::{Deserialize, Serialize};

use crate::access::AccessControl;
use crate::accrual::{amount_due, AccrualPolicy};
use crate::clock::BlockClock;
use crate::custodian::TokenCustodian;
use crate::eligibility::{EligibilityMode, EligibilitySet};
use crate::ledger::{ClaimLedger, ClaimStatus};
use crate::types::*;

/// Construction parameters for a [`Distributor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributorConfig {
    /// Address the distributor holds its reward-token balance under.
    pub address: Address,
    pub owner: Address,
    pub reward_token: Address,
    pub eligibility: EligibilitySet,
    pub distribution_rate: Amount,
    pub policy: AccrualPolicy,
    /// Falls back to [`DEFAULT_CLAIM_COOLDOWN`].
    pub claim_cooldown: Option<u64>,
}

/// Serializable snapshot of everything a distributor owns except the token
/// host and the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorState {
    pub address: Address,
    pub owner: Address,
    pub reward_token: Address,
    pub eligibility: EligibilitySet,
    pub distribution_rate: Amount,
    pub policy: AccrualPolicy,
    pub claim_cooldown: u64,
    pub claims: ClaimLedger,
    pub deployed_at: BlockHeight,
}

/// The reward distributor.
///
/// Pays `distribution_rate` of the reward token (scaled by stake under
/// [`AccrualPolicy::StakeWeighted`]) to each eligible address at most once
/// per `claim_cooldown` blocks. Every operation either succeeds completely
/// or returns an error with state unchanged.
pub struct Distributor<H, C> {
    access: AccessControl,
    custodian: TokenCustodian<H>,
    eligibility: EligibilitySet,
    policy: AccrualPolicy,
    distribution_rate: Amount,
    claim_cooldown: u64,
    claims: ClaimLedger,
    clock: C,
    deployed_at: BlockHeight,
    events: Vec<DistributorEvent>,
}

impl<H: TokenHost, C: BlockClock> Distributor<H, C> {
    pub fn new(config: DistributorConfig, host: H, clock: C) -> DistributorResult<Self> {
        let deployed_at = clock.current_height();
        let state = DistributorState {
            address: config.address,
            owner: config.owner,
            reward_token: config.reward_token,
            eligibility: config.eligibility,
            distribution_rate: config.distribution_rate,
            policy: config.policy,
            claim_cooldown: config.claim_cooldown.unwrap_or(DEFAULT_CLAIM_COOLDOWN),
            claims: ClaimLedger::new(),
            deployed_at,
        };
        let distributor = Self::from_state(state, host, clock)?;

        tracing::info!(
            address = %distributor.address(),
            owner = %distributor.owner(),
            token = %distributor.reward_token(),
            mode = %distributor.eligibility.mode(),
            rate = distributor.distribution_rate,
            cooldown = distributor.claim_cooldown,
            "distributor deployed"
        );
        Ok(distributor)
    }

    /// Rebuild a distributor from a snapshot. The snapshot is validated the
    /// same way construction parameters are.
    pub fn from_state(state: DistributorState, host: H, clock: C) -> DistributorResult<Self> {
        let access = AccessControl::new(state.owner)?;
        validate_parameters(&state.eligibility, &state.policy, state.claim_cooldown)?;
        let custodian = TokenCustodian::new(host, state.address, state.reward_token)?;

        Ok(Self {
            access,
            custodian,
            eligibility: state.eligibility,
            policy: state.policy,
            distribution_rate: state.distribution_rate,
            claim_cooldown: state.claim_cooldown,
            claims: state.claims,
            clock,
            deployed_at: state.deployed_at,
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> DistributorState {
        DistributorState {
            address: self.custodian.vault(),
            owner: self.access.owner(),
            reward_token: self.custodian.token(),
            eligibility: self.eligibility.clone(),
            distribution_rate: self.distribution_rate,
            policy: self.policy,
            claim_cooldown: self.claim_cooldown,
            claims: self.claims.clone(),
            deployed_at: self.deployed_at,
        }
    }

    // ------------------------------------------------------------------
    // Claim
    // ------------------------------------------------------------------

    /// Claim the reward owed to `caller`.
    ///
    /// `proof` is the Merkle path for Merkle-mode distributors and must be
    /// empty for stake-registry distributors.
    pub fn claim(&mut self, caller: &Address, proof: &[Hash]) -> DistributorResult<ClaimReceipt> {
        let now = self.clock.current_height();
        let amount = self.quote(caller, proof, now)?;
        self.custodian.ensure_covers(BalanceCheck::Claim, amount)?;

        let previous = self.claims.record(*caller, now);
        if let Err(err) = self.custodian.payout(caller, amount) {
            self.claims.restore(*caller, previous);
            tracing::warn!(claimant = %caller, amount, error = %err, "payout failed, claim rolled back");
            return Err(err);
        }

        let receipt = ClaimReceipt {
            claimant: *caller,
            amount,
            height: now,
            next_claim_at: now.saturating_add(self.claim_cooldown),
        };
        tracing::info!(
            claimant = %caller,
            amount,
            height = now,
            next_claim_at = receipt.next_claim_at,
            "reward claimed"
        );
        self.events.push(DistributorEvent::RewardClaimed {
            claimant: *caller,
            amount,
            height: now,
        });
        Ok(receipt)
    }

    /// What `claim` would pay `account` right now, without touching state or
    /// checking the custodied balance.
    pub fn pending_reward(&self, account: &Address, proof: &[Hash]) -> DistributorResult<Amount> {
        self.quote(account, proof, self.clock.current_height())
    }

    /// Cooldown gate, then eligibility, then accrual.
    fn quote(&self, account: &Address, proof: &[Hash], now: BlockHeight) -> DistributorResult<Amount> {
        let elapsed = self.claims.ensure_ready(account, now, self.claim_cooldown)?;
        let weight = self.eligibility.check(account, proof)?;
        amount_due(
            &self.policy,
            weight,
            elapsed,
            self.claim_cooldown,
            self.distribution_rate,
        )
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> DistributorResult<()> {
        let previous = self.access.transfer_ownership(caller, new_owner)?;
        tracing::info!(previous = %previous, new = %new_owner, "ownership transferred");
        self.events.push(DistributorEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        });
        Ok(())
    }

    pub fn update_reward_token(&mut self, caller: &Address, token: Address) -> DistributorResult<()> {
        let previous = self.custodian.set_token(&self.access, caller, token)?;
        tracing::info!(previous = %previous, new = %token, "reward token updated");
        self.events.push(DistributorEvent::RewardTokenUpdated {
            previous,
            new: token,
        });
        Ok(())
    }

    pub fn update_distribution_rate(&mut self, caller: &Address, rate: Amount) -> DistributorResult<()> {
        self.access.ensure_owner(caller)?;
        let previous = std::mem::replace(&mut self.distribution_rate, rate);
        tracing::info!(previous, new = rate, "distribution rate updated");
        self.events.push(DistributorEvent::DistributionRateUpdated {
            previous,
            new: rate,
        });
        Ok(())
    }

    /// Takes effect for every address on the next evaluation.
    pub fn update_claim_cooldown(&mut self, caller: &Address, cooldown: u64) -> DistributorResult<()> {
        self.access.ensure_owner(caller)?;
        ensure_nonzero_cooldown(cooldown)?;
        let previous = std::mem::replace(&mut self.claim_cooldown, cooldown);
        tracing::info!(previous, new = cooldown, "claim cooldown updated");
        self.events.push(DistributorEvent::ClaimCooldownUpdated {
            previous,
            new: cooldown,
        });
        Ok(())
    }

    /// Batch upsert into the stake registry; a zero amount removes the entry.
    pub fn update_stake_registry(
        &mut self,
        caller: &Address,
        accounts: &[Address],
        amounts: &[Amount],
    ) -> DistributorResult<()> {
        let entries = self
            .eligibility
            .update_stake_registry(&self.access, caller, accounts, amounts)?;
        tracing::info!(entries, "stake registry updated");
        self.events
            .push(DistributorEvent::StakeRegistryUpdated { entries });
        Ok(())
    }

    pub fn rotate_merkle_root(&mut self, caller: &Address, root: Hash) -> DistributorResult<()> {
        let previous = self.eligibility.rotate_merkle_root(&self.access, caller, root)?;
        tracing::info!(
            previous = %got_merkle::format_hash(&previous),
            new = %got_merkle::format_hash(&root),
            "merkle root rotated"
        );
        self.events.push(DistributorEvent::MerkleRootRotated {
            previous,
            new: root,
        });
        Ok(())
    }

    /// Send `amount` of the custodied reward token to the owner.
    pub fn withdraw(&mut self, caller: &Address, amount: Amount) -> DistributorResult<()> {
        let owner = self.custodian.withdraw(&self.access, caller, amount)?;
        tracing::info!(owner = %owner, amount, "tokens withdrawn");
        self.events.push(DistributorEvent::Withdrawn { owner, amount });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.custodian.vault()
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn reward_token(&self) -> Address {
        self.custodian.token()
    }

    pub fn distribution_rate(&self) -> Amount {
        self.distribution_rate
    }

    pub fn claim_cooldown(&self) -> u64 {
        self.claim_cooldown
    }

    pub fn policy(&self) -> AccrualPolicy {
        self.policy
    }

    pub fn eligibility_mode(&self) -> EligibilityMode {
        self.eligibility.mode()
    }

    pub fn eligibility(&self) -> &EligibilitySet {
        &self.eligibility
    }

    pub fn is_eligible(&self, account: &Address, proof: &[Hash]) -> (bool, Amount) {
        self.eligibility.is_eligible(account, proof)
    }

    pub fn merkle_root(&self) -> Option<Hash> {
        self.eligibility.merkle_root()
    }

    pub fn staked_amount(&self, account: &Address) -> Option<Amount> {
        self.eligibility.staked_amount(account)
    }

    pub fn last_claim(&self, account: &Address) -> Option<BlockHeight> {
        self.claims.last_claim(account)
    }

    /// Every recorded claim as `(account, last claim height)`, ordered by account.
    pub fn claim_records(&self) -> impl Iterator<Item = (&Address, &BlockHeight)> {
        self.claims.iter()
    }

    pub fn claim_status(&self, account: &Address) -> ClaimStatus {
        self.claims
            .status(account, self.clock.current_height(), self.claim_cooldown)
    }

    /// Reward-token balance held by the distributor.
    pub fn contract_balance(&self) -> DistributorResult<Amount> {
        self.custodian.balance()
    }

    pub fn deployed_at(&self) -> BlockHeight {
        self.deployed_at
    }

    pub fn current_height(&self) -> BlockHeight {
        self.clock.current_height()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn host(&self) -> &H {
        self.custodian.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.custodian.host_mut()
    }

    /// Take every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<DistributorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Split into the state snapshot and the token host.
    pub fn into_parts(self) -> (DistributorState, H) {
        let state = self.state();
        (state, self.custodian.into_host())
    }
}

fn validate_parameters(
    eligibility: &EligibilitySet,
    policy: &AccrualPolicy,
    claim_cooldown: u64,
) -> DistributorResult<()> {
    ensure_nonzero_cooldown(claim_cooldown)?;
    policy.validate()?;
    if policy.is_stake_weighted() && eligibility.mode() != EligibilityMode::Stake {
        return Err(DistributorError::InvalidParameters(
            "stake-weighted accrual requires a stake registry".into(),
        ));
    }
    if let Some(root) = eligibility.merkle_root() {
        EligibilitySet::merkle(root)?;
    }
    Ok(())
}

fn ensure_nonzero_cooldown(cooldown: u64) -> DistributorResult<()> {
    if cooldown == 0 {
        return Err(DistributorError::InvalidParameters(
            "claim cooldown must be non-zero".into(),
        ));
    }
    Ok(())
}
