//! End-to-end claim scenarios across the distributor, the Merkle builder, the
//! token host and the snapshot store.

use rand::Rng;

use got_distributor::{
    AccrualPolicy, BalanceCheck, ClaimStatus, Distributor, DistributorConfig, DistributorError,
    DistributorEvent, DistributorState, EligibilityFailure, EligibilitySet, ManualClock,
    DEFAULT_CLAIM_COOLDOWN, WEIGHT_SCALE,
};
use got_merkle::MerkleTree;
use got_storage::StateStore;
use got_token::{
    Address, Amount, SharedTokenHost, TokenError, TokenHost, TokenMetadata, TokenRegistry,
};

const COOLDOWN: u64 = DEFAULT_CLAIM_COOLDOWN;

fn addr(n: u8) -> Address {
    Address([n; 32])
}

fn owner() -> Address {
    addr(0xaa)
}

fn vault() -> Address {
    addr(0xd1)
}

struct Harness {
    host: SharedTokenHost,
    token: Address,
    clock: ManualClock,
}

impl Harness {
    /// Token with a large supply held by the owner and `funded` units moved
    /// to the distributor address.
    fn new(funded: Amount) -> Self {
        let mut registry = TokenRegistry::new();
        let metadata = TokenMetadata {
            name: "GOT Reward".into(),
            symbol: "GOT".into(),
            decimals: 18,
        };
        let token = registry
            .deploy(metadata, 1_000_000 * WEIGHT_SCALE, owner())
            .unwrap();
        registry.transfer(&token, &owner(), &vault(), funded).unwrap();
        Self {
            host: SharedTokenHost::new(registry),
            token,
            clock: ManualClock::new(100_000),
        }
    }

    fn config(&self, eligibility: EligibilitySet, rate: Amount) -> DistributorConfig {
        DistributorConfig {
            address: vault(),
            owner: owner(),
            reward_token: self.token,
            eligibility,
            distribution_rate: rate,
            policy: AccrualPolicy::Flat,
            claim_cooldown: Some(COOLDOWN),
        }
    }

    fn deploy(&self, config: DistributorConfig) -> Distributor<SharedTokenHost, ManualClock> {
        Distributor::new(config, self.host.clone(), self.clock.clone()).unwrap()
    }

    fn balance(&self, holder: &Address) -> Amount {
        self.host.balance_of(&self.token, holder).unwrap()
    }
}

fn tree_over(members: &[Address]) -> MerkleTree {
    MerkleTree::from_accounts(members.iter().map(|a| a.as_bytes())).unwrap()
}

fn proof_for(tree: &MerkleTree, account: &Address) -> Vec<[u8; 32]> {
    tree.bundle_for_account(account.as_bytes()).unwrap().proof
}

// ---------------------------------------------------------------------------
// Scenario A: first claim after a full period, then cooldown
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_claim_then_cooldown() {
    let harness = Harness::new(105);
    let claimant = addr(1);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    distributor
        .update_stake_registry(&owner(), &[claimant], &[1])
        .unwrap();

    harness.clock.advance(COOLDOWN);
    let receipt = distributor.claim(&claimant, &[]).unwrap();
    assert_eq!(receipt.amount, 10);
    assert_eq!(harness.balance(&claimant), 10);
    assert_eq!(distributor.contract_balance().unwrap(), 95);

    let err = distributor.claim(&claimant, &[]).unwrap_err();
    assert!(matches!(err, DistributorError::CooldownActive { .. }));
    assert!(err.to_string().starts_with("must wait for a day before claiming"));
    assert_eq!(harness.balance(&claimant), 10);
}

// ---------------------------------------------------------------------------
// Scenario B: underfunded distributor
// ---------------------------------------------------------------------------

#[test]
fn scenario_b_insufficient_balance() {
    let harness = Harness::new(5);
    let claimant = addr(1);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    distributor
        .update_stake_registry(&owner(), &[claimant], &[1])
        .unwrap();

    let err = distributor.claim(&claimant, &[]).unwrap_err();
    assert_eq!(
        err,
        DistributorError::InsufficientContractBalance {
            kind: BalanceCheck::Claim,
            requested: 10,
            available: 5,
        }
    );
    assert!(err.to_string().starts_with("not enough tokens"));
    assert_eq!(distributor.contract_balance().unwrap(), 5);
    assert_eq!(distributor.claim_status(&claimant), ClaimStatus::NeverClaimed);
}

// ---------------------------------------------------------------------------
// Scenario C: Merkle allowlist
// ---------------------------------------------------------------------------

#[test]
fn scenario_c_merkle_membership() {
    let harness = Harness::new(1_000);
    let (x, y, z, w) = (addr(1), addr(2), addr(3), addr(4));
    let tree = tree_over(&[x, y, z]);
    let mut distributor =
        harness.deploy(harness.config(EligibilitySet::merkle(tree.root()).unwrap(), 10));

    for proof in [vec![], proof_for(&tree, &x)] {
        assert_eq!(
            distributor.claim(&w, &proof),
            Err(DistributorError::InvalidProof {
                reason: EligibilityFailure::ProofMismatch
            })
        );
    }
    assert_eq!(distributor.claim(&x, &proof_for(&tree, &x)).unwrap().amount, 10);
    assert_eq!(harness.balance(&x), 10);
    assert_eq!(harness.balance(&w), 0);
}

// ---------------------------------------------------------------------------
// Scenario D: ownership transfer
// ---------------------------------------------------------------------------

#[test]
fn scenario_d_ownership_transfer() {
    let harness = Harness::new(0);
    let new_owner = addr(0xbb);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));

    distributor.transfer_ownership(&owner(), new_owner).unwrap();
    assert_eq!(
        distributor.update_distribution_rate(&owner(), 20),
        Err(DistributorError::NotOwner { caller: owner() })
    );
    distributor.update_distribution_rate(&new_owner, 20).unwrap();
    assert_eq!(distributor.distribution_rate(), 20);
    assert_eq!(distributor.owner(), new_owner);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn cooldown_gate_is_idempotent() {
    let harness = Harness::new(1_000);
    let claimant = addr(1);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    distributor
        .update_stake_registry(&owner(), &[claimant], &[1])
        .unwrap();
    distributor.claim(&claimant, &[]).unwrap();

    for step in [0, 1, COOLDOWN / 2, COOLDOWN / 2 - 2] {
        harness.clock.advance(step);
        assert!(matches!(
            distributor.claim(&claimant, &[]),
            Err(DistributorError::CooldownActive { .. })
        ));
    }
    assert_eq!(harness.balance(&claimant), 10);
    assert_eq!(distributor.last_claim(&claimant), Some(100_000));
}

#[test]
fn long_absence_pays_a_single_period() {
    let harness = Harness::new(1_000);
    let claimant = addr(1);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    distributor
        .update_stake_registry(&owner(), &[claimant], &[1])
        .unwrap();
    distributor.claim(&claimant, &[]).unwrap();

    harness.clock.advance(30 * COOLDOWN);
    assert_eq!(distributor.pending_reward(&claimant, &[]), Ok(10));
    assert_eq!(distributor.claim(&claimant, &[]).unwrap().amount, 10);
}

#[test]
fn stake_weighted_rewards_follow_stake() {
    let harness = Harness::new(10_000 * WEIGHT_SCALE);
    let (small, large) = (addr(1), addr(2));
    let mut config = harness.config(EligibilitySet::stake_registry(), 10 * WEIGHT_SCALE);
    config.policy = AccrualPolicy::stake_weighted();
    let mut distributor = harness.deploy(config);
    distributor
        .update_stake_registry(&owner(), &[small, large], &[WEIGHT_SCALE / 2, 3 * WEIGHT_SCALE])
        .unwrap();

    assert_eq!(distributor.claim(&small, &[]).unwrap().amount, 5 * WEIGHT_SCALE);
    assert_eq!(distributor.claim(&large, &[]).unwrap().amount, 30 * WEIGHT_SCALE);
    assert_eq!(
        distributor.claim(&addr(3), &[]),
        Err(DistributorError::InvalidProof {
            reason: EligibilityFailure::NoStakedAmount
        })
    );
}

#[test]
fn random_allowlists_accept_members_only() {
    let mut rng = rand::thread_rng();
    let harness = Harness::new(1_000_000);

    for _ in 0..10 {
        let size = rng.gen_range(1..40);
        let members: Vec<Address> = (0..size).map(|_| Address(rng.gen())).collect();
        let tree = tree_over(&members);
        let mut distributor =
            harness.deploy(harness.config(EligibilitySet::merkle(tree.root()).unwrap(), 1));

        for member in &members {
            let proof = proof_for(&tree, member);
            assert_eq!(distributor.is_eligible(member, &proof), (true, 1));
        }
        let outsider = Address(rng.gen());
        let borrowed = proof_for(&tree, &members[0]);
        assert_eq!(distributor.is_eligible(&outsider, &borrowed), (false, 0));
        assert!(distributor.claim(&outsider, &borrowed).is_err());
    }
}

#[test]
fn withdraw_cannot_exceed_balance() {
    let harness = Harness::new(50);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    let owner_before = harness.balance(&owner());

    let err = distributor.withdraw(&owner(), 51).unwrap_err();
    assert!(err.to_string().starts_with("insufficient tokens in contract"));
    distributor.withdraw(&owner(), 50).unwrap();
    assert_eq!(distributor.contract_balance().unwrap(), 0);
    assert_eq!(harness.balance(&owner()), owner_before + 50);
}

/// Host that reports balances normally but refuses every transfer.
struct RefusingHost(TokenRegistry);

impl TokenHost for RefusingHost {
    fn contains_token(&self, token: &Address) -> bool {
        self.0.contains_token(token)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> Result<Amount, TokenError> {
        self.0.balance_of(token, holder)
    }

    fn transfer(
        &mut self,
        _token: &Address,
        _from: &Address,
        _to: &Address,
        _amount: Amount,
    ) -> Result<(), TokenError> {
        Err(TokenError::Overflow)
    }
}

#[test]
fn failed_transfer_rolls_back_the_claim() {
    let harness = Harness::new(100);
    let claimant = addr(1);
    let host = RefusingHost(harness.host.snapshot());
    let mut distributor = Distributor::new(
        harness.config(EligibilitySet::stake_registry(), 10),
        host,
        harness.clock.clone(),
    )
    .unwrap();
    distributor
        .update_stake_registry(&owner(), &[claimant], &[1])
        .unwrap();
    distributor.drain_events();

    assert_eq!(
        distributor.claim(&claimant, &[]),
        Err(DistributorError::Token(TokenError::Overflow))
    );
    assert_eq!(distributor.last_claim(&claimant), None);
    assert_eq!(distributor.claim_status(&claimant), ClaimStatus::NeverClaimed);
    assert_eq!(distributor.contract_balance().unwrap(), 100);
    assert!(distributor.drain_events().is_empty());
}

#[test]
fn rotating_the_root_switches_the_allowlist() {
    let harness = Harness::new(1_000);
    let old_tree = tree_over(&[addr(1), addr(2)]);
    let new_tree = tree_over(&[addr(3), addr(4)]);
    let mut distributor =
        harness.deploy(harness.config(EligibilitySet::merkle(old_tree.root()).unwrap(), 10));

    distributor
        .rotate_merkle_root(&owner(), new_tree.root())
        .unwrap();
    assert!(distributor.claim(&addr(1), &proof_for(&old_tree, &addr(1))).is_err());
    assert!(distributor.claim(&addr(3), &proof_for(&new_tree, &addr(3))).is_ok());

    let events = distributor.drain_events();
    assert!(matches!(events[0], DistributorEvent::MerkleRootRotated { .. }));
    assert!(matches!(events[1], DistributorEvent::RewardClaimed { amount: 10, .. }));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn snapshot_survives_store_reopen() {
    let dir = std::env::temp_dir().join(format!("got_scenarios_reopen_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let harness = Harness::new(1_000);
    let claimant = addr(1);
    let mut distributor = harness.deploy(harness.config(EligibilitySet::stake_registry(), 10));
    distributor
        .update_stake_registry(&owner(), &[claimant, addr(2)], &[7, 9])
        .unwrap();
    distributor.claim(&claimant, &[]).unwrap();

    {
        let store = StateStore::open(&dir).unwrap();
        store.save("distributor", &distributor.state()).unwrap();
        store.save("tokens", &harness.host.snapshot()).unwrap();
    }

    let store = StateStore::open(&dir).unwrap();
    let state: DistributorState = store.load("distributor").unwrap().unwrap();
    let tokens: TokenRegistry = store.load("tokens").unwrap().unwrap();
    let mut restored =
        Distributor::from_state(state, SharedTokenHost::new(tokens), harness.clock.clone())
            .unwrap();

    assert_eq!(restored.state(), distributor.state());
    assert_eq!(restored.staked_amount(&addr(2)), Some(9));
    assert_eq!(restored.contract_balance().unwrap(), 990);

    harness.clock.advance(COOLDOWN);
    let original = distributor.claim(&claimant, &[]).unwrap();
    let replayed = restored.claim(&claimant, &[]).unwrap();
    assert_eq!(original, replayed);

    let _ = std::fs::remove_dir_all(&dir);
}
