//! Deploy-to-claim flows: config parsing, deployment, claims and snapshot
//! persistence across a store reopen.

use got_deploy::{deploy, ChainSnapshot, DeployBuilder, DeployConfig, DeployError, PolicySpec};
use got_distributor::{DistributorError, DEFAULT_CLAIM_COOLDOWN};
use got_merkle::MerkleTree;
use got_storage::StateStore;
use got_token::{Address, TokenHost};

const WEI: u128 = 1_000_000_000_000_000_000;

fn addr(n: u8) -> Address {
    Address([n; 32])
}

fn hex_addr(n: u8) -> String {
    addr(n).to_string()
}

fn allowlist_toml() -> String {
    format!(
        r#"
owner = "{owner}"
fund = "105"

[token]
name = "Test Reward Token"
symbol = "TRT"
decimals = 18
initial_supply = "10000000"

[distributor]
rate = "10"

[distributor.eligibility.allowlist]
members = ["{x}", "{y}", "{z}"]

[clock.manual]
height = 20000
"#,
        owner = hex_addr(0xaa),
        x = hex_addr(1),
        y = hex_addr(2),
        z = hex_addr(3),
    )
}

fn stake_json() -> String {
    format!(
        r#"{{
  "owner": "{owner}",
  "fund": "1000",
  "token": {{ "name": "GOT", "symbol": "GOT", "initial_supply": "5000" }},
  "distributor": {{
    "rate": "4",
    "claim_cooldown": 100,
    "policy": "stake_weighted",
    "eligibility": {{ "stake": {{ "entries": [
      {{ "address": "{a}", "amount": "0.5" }},
      {{ "address": "{b}", "amount": "2" }}
    ] }} }}
  }}
}}"#,
        owner = hex_addr(0xaa),
        a = hex_addr(1),
        b = hex_addr(2),
    )
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

#[test]
fn toml_config_deploys_funded_distributor() {
    let config = DeployConfig::from_toml_str(&allowlist_toml()).unwrap();
    let deployment = deploy(&config).unwrap();
    let distributor = &deployment.distributor;

    assert_eq!(distributor.contract_balance().unwrap(), 105 * WEI);
    assert_eq!(distributor.owner(), addr(0xaa));
    assert_eq!(distributor.distribution_rate(), 10 * WEI);
    assert_eq!(distributor.claim_cooldown(), DEFAULT_CLAIM_COOLDOWN);
    assert_eq!(distributor.current_height(), 20_000);
    assert_eq!(
        distributor
            .host()
            .balance_of(&deployment.token, &addr(0xaa))
            .unwrap(),
        (10_000_000 - 105) * WEI
    );
}

#[test]
fn allowlist_members_claim_with_builder_proofs() {
    let config = DeployConfig::from_toml_str(&allowlist_toml()).unwrap();
    let mut deployment = deploy(&config).unwrap();
    let tree = MerkleTree::from_accounts([addr(1), addr(2), addr(3)].iter().map(|a| a.as_bytes()))
        .unwrap();
    assert_eq!(deployment.distributor.merkle_root(), Some(tree.root()));

    let proof = tree.bundle_for_account(addr(2).as_bytes()).unwrap().proof;
    let receipt = deployment.distributor.claim(&addr(2), &proof).unwrap();
    assert_eq!(receipt.amount, 10 * WEI);

    assert!(matches!(
        deployment.distributor.claim(&addr(9), &proof),
        Err(DistributorError::InvalidProof { .. })
    ));
}

#[test]
fn json_stake_weighted_deployment() {
    let config = DeployConfig::from_json_str(&stake_json()).unwrap();
    let mut deployment = deploy(&config).unwrap();
    let distributor = &mut deployment.distributor;

    assert_eq!(distributor.staked_amount(&addr(1)), Some(WEI / 2));
    assert_eq!(distributor.claim(&addr(1), &[]).unwrap().amount, 2 * WEI);
    assert_eq!(distributor.claim(&addr(2), &[]).unwrap().amount, 8 * WEI);
    assert_eq!(distributor.contract_balance().unwrap(), 990 * WEI);
}

#[test]
fn stake_weighted_payout_uses_token_precision() {
    let config = DeployBuilder::new(addr(0xaa))
        .with_token("Six", "SIX", 6, "1000000")
        .with_policy(PolicySpec::StakeWeighted)
        .with_rate("10")
        .with_stake(addr(1), "2")
        .with_stake(addr(2), "0.25")
        .with_funding("1000")
        .build()
        .unwrap();
    let mut deployment = deploy(&config).unwrap();
    let distributor = &mut deployment.distributor;

    assert_eq!(distributor.distribution_rate(), 10_000_000);
    assert_eq!(distributor.staked_amount(&addr(1)), Some(2_000_000));
    assert_eq!(distributor.claim(&addr(1), &[]).unwrap().amount, 20_000_000);
    assert_eq!(distributor.claim(&addr(2), &[]).unwrap().amount, 2_500_000);
    assert_eq!(distributor.contract_balance().unwrap(), 977_500_000);
}

#[test]
fn invalid_config_is_rejected_before_deploying() {
    let mut config = DeployConfig::from_json_str(&stake_json()).unwrap();
    config.fund = "5001".into();
    assert!(matches!(deploy(&config), Err(DeployError::InvalidConfig(_))));
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn snapshot_resumes_after_reopen() {
    let dir = std::env::temp_dir().join(format!("got_deploy_flow_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let config = DeployConfig::from_json_str(&stake_json()).unwrap();
    let mut deployment = deploy(&config).unwrap();
    deployment.distributor.claim(&addr(1), &[]).unwrap();
    {
        let store = StateStore::open(&dir).unwrap();
        deployment.snapshot().save(&store).unwrap();
    }

    let store = StateStore::open(&dir).unwrap();
    let mut snapshot = ChainSnapshot::load(&store).unwrap();
    let mut restored = snapshot.restore().unwrap();
    assert_eq!(restored.last_claim(&addr(1)), Some(0));
    assert!(matches!(
        restored.claim(&addr(1), &[]),
        Err(DistributorError::CooldownActive { ready_at: 100 })
    ));

    snapshot.advance(100).unwrap();
    let mut restored = snapshot.restore().unwrap();
    assert_eq!(restored.claim(&addr(1), &[]).unwrap().amount, 2 * WEI);
    snapshot.record(&restored);
    snapshot.save(&store).unwrap();

    let reloaded = ChainSnapshot::load(&StateStore::open(&dir).unwrap()).unwrap();
    assert_eq!(reloaded.distributor.claims.last_claim(&addr(1)), Some(100));
    assert_eq!(reloaded.restore().unwrap().contract_balance().unwrap(), 996 * WEI);

    let _ = std::fs::remove_dir_all(&dir);
}
