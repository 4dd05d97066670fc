use std::collections::BTreeMap;
use std::fmt;

use got_merkle::{hash_leaf, ZERO_HASH};
use serde::{Deserialize, Serialize};

use crate::access::AccessControl;
use crate::types::*;

/// Owner-maintained map from address to staked amount.
///
/// A missing entry and a zero entry both mean "not eligible"; writing a zero
/// amount removes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRegistry {
    stakes: BTreeMap<Address, Amount>,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Staked amount for `account`, `None` when not eligible.
    pub fn staked_amount(&self, account: &Address) -> Option<Amount> {
        self.stakes.get(account).copied().filter(|amount| *amount > 0)
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn total_staked(&self) -> Amount {
        self.stakes
            .values()
            .fold(0u128, |acc, amount| acc.saturating_add(*amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.stakes.iter()
    }

    /// Batch upsert. Later duplicates in the batch win. Returns the number of
    /// pairs applied.
    pub fn upsert_batch(
        &mut self,
        access: &AccessControl,
        caller: &Address,
        accounts: &[Address],
        amounts: &[Amount],
    ) -> DistributorResult<usize> {
        access.ensure_owner(caller)?;
        if accounts.len() != amounts.len() {
            return Err(DistributorError::InvalidParameters(format!(
                "stake batch length mismatch: {} addresses, {} amounts",
                accounts.len(),
                amounts.len()
            )));
        }

        for (account, amount) in accounts.iter().zip(amounts) {
            if *amount == 0 {
                self.stakes.remove(account);
            } else {
                self.stakes.insert(*account, *amount);
            }
        }
        Ok(accounts.len())
    }
}

/// Which eligibility representation a distributor was deployed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityMode {
    Merkle,
    Stake,
}

impl fmt::Display for EligibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityMode::Merkle => write!(f, "merkle"),
            EligibilityMode::Stake => write!(f, "stake"),
        }
    }
}

/// The eligibility commitment: a Merkle root over an allowlist, or a stake
/// registry. Fixed per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilitySet {
    MerkleRoot(#[serde(with = "got_merkle::hex_hash")] Hash),
    StakeRegistry(StakeRegistry),
}

impl EligibilitySet {
    /// Merkle mode over `root`. The zero hash is rejected.
    pub fn merkle(root: Hash) -> DistributorResult<Self> {
        ensure_nonzero_root(&root)?;
        Ok(EligibilitySet::MerkleRoot(root))
    }

    /// Stake mode with an empty registry.
    pub fn stake_registry() -> Self {
        EligibilitySet::StakeRegistry(StakeRegistry::new())
    }

    pub fn mode(&self) -> EligibilityMode {
        match self {
            EligibilitySet::MerkleRoot(_) => EligibilityMode::Merkle,
            EligibilitySet::StakeRegistry(_) => EligibilityMode::Stake,
        }
    }

    /// Check a claimant and return its weight: 1 in Merkle mode, the staked
    /// amount in stake mode.
    pub fn check(&self, claimant: &Address, proof: &[Hash]) -> DistributorResult<Amount> {
        match self {
            EligibilitySet::MerkleRoot(root) => {
                let leaf = hash_leaf(claimant.as_bytes());
                if got_merkle::verify(proof, root, leaf) {
                    Ok(1)
                } else {
                    Err(DistributorError::InvalidProof {
                        reason: EligibilityFailure::ProofMismatch,
                    })
                }
            }
            EligibilitySet::StakeRegistry(registry) => {
                if !proof.is_empty() {
                    return Err(DistributorError::InvalidParameters(
                        "merkle proof supplied to a stake-registry distributor".into(),
                    ));
                }
                registry
                    .staked_amount(claimant)
                    .ok_or(DistributorError::InvalidProof {
                        reason: EligibilityFailure::NoStakedAmount,
                    })
            }
        }
    }

    /// `(eligible, weight)` view of [`check`](Self::check); weight is 0 when
    /// not eligible.
    pub fn is_eligible(&self, claimant: &Address, proof: &[Hash]) -> (bool, Amount) {
        match self.check(claimant, proof) {
            Ok(weight) => (true, weight),
            Err(_) => (false, 0),
        }
    }

    pub fn merkle_root(&self) -> Option<Hash> {
        match self {
            EligibilitySet::MerkleRoot(root) => Some(*root),
            EligibilitySet::StakeRegistry(_) => None,
        }
    }

    pub fn registry(&self) -> Option<&StakeRegistry> {
        match self {
            EligibilitySet::MerkleRoot(_) => None,
            EligibilitySet::StakeRegistry(registry) => Some(registry),
        }
    }

    pub fn staked_amount(&self, account: &Address) -> Option<Amount> {
        self.registry().and_then(|r| r.staked_amount(account))
    }

    /// Replace the Merkle root. Returns the previous root.
    pub fn rotate_merkle_root(
        &mut self,
        access: &AccessControl,
        caller: &Address,
        new_root: Hash,
    ) -> DistributorResult<Hash> {
        access.ensure_owner(caller)?;
        match self {
            EligibilitySet::MerkleRoot(root) => {
                ensure_nonzero_root(&new_root)?;
                Ok(std::mem::replace(root, new_root))
            }
            EligibilitySet::StakeRegistry(_) => Err(DistributorError::InvalidParameters(
                "cannot rotate merkle root of a stake-registry distributor".into(),
            )),
        }
    }

    /// Batch upsert into the stake registry.
    pub fn update_stake_registry(
        &mut self,
        access: &AccessControl,
        caller: &Address,
        accounts: &[Address],
        amounts: &[Amount],
    ) -> DistributorResult<usize> {
        match self {
            EligibilitySet::StakeRegistry(registry) => {
                registry.upsert_batch(access, caller, accounts, amounts)
            }
            EligibilitySet::MerkleRoot(_) => {
                access.ensure_owner(caller)?;
                Err(DistributorError::InvalidParameters(
                    "cannot update stakes of a merkle distributor".into(),
                ))
            }
        }
    }
}

fn ensure_nonzero_root(root: &Hash) -> DistributorResult<()> {
    if *root == ZERO_HASH {
        return Err(DistributorError::InvalidParameters(
            "merkle root must not be zero".into(),
        ));
    }
    Ok(())
}
