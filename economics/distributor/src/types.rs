use std::fmt;

use serde::{Deserialize, Serialize};

pub use got_merkle::Hash;
pub use got_token::{Address, Amount, TokenError};

/// Host chain block height.
pub type BlockHeight = u64;

/// Default blocks between two claims of the same address; roughly one day of
/// host chain blocks.
pub const DEFAULT_CLAIM_COOLDOWN: u64 = 13_900;

/// Why an eligibility check rejected a claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityFailure {
    /// Merkle proof did not fold to the committed root.
    ProofMismatch,
    /// Stake registry has no (or a zero) entry for the claimant.
    NoStakedAmount,
}

impl fmt::Display for EligibilityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityFailure::ProofMismatch => write!(f, "invalid proof"),
            EligibilityFailure::NoStakedAmount => write!(f, "no staked amount"),
        }
    }
}

/// Which outflow a balance check guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceCheck {
    Claim,
    Withdraw,
}

impl fmt::Display for BalanceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceCheck::Claim => write!(f, "not enough tokens"),
            BalanceCheck::Withdraw => write!(f, "insufficient tokens in contract"),
        }
    }
}

/// Errors returned by distributor operations. Every error leaves state
/// exactly as it was before the call.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DistributorError {
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("{reason}")]
    InvalidProof { reason: EligibilityFailure },

    #[error("must wait for a day before claiming (ready at block {ready_at})")]
    CooldownActive { ready_at: BlockHeight },

    #[error("{kind}: requested {requested}, available {available}")]
    InsufficientContractBalance {
        kind: BalanceCheck,
        requested: Amount,
        available: Amount,
    },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("token host error: {0}")]
    Token(#[from] TokenError),
}

pub type DistributorResult<T> = Result<T, DistributorError>;

/// Outcome of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub claimant: Address,
    pub amount: Amount,
    /// Height recorded as the claimant's last claim.
    pub height: BlockHeight,
    /// First height at which the claimant may claim again.
    pub next_claim_at: BlockHeight,
}

/// State changes emitted by the distributor, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributorEvent {
    RewardClaimed {
        claimant: Address,
        amount: Amount,
        height: BlockHeight,
    },
    Withdrawn {
        owner: Address,
        amount: Amount,
    },
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
    RewardTokenUpdated {
        previous: Address,
        new: Address,
    },
    DistributionRateUpdated {
        previous: Amount,
        new: Amount,
    },
    ClaimCooldownUpdated {
        previous: u64,
        new: u64,
    },
    StakeRegistryUpdated {
        entries: usize,
    },
    MerkleRootRotated {
        #[serde(with = "got_merkle::hex_hash")]
        previous: Hash,
        #[serde(with = "got_merkle::hex_hash")]
        new: Hash,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_name_the_cause() {
        let err = DistributorError::InvalidProof {
            reason: EligibilityFailure::ProofMismatch,
        };
        assert_eq!(err.to_string(), "invalid proof");

        let err = DistributorError::InvalidProof {
            reason: EligibilityFailure::NoStakedAmount,
        };
        assert_eq!(err.to_string(), "no staked amount");

        let err = DistributorError::CooldownActive { ready_at: 13_900 };
        assert!(err.to_string().starts_with("must wait for a day before claiming"));
    }

    #[test]
    fn balance_messages_differ_per_outflow() {
        let claim = DistributorError::InsufficientContractBalance {
            kind: BalanceCheck::Claim,
            requested: 10,
            available: 5,
        };
        assert!(claim.to_string().starts_with("not enough tokens"));

        let withdraw = DistributorError::InsufficientContractBalance {
            kind: BalanceCheck::Withdraw,
            requested: 10,
            available: 5,
        };
        assert!(withdraw
            .to_string()
            .starts_with("insufficient tokens in contract"));
    }

    #[test]
    fn event_json_is_keyed_by_kind() {
        let event = DistributorEvent::RewardClaimed {
            claimant: Address([1u8; 32]),
            amount: 10,
            height: 5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with("{\"reward_claimed\":"));
    }
}
