use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Claim state of one address, evaluated against a height and cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    NeverClaimed,
    Cooling {
        last_claim: BlockHeight,
        ready_at: BlockHeight,
    },
    Ready {
        last_claim: BlockHeight,
    },
}

impl ClaimStatus {
    pub fn is_claimable(&self) -> bool {
        !matches!(self, ClaimStatus::Cooling { .. })
    }
}

/// Per-address height of the last successful claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLedger {
    last_claims: BTreeMap<Address, BlockHeight>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_claim(&self, account: &Address) -> Option<BlockHeight> {
        self.last_claims.get(account).copied()
    }

    pub fn len(&self) -> usize {
        self.last_claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_claims.is_empty()
    }

    pub fn status(&self, account: &Address, now: BlockHeight, cooldown: u64) -> ClaimStatus {
        match self.last_claim(account) {
            None => ClaimStatus::NeverClaimed,
            Some(last_claim) => {
                let ready_at = last_claim.saturating_add(cooldown);
                if now >= ready_at {
                    ClaimStatus::Ready { last_claim }
                } else {
                    ClaimStatus::Cooling {
                        last_claim,
                        ready_at,
                    }
                }
            }
        }
    }

    /// Fail with `CooldownActive` while cooling; otherwise return the elapsed
    /// blocks to accrue over. A first claim counts as exactly one cooldown.
    pub fn ensure_ready(
        &self,
        account: &Address,
        now: BlockHeight,
        cooldown: u64,
    ) -> DistributorResult<u64> {
        match self.status(account, now, cooldown) {
            ClaimStatus::NeverClaimed => Ok(cooldown),
            ClaimStatus::Cooling { ready_at, .. } => {
                Err(DistributorError::CooldownActive { ready_at })
            }
            ClaimStatus::Ready { last_claim } => Ok(now - last_claim),
        }
    }

    /// Record a claim at `height`, returning the previous record so a failed
    /// payout can restore it. Heights never move backwards.
    pub fn record(&mut self, account: Address, height: BlockHeight) -> Option<BlockHeight> {
        let previous = self.last_claim(&account);
        let height = previous.map_or(height, |p| p.max(height));
        self.last_claims.insert(account, height);
        previous
    }

    /// Undo a [`record`](Self::record).
    pub fn restore(&mut self, account: Address, previous: Option<BlockHeight>) {
        match previous {
            Some(height) => {
                self.last_claims.insert(account, height);
            }
            None => {
                self.last_claims.remove(&account);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &BlockHeight)> {
        self.last_claims.iter()
    }
}
