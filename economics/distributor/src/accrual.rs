use serde::{Deserialize, Serialize};

use crate::types::*;

/// Fixed-point scale for stake weights: one whole 18-decimal token.
pub const WEIGHT_SCALE: Amount = 1_000_000_000_000_000_000;

/// How the distribution rate turns into a per-claim amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualPolicy {
    /// Every eligible address receives `rate` per period.
    #[default]
    Flat,
    /// `rate` is paid per `weight_scale` staked units.
    StakeWeighted { weight_scale: Amount },
}

impl AccrualPolicy {
    /// Stake-weighted policy at [`WEIGHT_SCALE`].
    pub fn stake_weighted() -> Self {
        AccrualPolicy::StakeWeighted {
            weight_scale: WEIGHT_SCALE,
        }
    }

    pub fn is_stake_weighted(&self) -> bool {
        matches!(self, AccrualPolicy::StakeWeighted { .. })
    }

    pub fn validate(&self) -> DistributorResult<()> {
        if let AccrualPolicy::StakeWeighted { weight_scale: 0 } = self {
            return Err(DistributorError::InvalidParameters(
                "weight scale must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Whole cooldown periods contained in `elapsed`. A zero cooldown counts as
/// no periods.
pub fn periods_elapsed(elapsed: u64, cooldown: u64) -> u64 {
    elapsed.checked_div(cooldown).unwrap_or(0)
}

/// Amount owed for one claim. At most one period is paid regardless of how
/// long the claimant waited.
pub fn amount_due(
    policy: &AccrualPolicy,
    weight: Amount,
    elapsed: u64,
    cooldown: u64,
    rate: Amount,
) -> DistributorResult<Amount> {
    let effective = Amount::from(periods_elapsed(elapsed, cooldown).min(1));
    let base = effective
        .checked_mul(rate)
        .ok_or(DistributorError::ArithmeticOverflow)?;

    match policy {
        AccrualPolicy::Flat => Ok(base),
        AccrualPolicy::StakeWeighted { weight_scale } => {
            if *weight_scale == 0 {
                return Err(DistributorError::InvalidParameters(
                    "weight scale must be non-zero".into(),
                ));
            }
            let scaled = base
                .checked_mul(weight)
                .ok_or(DistributorError::ArithmeticOverflow)?;
            Ok(scaled / weight_scale)
        }
    }
}
