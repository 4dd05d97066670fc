use serde::{Deserialize, Serialize};

use got_distributor::{BlockClock, Distributor, DistributorState};
use got_storage::{StateStore, StorageKey};
use got_token::TokenRegistry;

use crate::types::*;

/// Store key the chain snapshot lives under.
pub const SNAPSHOT_KEY: &str = "chain";

/// Everything a process needs to resume a deployment: token balances,
/// distributor state and the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub tokens: TokenRegistry,
    pub distributor: DistributorState,
    pub clock: ClockSpec,
}

impl ChainSnapshot {
    pub fn capture<C: BlockClock>(distributor: &Distributor<TokenRegistry, C>, clock: ClockSpec) -> Self {
        Self {
            tokens: distributor.host().clone(),
            distributor: distributor.state(),
            clock,
        }
    }

    /// Refresh tokens and distributor state after a mutation.
    pub fn record<C: BlockClock>(&mut self, distributor: &Distributor<TokenRegistry, C>) {
        self.tokens = distributor.host().clone();
        self.distributor = distributor.state();
    }

    /// Rebuild a live distributor over a copy of the stored state.
    pub fn restore(&self) -> Result<Distributor<TokenRegistry, Box<dyn BlockClock>>, DeployError> {
        Ok(Distributor::from_state(
            self.distributor.clone(),
            self.tokens.clone(),
            self.clock.build(),
        )?)
    }

    pub fn current_height(&self) -> u64 {
        self.clock.build().current_height()
    }

    /// Move a manual clock forward. Wall clocks cannot be advanced.
    pub fn advance(&mut self, blocks: u64) -> Result<u64, DeployError> {
        match &mut self.clock {
            ClockSpec::Manual { height } => {
                *height = height.saturating_add(blocks);
                tracing::debug!(height = *height, blocks, "chain advanced");
                Ok(*height)
            }
            ClockSpec::Wall { .. } => Err(DeployError::InvalidConfig(
                "wall clock cannot be advanced manually".into(),
            )),
        }
    }

    pub fn save(&self, store: &StateStore) -> Result<(), DeployError> {
        store.save(SNAPSHOT_KEY, self)?;
        Ok(())
    }

    pub fn load(store: &StateStore) -> Result<Self, DeployError> {
        store
            .load(SNAPSHOT_KEY)?
            .ok_or_else(|| DeployError::NotDeployed(store.base_dir().display().to_string()))
    }

    pub fn exists(store: &StateStore) -> bool {
        store.contains(&StorageKey::from(SNAPSHOT_KEY))
    }

    /// Delete the stored snapshot. Returns whether one was present.
    pub fn discard(store: &StateStore) -> Result<bool, DeployError> {
        let removed = store.remove(&StorageKey::from(SNAPSHOT_KEY))?.is_some();
        if removed {
            tracing::info!(dir = %store.base_dir().display(), "chain snapshot discarded");
        }
        Ok(removed)
    }
}
