use serde::{Deserialize, Serialize};

use crate::types::{Address, DistributorError, DistributorResult};

/// Single-owner authorization gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
}

impl AccessControl {
    /// Fails with `InvalidParameters` for the zero address.
    pub fn new(owner: Address) -> DistributorResult<Self> {
        if owner.is_zero() {
            return Err(DistributorError::InvalidParameters(
                "owner must not be the zero address".into(),
            ));
        }
        Ok(Self { owner })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        &self.owner == caller
    }

    pub fn ensure_owner(&self, caller: &Address) -> DistributorResult<()> {
        if !self.is_owner(caller) {
            return Err(DistributorError::NotOwner { caller: *caller });
        }
        Ok(())
    }

    /// Hand ownership to `new_owner` immediately. Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> DistributorResult<Address> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(DistributorError::InvalidParameters(
                "new owner must not be the zero address".into(),
            ));
        }
        let previous = std::mem::replace(&mut self.owner, new_owner);
        Ok(previous)
    }
}
