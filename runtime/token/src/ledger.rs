use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accounts::TokenAccount;
use crate::types::{Address, Amount, TokenError, TokenMetadata};

/// Balances of a single fungible token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenLedger {
    metadata: TokenMetadata,
    accounts: BTreeMap<Address, TokenAccount>,
    total_supply: Amount,
}

impl TokenLedger {
    /// Create a token with `initial_supply` minted to `holder`.
    pub fn new(
        metadata: TokenMetadata,
        initial_supply: Amount,
        holder: Address,
    ) -> Result<Self, TokenError> {
        let mut ledger = Self {
            metadata,
            accounts: BTreeMap::new(),
            total_supply: 0,
        };
        if initial_supply > 0 {
            ledger.mint(holder, initial_supply)?;
        }
        Ok(ledger)
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Number of holders with a recorded account.
    pub fn holder_count(&self) -> usize {
        self.accounts.len()
    }

    /// Balance of `holder`; unknown holders have zero.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.accounts.get(holder).map(|a| a.balance).unwrap_or(0)
    }

    /// Create new supply for `to`.
    pub fn mint(&mut self, to: Address, amount: Amount) -> Result<(), TokenError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.accounts.entry(to).or_default().credit(amount)?;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Either the full amount moves or
    /// nothing changes.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        // Check the credit side before mutating anything.
        let receiver_balance = self.balance_of(to);
        receiver_balance
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;

        if let Some(sender) = self.accounts.get_mut(from) {
            sender.debit(amount)?;
        }
        self.accounts.entry(*to).or_default().credit(amount)?;

        tracing::trace!(
            token = %self.metadata.symbol,
            %from,
            %to,
            amount,
            "token transfer"
        );
        Ok(())
    }
}
