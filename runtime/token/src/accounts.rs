use serde::{Deserialize, Serialize};

use crate::types::{Amount, TokenError};

/// Per-holder token balance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenAccount {
    pub balance: Amount,
}

impl TokenAccount {
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    /// Subtract `amount` from balance. Fails if insufficient.
    pub fn debit(&mut self, amount: Amount) -> Result<(), TokenError> {
        if self.balance < amount {
            return Err(TokenError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to balance. Fails on overflow.
    pub fn credit(&mut self, amount: Amount) -> Result<(), TokenError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        Ok(())
    }
}
