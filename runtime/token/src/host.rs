use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::TokenLedger;
use crate::types::{Address, Amount, TokenError, TokenMetadata};

/// The token surface a distributor relies on: existence, balance query and
/// all-or-nothing transfer.
pub trait TokenHost {
    /// Whether a token contract is deployed at `token`.
    fn contains_token(&self, token: &Address) -> bool;

    /// Balance of `holder` in `token`.
    fn balance_of(&self, token: &Address, holder: &Address) -> Result<Amount, TokenError>;

    /// Transfer `amount` of `token` from `from` to `to`.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

/// All token contracts known to the simulated host ledger, keyed by address.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRegistry {
    tokens: BTreeMap<Address, TokenLedger>,
    /// Deployment counter feeding address derivation.
    deployments: u64,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new token, minting `initial_supply` to `deployer`, and return
    /// its address.
    pub fn deploy(
        &mut self,
        metadata: TokenMetadata,
        initial_supply: Amount,
        deployer: Address,
    ) -> Result<Address, TokenError> {
        let address = Self::derive_address(&deployer, self.deployments);
        if self.tokens.contains_key(&address) {
            return Err(TokenError::AlreadyDeployed(address));
        }
        let ledger = TokenLedger::new(metadata, initial_supply, deployer)?;

        tracing::info!(
            token = %address,
            symbol = %ledger.metadata().symbol,
            initial_supply,
            %deployer,
            "token deployed"
        );

        self.tokens.insert(address, ledger);
        self.deployments += 1;
        Ok(address)
    }

    pub fn get(&self, token: &Address) -> Option<&TokenLedger> {
        self.tokens.get(token)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn ledger(&self, token: &Address) -> Result<&TokenLedger, TokenError> {
        self.tokens.get(token).ok_or(TokenError::UnknownToken(*token))
    }

    fn ledger_mut(&mut self, token: &Address) -> Result<&mut TokenLedger, TokenError> {
        self.tokens
            .get_mut(token)
            .ok_or(TokenError::UnknownToken(*token))
    }

    /// SHA-256 of the deployer and its deployment counter.
    fn derive_address(deployer: &Address, nonce: u64) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(b"got-token");
        hasher.update(deployer.as_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Address(bytes)
    }
}

impl TokenHost for TokenRegistry {
    fn contains_token(&self, token: &Address) -> bool {
        self.tokens.contains_key(token)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> Result<Amount, TokenError> {
        Ok(self.ledger(token)?.balance_of(holder))
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger_mut(token)?.transfer(from, to, amount)
    }
}

/// A registry shared between a distributor and outside observers (funders,
/// tests, the CLI). Access is serialized through a read/write lock.
#[derive(Debug, Clone, Default)]
pub struct SharedTokenHost {
    inner: Arc<RwLock<TokenRegistry>>,
}

impl SharedTokenHost {
    pub fn new(registry: TokenRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TokenRegistry> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TokenRegistry> {
        self.inner.write()
    }

    /// Clone of the current registry contents, for persistence.
    pub fn snapshot(&self) -> TokenRegistry {
        self.inner.read().clone()
    }
}

impl TokenHost for SharedTokenHost {
    fn contains_token(&self, token: &Address) -> bool {
        self.inner.read().contains_token(token)
    }

    fn balance_of(&self, token: &Address, holder: &Address) -> Result<Amount, TokenError> {
        self.inner.read().balance_of(token, holder)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.inner.write().transfer(token, from, to, amount)
    }
}
