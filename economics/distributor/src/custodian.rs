use got_token::TokenHost;

use crate::access::AccessControl;
use crate::types::*;

/// Holds the distributor's reward-token balance at `vault` and moves it out.
#[derive(Debug, Clone)]
pub struct TokenCustodian<H> {
    host: H,
    vault: Address,
    token: Address,
}

impl<H: TokenHost> TokenCustodian<H> {
    /// Fails with `InvalidParameters` when `token` is unknown to the host.
    pub fn new(host: H, vault: Address, token: Address) -> DistributorResult<Self> {
        if vault.is_zero() {
            return Err(DistributorError::InvalidParameters(
                "distributor address must not be zero".into(),
            ));
        }
        ensure_known_token(&host, &token)?;
        Ok(Self { host, vault, token })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn token(&self) -> Address {
        self.token
    }

    /// Reward-token balance held at the vault.
    pub fn balance(&self) -> DistributorResult<Amount> {
        Ok(self.host.balance_of(&self.token, &self.vault)?)
    }

    /// Fail with `InsufficientContractBalance` if the vault holds less than
    /// `amount`.
    pub fn ensure_covers(&self, kind: BalanceCheck, amount: Amount) -> DistributorResult<()> {
        let available = self.balance()?;
        if amount > available {
            return Err(DistributorError::InsufficientContractBalance {
                kind,
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Pay `amount` to `to`. Zero amounts skip the host transfer.
    pub fn payout(&mut self, to: &Address, amount: Amount) -> DistributorResult<()> {
        self.ensure_covers(BalanceCheck::Claim, amount)?;
        self.send(to, amount)
    }

    /// Move `amount` from the vault to the owner.
    pub fn withdraw(
        &mut self,
        access: &AccessControl,
        caller: &Address,
        amount: Amount,
    ) -> DistributorResult<Address> {
        access.ensure_owner(caller)?;
        self.ensure_covers(BalanceCheck::Withdraw, amount)?;
        let owner = access.owner();
        self.send(&owner, amount)?;
        Ok(owner)
    }

    /// Point the custodian at a different reward token. Returns the previous
    /// token.
    pub fn set_token(
        &mut self,
        access: &AccessControl,
        caller: &Address,
        token: Address,
    ) -> DistributorResult<Address> {
        access.ensure_owner(caller)?;
        ensure_known_token(&self.host, &token)?;
        Ok(std::mem::replace(&mut self.token, token))
    }

    fn send(&mut self, to: &Address, amount: Amount) -> DistributorResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.host.transfer(&self.token, &self.vault, to, amount)?;
        Ok(())
    }
}

fn ensure_known_token<H: TokenHost>(host: &H, token: &Address) -> DistributorResult<()> {
    if token.is_zero() || !host.contains_token(token) {
        return Err(DistributorError::InvalidParameters(format!(
            "unknown reward token {token}"
        )));
    }
    Ok(())
}
