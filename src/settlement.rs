//! Settlement currency boundary.
//!
//! The engine never moves real money; it calls through this seam. A transfer
//! is atomic with the operation that requested it: the facade performs it
//! before any ledger mutation, so a failed transfer aborts the whole
//! operation with no partial state. `InMemorySettlement` is the reference
//! implementation used by the sim and tests; production embeds the engine
//! against whatever transfer rail the host provides.

use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Abstract settlement currency rail. `transfer_in` moves funds from an
/// account into engine custody; `transfer_out` pays custody funds out.
pub trait SettlementBank {
    fn transfer_in(&mut self, from: AccountId, amount: Amount) -> Result<(), SettlementError>;
    fn transfer_out(&mut self, to: AccountId, amount: Amount) -> Result<(), SettlementError>;
    /// Funds currently held by the engine.
    fn custody_balance(&self) -> Amount;
}

/// Mocked rail: just balance changes, no real transfers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemorySettlement {
    accounts: HashMap<AccountId, Amount>,
    custody: Amount,
}

impl InMemorySettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an external account. This is the deposit faucet for sims and
    /// tests; a real rail funds accounts out of band.
    pub fn credit_account(&mut self, account: AccountId, amount: Amount) {
        let balance = self.accounts.entry(account).or_insert(Amount::ZERO);
        *balance = Amount(balance.value() + amount.value());
    }

    /// Seed engine custody directly. Lets tests pay out profits that exceed
    /// collected margin, the way a funded treasury would.
    pub fn fund_custody(&mut self, amount: Amount) {
        self.custody = Amount(self.custody.value() + amount.value());
    }

    pub fn account_balance(&self, account: AccountId) -> Amount {
        self.accounts.get(&account).copied().unwrap_or(Amount::ZERO)
    }
}

impl SettlementBank for InMemorySettlement {
    fn transfer_in(&mut self, from: AccountId, amount: Amount) -> Result<(), SettlementError> {
        let balance = self.accounts.get(&from).copied().unwrap_or(Amount::ZERO);
        if balance < amount {
            return Err(SettlementError::InsufficientFunds {
                account: from,
                requested: amount,
                available: balance,
            });
        }
        self.accounts.insert(from, Amount(balance.value() - amount.value()));
        self.custody = Amount(self.custody.value() + amount.value());
        Ok(())
    }

    fn transfer_out(&mut self, to: AccountId, amount: Amount) -> Result<(), SettlementError> {
        if self.custody < amount {
            return Err(SettlementError::CustodyShortfall {
                requested: amount,
                available: self.custody,
            });
        }
        self.custody = Amount(self.custody.value() - amount.value());
        let balance = self.accounts.entry(to).or_insert(Amount::ZERO);
        *balance = Amount(balance.value() + amount.value());
        Ok(())
    }

    fn custody_balance(&self) -> Amount {
        self.custody
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SettlementError {
    #[error(
        "account {account:?} has insufficient funds: requested {requested}, available {available}"
    )]
    InsufficientFunds {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("engine custody shortfall: requested {requested}, available {available}")]
    CustodyShortfall { requested: Amount, available: Amount },
}
