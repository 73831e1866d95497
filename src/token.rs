//! Synthetic exposure token ledger.
//!
//! Balances are unsigned, keyed by account and commodity. Mint and burn are
//! only ever called by the trading facade paired with the economic operation
//! that justifies them. Per-commodity minted/burned counters make the
//! conservation invariant (sum of balances == minted - burned) checkable
//! without a full scan.

use crate::types::{AccountId, ArithmeticError, CommodityId, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Running mint/burn totals for one commodity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SupplyCounters {
    pub total_minted: u128,
    pub total_burned: u128,
}

impl SupplyCounters {
    pub fn outstanding(&self) -> u128 {
        self.total_minted - self.total_burned
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: HashMap<(AccountId, CommodityId), u64>,
    supply: HashMap<CommodityId, SupplyCounters>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: AccountId, commodity_id: CommodityId) -> Quantity {
        Quantity(
            self.balances
                .get(&(account, commodity_id))
                .copied()
                .unwrap_or(0),
        )
    }

    pub fn supply(&self, commodity_id: CommodityId) -> SupplyCounters {
        self.supply.get(&commodity_id).copied().unwrap_or_default()
    }

    pub fn mint(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        amount: Quantity,
    ) -> Result<(), TokenError> {
        let balance = self.balances.entry((account, commodity_id)).or_insert(0);
        *balance = balance
            .checked_add(amount.value())
            .ok_or(TokenError::Arithmetic(ArithmeticError::Overflow))?;
        let supply = self.supply.entry(commodity_id).or_default();
        supply.total_minted += u128::from(amount.value());
        Ok(())
    }

    pub fn burn(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        amount: Quantity,
    ) -> Result<(), TokenError> {
        let available = self.balance(account, commodity_id);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account,
                commodity_id,
                requested: amount,
                available,
            });
        }
        if let Some(balance) = self.balances.get_mut(&(account, commodity_id)) {
            *balance -= amount.value();
        }
        let supply = self.supply.entry(commodity_id).or_default();
        supply.total_burned += u128::from(amount.value());
        Ok(())
    }

    /// Move exposure between holders without touching supply.
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        commodity_id: CommodityId,
        amount: Quantity,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance(from, commodity_id);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                commodity_id,
                requested: amount,
                available: from_balance,
            });
        }
        let to_balance = self.balance(to, commodity_id);
        to_balance
            .value()
            .checked_add(amount.value())
            .ok_or(TokenError::Arithmetic(ArithmeticError::Overflow))?;

        // subtract then add: a self-transfer nets out to a no-op
        if let Some(balance) = self.balances.get_mut(&(from, commodity_id)) {
            *balance -= amount.value();
        }
        *self.balances.entry((to, commodity_id)).or_insert(0) += amount.value();
        Ok(())
    }

    /// Sum of all balances for a commodity. O(n); used by tests and audits,
    /// the engine itself relies on the supply counters.
    pub fn total_balance(&self, commodity_id: CommodityId) -> u128 {
        self.balances
            .iter()
            .filter(|((_, c), _)| *c == commodity_id)
            .map(|(_, b)| u128::from(*b))
            .sum()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error(
        "insufficient token balance for {account:?}/{commodity_id:?}: requested {requested}, available {available}"
    )]
    InsufficientBalance {
        account: AccountId,
        commodity_id: CommodityId,
        requested: Quantity,
        available: Quantity,
    },

    #[error("token arithmetic failed: {0}")]
    Arithmetic(#[from] ArithmeticError),
}
