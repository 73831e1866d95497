//! Per account-and-commodity accounting mirror.
//!
//! Tracks what one account holds and owes for one commodity: a token balance
//! mirror, the count of open positions, cumulative realized PnL, and the
//! margin currently locked. `margin_locked` must equal the sum of
//! `margin_deposited` over that account's open positions at all times; every
//! close and liquidate restores it exactly.

use crate::types::{AccountId, Amount, CommodityId, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountCommodityLedger {
    /// Mirror of the token ledger balance, maintained on buy/sell.
    pub token_balance: Quantity,
    pub open_position_count: u32,
    /// Signed, cumulative over all settled positions.
    pub realized_pnl: i128,
    /// Sum of margin deposited across this account's open positions.
    pub margin_locked: Amount,
}

/// Store of all per-(account, commodity) records. Entries materialize on
/// first touch and persist at zero thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountLedgerStore {
    entries: HashMap<(AccountId, CommodityId), AccountCommodityLedger>,
}

impl AccountLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        account: AccountId,
        commodity_id: CommodityId,
    ) -> Option<&AccountCommodityLedger> {
        self.entries.get(&(account, commodity_id))
    }

    pub(crate) fn entry(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
    ) -> &mut AccountCommodityLedger {
        self.entries.entry((account, commodity_id)).or_default()
    }

    /// Record an opened position: one more open slot, margin locked.
    pub(crate) fn record_open(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        margin: Amount,
    ) {
        let entry = self.entry(account, commodity_id);
        entry.open_position_count += 1;
        entry.margin_locked = Amount(entry.margin_locked.value() + margin.value());
    }

    /// Record a settled position (close or liquidate): releases the exact
    /// margin that `record_open` locked and folds the final pnl in.
    pub(crate) fn record_settle(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        margin: Amount,
        pnl: i128,
    ) {
        let entry = self.entry(account, commodity_id);
        debug_assert!(entry.open_position_count > 0, "settle without open");
        debug_assert!(entry.margin_locked >= margin, "margin under-locked");
        entry.open_position_count -= 1;
        entry.margin_locked = Amount(entry.margin_locked.value() - margin.value());
        entry.realized_pnl += pnl;
    }

    pub(crate) fn set_token_balance(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        balance: Quantity,
    ) {
        self.entry(account, commodity_id).token_balance = balance;
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&(AccountId, CommodityId), &AccountCommodityLedger)> {
        self.entries.iter()
    }
}
