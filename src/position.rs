//! Position records and their terminal lifecycle.
//!
//! A position is created open, then settled exactly once by a voluntary close
//! or a forced liquidation. Both set the same `liquidated` flag; which
//! operation set it is recorded only in the event log. Once terminal, the
//! record is immutable: quantity, entry price, and direction never change
//! after creation, and the flag never flips back.

use crate::types::{AccountId, Amount, CommodityId, Direction, PositionId, Price, Quantity, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub commodity_id: CommodityId,
    pub direction: Direction,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub margin_deposited: Amount,
    pub created_at: Tick,
    pub expiry: Tick,
    /// Entry price at open; the exit price once terminal.
    pub current_price: Price,
    /// Zero at open; the final signed PnL once terminal.
    pub unrealized_pnl: i128,
    /// Terminal flag shared by close and liquidate. Never unset.
    pub liquidated: bool,
}

impl Position {
    pub fn open(
        id: PositionId,
        owner: AccountId,
        commodity_id: CommodityId,
        direction: Direction,
        quantity: Quantity,
        entry_price: Price,
        margin_deposited: Amount,
        created_at: Tick,
        expiry: Tick,
    ) -> Self {
        Self {
            id,
            owner,
            commodity_id,
            direction,
            quantity,
            entry_price,
            margin_deposited,
            created_at,
            expiry,
            current_price: entry_price,
            unrealized_pnl: 0,
            liquidated: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.liquidated
    }

    /// Settle the position at `exit_price` with final `pnl`. Idempotence is
    /// the caller's contract; a second settlement is rejected upstream.
    pub(crate) fn settle(&mut self, exit_price: Price, pnl: i128) {
        debug_assert!(!self.liquidated, "position settled twice");
        self.current_price = exit_price;
        self.unrealized_pnl = pnl;
        self.liquidated = true;
    }
}

/// All positions ever opened, keyed by a monotonic id that is never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: HashMap<PositionId, Position>,
    next_id: u64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        self.positions.get_mut(&id)
    }

    /// Allocate the next id and insert a freshly opened position.
    pub(crate) fn create(
        &mut self,
        owner: AccountId,
        commodity_id: CommodityId,
        direction: Direction,
        quantity: Quantity,
        entry_price: Price,
        margin_deposited: Amount,
        created_at: Tick,
        expiry: Tick,
    ) -> PositionId {
        let id = PositionId(self.next_id);
        self.next_id += 1;
        self.positions.insert(
            id,
            Position::open(
                id,
                owner,
                commodity_id,
                direction,
                quantity,
                entry_price,
                margin_deposited,
                created_at,
                expiry,
            ),
        );
        id
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Open (non-terminal) positions held by `owner` in `commodity_id`.
    pub fn open_for(
        &self,
        owner: AccountId,
        commodity_id: CommodityId,
    ) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(move |p| {
            p.owner == owner && p.commodity_id == commodity_id && !p.is_terminal()
        })
    }
}
