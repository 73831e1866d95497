//! Position lifecycle orchestration: open and voluntary close.
//!
//! Each operation touches up to four records (position, account ledger,
//! commodity stats, settlement custody); the validate-then-mutate ordering
//! keeps the group atomic. The settlement transfer goes first because it is
//! the only mutation that can fail.

use super::core::Engine;
use super::results::{CloseResult, EngineError};
use crate::events::{EventPayload, PositionClosedEvent, PositionOpenedEvent};
use crate::margin::{position_value, required_margin};
use crate::settlement::SettlementBank;
use crate::types::{narrow_signed, AccountId, CommodityId, Direction, PositionId, Quantity, Tick};

impl<B: SettlementBank> Engine<B> {
    /// Open a leveraged position. Locks the required margin in custody and
    /// returns the new position id, allocated from a monotonic counter that
    /// is never reused.
    pub fn open_position(
        &mut self,
        account: AccountId,
        commodity_id: CommodityId,
        direction: Direction,
        quantity: Quantity,
        expiry: Tick,
    ) -> Result<PositionId, EngineError> {
        self.ensure_market_open()?;
        let commodity = self
            .commodities
            .get_active(commodity_id)
            .map_err(|_| EngineError::InvalidCommodity(commodity_id))?;
        if quantity.is_zero() {
            return Err(EngineError::InvalidAmount("quantity must be positive"));
        }
        if expiry <= self.current_tick {
            return Err(EngineError::InvalidAmount("expiry must be in the future"));
        }
        self.ensure_oracle_fresh(commodity_id)?;

        let entry_price = commodity.price;
        let margin = required_margin(commodity, quantity)
            .map_err(|_| EngineError::MarginInsufficient(commodity_id))?;

        // locked-margin overflow precheck keeps the post-transfer mutations
        // infallible
        let entry = self
            .ledgers
            .get(account, commodity_id)
            .copied()
            .unwrap_or_default();
        entry.margin_locked.checked_add(margin)?;

        self.bank.transfer_in(account, margin)?;

        let position_id = self.positions.create(
            account,
            commodity_id,
            direction,
            quantity,
            entry_price,
            margin,
            self.current_tick,
            expiry,
        );
        self.ledgers.record_open(account, commodity_id, margin);
        self.stats.record_open(commodity_id, direction, quantity);

        tracing::info!(
            position = position_id.0,
            account = account.0,
            commodity = commodity_id.0,
            %direction,
            quantity = quantity.value(),
            margin = margin.value(),
            "position opened"
        );
        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            position_id,
            owner: account,
            commodity_id,
            direction,
            quantity,
            entry_price,
            margin,
            expiry,
        }));

        Ok(position_id)
    }

    /// Close an open position at the current price. The owner receives the
    /// deposited margin plus PnL, floored at zero: the margin is the owner's
    /// maximum loss.
    pub fn close_position(
        &mut self,
        position_id: PositionId,
        caller: AccountId,
    ) -> Result<CloseResult, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?;
        if position.owner != caller {
            return Err(EngineError::Unauthorized(caller));
        }
        if position.is_terminal() {
            return Err(EngineError::AlreadyTerminal(position_id));
        }
        self.ensure_market_open()?;

        let owner = position.owner;
        let commodity_id = position.commodity_id;
        let direction = position.direction;
        let quantity = position.quantity;
        let entry_price = position.entry_price;
        let margin = position.margin_deposited;

        let commodity = self
            .commodities
            .get(commodity_id)
            .ok_or(EngineError::InvalidCommodity(commodity_id))?;
        self.ensure_oracle_fresh(commodity_id)?;

        let exit_price = commodity.price;
        let pnl = position_value(direction, quantity, entry_price, exit_price)
            .map_err(EngineError::InvalidState)?;
        let settlement = narrow_signed((margin.as_signed() + pnl).max(0))?;

        if !settlement.is_zero() {
            self.bank.transfer_out(owner, settlement)?;
        }

        self.positions
            .get_mut(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?
            .settle(exit_price, pnl);
        self.ledgers.record_settle(owner, commodity_id, margin, pnl);
        self.stats.record_settle(commodity_id, direction, quantity);

        tracing::info!(
            position = position_id.0,
            account = owner.0,
            pnl,
            settlement = settlement.value(),
            "position closed"
        );
        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            position_id,
            owner,
            commodity_id,
            exit_price,
            pnl,
            settlement,
        }));

        Ok(CloseResult {
            position_id,
            settlement,
            pnl,
            exit_price,
        })
    }
}
