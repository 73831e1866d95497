//! Forced liquidation of undercollateralized positions.
//!
//! Permissionless: any account may trigger it, which is the protocol's
//! safety valve against positions whose losses approach their margin. Risk
//! is recomputed at call time from the current price; a stale assessment is
//! never trusted. The deposited margin is retained by the engine and
//! tracked in the insurance reserve; the owner receives nothing.

use super::core::Engine;
use super::results::{EngineError, LiquidationOutcome};
use crate::events::{EventPayload, PositionLiquidatedEvent};
use crate::margin::{liquidation_risk, position_value};
use crate::settlement::SettlementBank;
use crate::types::{AccountId, PositionId};

impl<B: SettlementBank> Engine<B> {
    pub fn liquidate_position(
        &mut self,
        position_id: PositionId,
        caller: AccountId,
    ) -> Result<LiquidationOutcome, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?;
        if position.is_terminal() {
            return Err(EngineError::AlreadyTerminal(position_id));
        }

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

        let mark_price = commodity.price;
        let pnl = position_value(direction, quantity, entry_price, mark_price)
            .map_err(EngineError::InvalidState)?;
        let at_risk = liquidation_risk(pnl, margin, self.config.liquidation_threshold_bps)
            .map_err(EngineError::InvalidState)?;
        if !at_risk {
            return Err(EngineError::NotLiquidatable(position_id));
        }

        let reserve = self.insurance_reserve.checked_add(margin)?;

        // no payout path: the margin stays in custody
        self.insurance_reserve = reserve;
        self.positions
            .get_mut(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?
            .settle(mark_price, pnl);
        self.ledgers.record_settle(owner, commodity_id, margin, pnl);
        self.stats.record_settle(commodity_id, direction, quantity);

        tracing::info!(
            position = position_id.0,
            owner = owner.0,
            liquidator = caller.0,
            pnl,
            retained = margin.value(),
            "position liquidated"
        );
        self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
            position_id,
            owner,
            commodity_id,
            liquidator: caller,
            mark_price,
            pnl,
            margin_retained: margin,
        }));

        Ok(LiquidationOutcome {
            position_id,
            liquidator: caller,
            mark_price,
            pnl,
            margin_retained: margin,
        })
    }
}
