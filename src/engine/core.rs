// engine/core.rs: the engine owns every store. no hidden statics; everything
// reachable from this struct, operations take &mut self. the host serializes
// operations at its transaction boundary; embedders sharing an engine across
// threads must wrap it in a mutex to keep operations atomic.

use super::results::EngineError;
use crate::commodity::{price_change_bps, CommodityParams, CommodityRegistry};
use crate::config::{validate_fee_rate, validate_liquidation_threshold, ConfigError, ProtocolConfig};
use crate::events::{
    CommodityListedEvent, Event, EventId, EventPayload, FeeRateChangedEvent, FeedRegisteredEvent,
    FundingRateChangedEvent, LiquidationThresholdChangedEvent, MarketStatusChangedEvent,
    PriceUpdatedEvent,
};
use crate::ledger::{AccountCommodityLedger, AccountLedgerStore};
use crate::margin;
use crate::oracle::{FeedStore, OracleError, OracleFeed};
use crate::position::{Position, PositionLedger};
use crate::settlement::{InMemorySettlement, SettlementBank};
use crate::stats::{CommodityStats, StatsStore};
use crate::token::TokenLedger;
use crate::types::{
    AccountId, Amount, Bps, CommodityId, PositionId, Price, Quantity, SignedBps, Tick,
};

/// The position and accounting engine. All state lives here.
#[derive(Debug)]
pub struct Engine<B = InMemorySettlement> {
    pub(super) config: ProtocolConfig,
    pub(super) owner: AccountId,
    pub(super) market_open: bool,
    pub(super) commodities: CommodityRegistry,
    pub(super) feeds: FeedStore,
    pub(super) tokens: TokenLedger,
    pub(super) positions: PositionLedger,
    pub(super) ledgers: AccountLedgerStore,
    pub(super) stats: StatsStore,
    pub(super) bank: B,
    /// Margin retained from liquidations. Never paid out by the core.
    pub(super) insurance_reserve: Amount,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_tick: Tick,
}

impl Engine<InMemorySettlement> {
    pub fn new(owner: AccountId, config: ProtocolConfig) -> Result<Self, ConfigError> {
        Self::with_bank(owner, config, InMemorySettlement::new())
    }
}

impl<B: SettlementBank> Engine<B> {
    pub fn with_bank(owner: AccountId, config: ProtocolConfig, bank: B) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            owner,
            market_open: true,
            commodities: CommodityRegistry::new(),
            feeds: FeedStore::new(),
            tokens: TokenLedger::new(),
            positions: PositionLedger::new(),
            ledgers: AccountLedgerStore::new(),
            stats: StatsStore::new(),
            bank,
            insurance_reserve: Amount::ZERO,
            events: Vec::new(),
            next_event_id: 1,
            current_tick: Tick(0),
        })
    }

    // ---- time ----

    pub fn set_tick(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    pub fn tick(&self) -> Tick {
        self.current_tick
    }

    pub fn advance_tick(&mut self, delta: u64) {
        self.current_tick = Tick(self.current_tick.value() + delta);
    }

    // ---- administration (owner-gated) ----

    pub fn list_commodity(
        &mut self,
        caller: AccountId,
        id: CommodityId,
        params: CommodityParams,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        let symbol = params.symbol.clone();
        let initial_price = params.initial_price;
        let margin_requirement_bps = params.margin_requirement_bps;
        self.commodities.insert(id, params, self.current_tick)?;
        tracing::info!(commodity = id.0, %symbol, "commodity listed");
        self.emit_event(EventPayload::CommodityListed(CommodityListedEvent {
            commodity_id: id,
            symbol,
            initial_price,
            margin_requirement_bps,
        }));
        Ok(())
    }

    /// Update the slow-changing parameters. Price state is oracle territory
    /// and stays untouched.
    pub fn update_commodity_params(
        &mut self,
        caller: AccountId,
        id: CommodityId,
        params: CommodityParams,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        params.validate()?;
        let commodity = self
            .commodities
            .get_mut(id)
            .ok_or(EngineError::InvalidCommodity(id))?;
        commodity.name = params.name;
        commodity.symbol = params.symbol;
        commodity.unit = params.unit;
        commodity.volatility_bps = params.volatility_bps;
        commodity.margin_requirement_bps = params.margin_requirement_bps;
        commodity.contract_size = params.contract_size;
        Ok(())
    }

    pub fn set_commodity_active(
        &mut self,
        caller: AccountId,
        id: CommodityId,
        active: bool,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        let commodity = self
            .commodities
            .get_mut(id)
            .ok_or(EngineError::InvalidCommodity(id))?;
        commodity.active = active;
        Ok(())
    }

    /// Register or replace the oracle reporter for a commodity.
    pub fn register_feed(
        &mut self,
        caller: AccountId,
        commodity_id: CommodityId,
        reporter: AccountId,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        let price = self
            .commodities
            .get(commodity_id)
            .ok_or(EngineError::InvalidCommodity(commodity_id))?
            .price;
        self.feeds
            .register(commodity_id, reporter, price, self.current_tick);
        self.emit_event(EventPayload::FeedRegistered(FeedRegisteredEvent {
            commodity_id,
            reporter,
        }));
        Ok(())
    }

    pub fn set_feed_active(
        &mut self,
        caller: AccountId,
        commodity_id: CommodityId,
        active: bool,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        let feed = self
            .feeds
            .get_mut(commodity_id)
            .ok_or(EngineError::Oracle(OracleError::FeedNotFound(commodity_id)))?;
        feed.active = active;
        Ok(())
    }

    pub fn set_market_open(&mut self, caller: AccountId, open: bool) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        self.market_open = open;
        tracing::info!(open, "market status changed");
        self.emit_event(EventPayload::MarketStatusChanged(MarketStatusChangedEvent {
            open,
        }));
        Ok(())
    }

    pub fn set_fee_rate(&mut self, caller: AccountId, rate: Bps) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        validate_fee_rate(rate)?;
        let old_rate = self.config.fee_rate_bps;
        self.config.fee_rate_bps = rate;
        self.emit_event(EventPayload::FeeRateChanged(FeeRateChangedEvent {
            old_rate,
            new_rate: rate,
        }));
        Ok(())
    }

    pub fn set_liquidation_threshold(
        &mut self,
        caller: AccountId,
        threshold: Bps,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        validate_liquidation_threshold(threshold)?;
        let old_threshold = self.config.liquidation_threshold_bps;
        self.config.liquidation_threshold_bps = threshold;
        self.emit_event(EventPayload::LiquidationThresholdChanged(
            LiquidationThresholdChangedEvent {
                old_threshold,
                new_threshold: threshold,
            },
        ));
        Ok(())
    }

    /// Stored for external consumers; the core never reads it back.
    pub fn set_funding_rate(
        &mut self,
        caller: AccountId,
        commodity_id: CommodityId,
        rate: SignedBps,
    ) -> Result<(), EngineError> {
        self.ensure_owner(caller)?;
        if self.commodities.get(commodity_id).is_none() {
            return Err(EngineError::InvalidCommodity(commodity_id));
        }
        self.stats.set_funding_rate(commodity_id, rate);
        self.emit_event(EventPayload::FundingRateChanged(FundingRateChangedEvent {
            commodity_id,
            rate,
        }));
        Ok(())
    }

    // ---- oracle push (reporter-gated) ----

    /// The only external write path into price data. Returns the prior price.
    pub fn record_price_update(
        &mut self,
        reporter: AccountId,
        commodity_id: CommodityId,
        price: Price,
        confidence_bps: Bps,
    ) -> Result<Price, EngineError> {
        let prior = self.feeds.record_update(
            commodity_id,
            reporter,
            price,
            confidence_bps,
            self.config.confidence_floor_bps,
            self.current_tick,
        )?;

        let change_bps = price_change_bps(prior, price);
        if let Some(commodity) = self.commodities.get_mut(commodity_id) {
            commodity.refresh_price(price, prior, self.current_tick);
        }

        tracing::debug!(
            commodity = commodity_id.0,
            old = prior.value(),
            new = price.value(),
            "price updated"
        );
        self.emit_event(EventPayload::PriceUpdated(PriceUpdatedEvent {
            commodity_id,
            reporter,
            old_price: prior,
            new_price: price,
            change_bps,
            confidence_bps,
        }));
        Ok(prior)
    }

    // ---- read/query surface (side-effect-free) ----

    pub fn commodity(&self, id: CommodityId) -> Option<&crate::commodity::Commodity> {
        self.commodities.get(id)
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn account_ledger(
        &self,
        account: AccountId,
        commodity_id: CommodityId,
    ) -> Option<&AccountCommodityLedger> {
        self.ledgers.get(account, commodity_id)
    }

    pub fn commodity_stats(&self, id: CommodityId) -> CommodityStats {
        self.stats.get(id)
    }

    pub fn oracle_feed(&self, id: CommodityId) -> Option<&OracleFeed> {
        self.feeds.get(id)
    }

    pub fn token_balance(&self, account: AccountId, commodity_id: CommodityId) -> Quantity {
        self.tokens.balance(account, commodity_id)
    }

    pub fn token_supply(&self, commodity_id: CommodityId) -> crate::token::SupplyCounters {
        self.tokens.supply(commodity_id)
    }

    pub fn is_market_open(&self) -> bool {
        self.market_open
    }

    pub fn fee_rate(&self) -> Bps {
        self.config.fee_rate_bps
    }

    pub fn liquidation_threshold(&self) -> Bps {
        self.config.liquidation_threshold_bps
    }

    pub fn insurance_reserve(&self) -> Amount {
        self.insurance_reserve
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    pub fn ledgers_iter(
        &self,
    ) -> impl Iterator<Item = (&(AccountId, CommodityId), &AccountCommodityLedger)> {
        self.ledgers.iter()
    }

    /// Margin the engine would require right now to open `quantity`.
    pub fn margin_requirement(
        &self,
        commodity_id: CommodityId,
        quantity: Quantity,
    ) -> Result<Amount, EngineError> {
        let commodity = self
            .commodities
            .get(commodity_id)
            .ok_or(EngineError::InvalidCommodity(commodity_id))?;
        margin::required_margin(commodity, quantity)
            .map_err(|_| EngineError::MarginInsufficient(commodity_id))
    }

    /// Mark-to-market PnL of a position at the current registry price.
    pub fn position_value(&self, position_id: PositionId) -> Result<i128, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?;
        let commodity = self
            .commodities
            .get(position.commodity_id)
            .ok_or(EngineError::InvalidCommodity(position.commodity_id))?;
        margin::position_value(
            position.direction,
            position.quantity,
            position.entry_price,
            commodity.price,
        )
        .map_err(EngineError::InvalidState)
    }

    /// Whether a position currently meets the liquidation threshold.
    pub fn is_liquidatable(&self, position_id: PositionId) -> Result<bool, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?;
        if position.is_terminal() {
            return Ok(false);
        }
        let pnl = self.position_value(position_id)?;
        margin::liquidation_risk(
            pnl,
            position.margin_deposited,
            self.config.liquidation_threshold_bps,
        )
        .map_err(EngineError::InvalidState)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    // ---- shared precondition helpers ----

    pub(super) fn ensure_owner(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.owner {
            return Err(EngineError::Unauthorized(caller));
        }
        Ok(())
    }

    pub(super) fn ensure_market_open(&self) -> Result<(), EngineError> {
        if !self.market_open {
            return Err(EngineError::MarketClosed);
        }
        Ok(())
    }

    pub(super) fn ensure_oracle_fresh(&self, commodity_id: CommodityId) -> Result<(), EngineError> {
        if !self.feeds.is_fresh(
            commodity_id,
            self.current_tick,
            self.config.oracle_validity_window,
            self.config.confidence_floor_bps,
        ) {
            return Err(EngineError::OracleStale(commodity_id));
        }
        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_tick, payload);
        self.next_event_id += 1;
        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        for (&(account, commodity_id), entry) in self.ledgers.iter() {
            let locked: u128 = self
                .positions
                .open_for(account, commodity_id)
                .map(|p| u128::from(p.margin_deposited.value()))
                .sum();
            assert_eq!(
                locked,
                u128::from(entry.margin_locked.value()),
                "margin_locked out of sync for {account:?}/{commodity_id:?}"
            );
        }
        for id in self.commodities.ids() {
            let stats = self.stats.get(id);
            assert_eq!(
                stats.open_interest,
                stats.total_long_positions + stats.total_short_positions,
                "open interest identity broken for {id:?}"
            );
            let supply = self.tokens.supply(id);
            assert_eq!(
                self.tokens.total_balance(id),
                supply.outstanding(),
                "token conservation broken for {id:?}"
            );
        }
    }
}
