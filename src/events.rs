// every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists
// all event types. which of close/liquidate terminated a position is recorded
// here and nowhere else.

use crate::types::{
    AccountId, Amount, Bps, CommodityId, Direction, PositionId, Price, Quantity, SignedBps, Tick,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub tick: Tick,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, tick: Tick, payload: EventPayload) -> Self {
        Self { id, tick, payload }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Registry and oracle events
    CommodityListed(CommodityListedEvent),
    PriceUpdated(PriceUpdatedEvent),
    FeedRegistered(FeedRegisteredEvent),

    // Token events
    TokensPurchased(TokensPurchasedEvent),
    TokensSold(TokensSoldEvent),
    TokensTransferred(TokensTransferredEvent),

    // Position events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    PositionLiquidated(PositionLiquidatedEvent),

    // Administration events
    MarketStatusChanged(MarketStatusChangedEvent),
    FeeRateChanged(FeeRateChangedEvent),
    LiquidationThresholdChanged(LiquidationThresholdChangedEvent),
    FundingRateChanged(FundingRateChangedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityListedEvent {
    pub commodity_id: CommodityId,
    pub symbol: String,
    pub initial_price: Price,
    pub margin_requirement_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdatedEvent {
    pub commodity_id: CommodityId,
    pub reporter: AccountId,
    pub old_price: Price,
    pub new_price: Price,
    pub change_bps: SignedBps,
    pub confidence_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedRegisteredEvent {
    pub commodity_id: CommodityId,
    pub reporter: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensPurchasedEvent {
    pub account: AccountId,
    pub commodity_id: CommodityId,
    pub paid: Amount,
    pub fee: Amount,
    pub tokens: Quantity,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensSoldEvent {
    pub account: AccountId,
    pub commodity_id: CommodityId,
    pub tokens: Quantity,
    pub fee: Amount,
    pub proceeds: Amount,
    pub price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokensTransferredEvent {
    pub from: AccountId,
    pub to: AccountId,
    pub commodity_id: CommodityId,
    pub amount: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub commodity_id: CommodityId,
    pub direction: Direction,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub margin: Amount,
    pub expiry: Tick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub commodity_id: CommodityId,
    pub exit_price: Price,
    pub pnl: i128,
    pub settlement: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub commodity_id: CommodityId,
    pub liquidator: AccountId,
    pub mark_price: Price,
    pub pnl: i128,
    pub margin_retained: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatusChangedEvent {
    pub open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeRateChangedEvent {
    pub old_rate: Bps,
    pub new_rate: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationThresholdChangedEvent {
    pub old_threshold: Bps,
    pub new_threshold: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRateChangedEvent {
    pub commodity_id: CommodityId,
    pub rate: SignedBps,
}
