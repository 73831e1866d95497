// commodity-core: synthetic commodity futures ledger engine.
// accounting-first architecture: every balance, position, and aggregate stays
// mutually consistent under permissionless calls arriving in arbitrary order.
// all computation is deterministic with no external I/O; time is a host tick.
//
// file map:
//   types.rs      primitives: CommodityId, Direction, Amount, Price, Quantity, Tick, Bps
//   commodity.rs  commodity registry: params, activity flag, price refresh
//   oracle.rs     feed store: one reporter per commodity, confidence + staleness gate
//   token.rs      synthetic token ledger: mint/burn/transfer, conservation counters
//   margin.rs     pure valuation: required margin, signed pnl, liquidation risk
//   position.rs   position records, monotonic ids, terminal lifecycle
//   ledger.rs     per account+commodity mirror: open count, realized pnl, margin locked
//   stats.rs      per-commodity aggregates: open interest, long/short, volume
//   settlement.rs settlement currency seam: SettlementBank trait + in-memory rail
//   config.rs     protocol config: fees, thresholds, oracle window, presets
//   events.rs     audit trail of every state transition
//   engine/       trading facade: buy/sell, open/close/liquidate, admin, queries

// accounting core
pub mod commodity;
pub mod ledger;
pub mod margin;
pub mod oracle;
pub mod position;
pub mod stats;
pub mod token;
pub mod types;

// orchestration and integration
pub mod config;
pub mod engine;
pub mod events;
pub mod settlement;

// re exports for convenience
pub use commodity::{Commodity, CommodityError, CommodityParams, CommodityRegistry};
pub use config::{ConfigError, Environment, ProtocolConfig};
pub use engine::{
    CloseResult, Engine, EngineError, LiquidationOutcome, PurchaseReceipt, SaleReceipt,
};
pub use events::{Event, EventId, EventPayload};
pub use ledger::{AccountCommodityLedger, AccountLedgerStore};
pub use margin::{liquidation_risk, position_value, required_margin, ValuationError};
pub use oracle::{FeedStore, OracleError, OracleFeed};
pub use position::{Position, PositionLedger};
pub use settlement::{InMemorySettlement, SettlementBank, SettlementError};
pub use stats::{CommodityStats, StatsStore};
pub use token::{SupplyCounters, TokenError, TokenLedger};
pub use types::{
    AccountId, Amount, ArithmeticError, Bps, CommodityId, Direction, PositionId, Price, Quantity,
    SignedBps, Tick,
};
