// result types and errors for engine operations.

use crate::commodity::CommodityError;
use crate::config::ConfigError;
use crate::margin::ValuationError;
use crate::oracle::OracleError;
use crate::settlement::SettlementError;
use crate::token::TokenError;
use crate::types::{AccountId, Amount, ArithmeticError, CommodityId, PositionId, Price, Quantity};

#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    pub tokens: Quantity,
    pub paid: Amount,
    pub fee: Amount,
    pub price: Price,
}

#[derive(Debug, Clone)]
pub struct SaleReceipt {
    pub tokens: Quantity,
    pub proceeds: Amount,
    pub fee: Amount,
    pub price: Price,
}

#[derive(Debug, Clone)]
pub struct CloseResult {
    pub position_id: PositionId,
    pub settlement: Amount,
    pub pnl: i128,
    pub exit_price: Price,
}

#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    pub position_id: PositionId,
    pub liquidator: AccountId,
    pub mark_price: Price,
    pub pnl: i128,
    /// Margin kept by the engine; nothing is paid to the owner.
    pub margin_retained: Amount,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("caller {0:?} lacks the required capability")]
    Unauthorized(AccountId),

    #[error("position {0:?} not found")]
    PositionNotFound(PositionId),

    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("commodity {0:?} is unknown or inactive")]
    InvalidCommodity(CommodityId),

    #[error("market is closed")]
    MarketClosed,

    #[error("oracle feed for commodity {0:?} is stale, missing, or below confidence")]
    OracleStale(CommodityId),

    #[error("margin computation failed for commodity {0:?}")]
    MarginInsufficient(CommodityId),

    #[error("position {0:?} is already closed or liquidated")]
    AlreadyTerminal(PositionId),

    #[error("position {0:?} does not meet the liquidation threshold")]
    NotLiquidatable(PositionId),

    #[error("arithmetic precondition violated: {0}")]
    InvalidState(ValuationError),

    #[error("arithmetic precondition violated: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("token ledger error: {0}")]
    Token(#[from] TokenError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("settlement transfer failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("commodity registry error: {0}")]
    Commodity(#[from] CommodityError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
