// trading facade: coordinates registry, oracle gating, token ledger,
// position lifecycle, account mirrors, and stats as atomic operations.
// deterministic and event-driven with no external I/O.

mod core;
mod liquidations;
mod positions;
mod results;
mod trading;

pub use self::core::Engine;
pub use self::results::{CloseResult, EngineError, LiquidationOutcome, PurchaseReceipt, SaleReceipt};
