//! Per-commodity aggregate statistics.
//!
//! Pure bookkeeping updated exactly once per position open, close, or
//! liquidate. All counters are quantity-weighted. Open interest equals
//! long plus short totals; volume is monotonic and only ever grows.

use crate::types::{CommodityId, Direction, Quantity, SignedBps};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommodityStats {
    pub total_long_positions: u128,
    pub total_short_positions: u128,
    /// Monotonic. Close and liquidate never decrement it.
    pub total_volume_24h: u128,
    /// Outstanding quantity across both sides; equals long + short.
    pub open_interest: u128,
    /// Stored for external consumers; the core never derives from it.
    pub funding_rate: SignedBps,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsStore {
    entries: HashMap<CommodityId, CommodityStats>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, commodity_id: CommodityId) -> CommodityStats {
        self.entries.get(&commodity_id).copied().unwrap_or_default()
    }

    pub(crate) fn record_open(
        &mut self,
        commodity_id: CommodityId,
        direction: Direction,
        quantity: Quantity,
    ) {
        let stats = self.entries.entry(commodity_id).or_default();
        let q = u128::from(quantity.value());
        match direction {
            Direction::Long => stats.total_long_positions += q,
            Direction::Short => stats.total_short_positions += q,
        }
        stats.open_interest += q;
        stats.total_volume_24h += q;
    }

    pub(crate) fn record_settle(
        &mut self,
        commodity_id: CommodityId,
        direction: Direction,
        quantity: Quantity,
    ) {
        let stats = self.entries.entry(commodity_id).or_default();
        let q = u128::from(quantity.value());
        match direction {
            Direction::Long => {
                debug_assert!(stats.total_long_positions >= q);
                stats.total_long_positions -= q;
            }
            Direction::Short => {
                debug_assert!(stats.total_short_positions >= q);
                stats.total_short_positions -= q;
            }
        }
        debug_assert!(stats.open_interest >= q);
        stats.open_interest -= q;
    }

    pub(crate) fn set_funding_rate(&mut self, commodity_id: CommodityId, rate: SignedBps) {
        self.entries.entry(commodity_id).or_default().funding_rate = rate;
    }
}
