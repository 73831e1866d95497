//! Oracle feed store.
//!
//! One authorized reporter per commodity pushes prices with a confidence
//! figure. Every price-dependent operation gates on freshness: the feed must
//! exist, be active, have been updated within the validity window, and carry
//! confidence at or above the floor. The engine is agnostic to how reporters
//! obtain real-world prices.

use crate::types::{AccountId, Bps, CommodityId, Price, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleFeed {
    pub commodity_id: CommodityId,
    /// The single account allowed to push prices for this commodity.
    pub reporter: AccountId,
    pub last_price: Price,
    pub last_update: Tick,
    pub confidence_bps: Bps,
    pub active: bool,
}

impl OracleFeed {
    /// Freshness gate used by every price-dependent operation.
    pub fn is_fresh(&self, now: Tick, validity_window: u64, confidence_floor: Bps) -> bool {
        self.active
            && now.since(self.last_update) <= validity_window
            && self.confidence_bps >= confidence_floor
    }
}

/// Per-commodity feed records. Registering a feed for a commodity that already
/// has one replaces it; that is an administrative act.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedStore {
    feeds: HashMap<CommodityId, OracleFeed>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        commodity_id: CommodityId,
        reporter: AccountId,
        initial_price: Price,
        now: Tick,
    ) {
        self.feeds.insert(
            commodity_id,
            OracleFeed {
                commodity_id,
                reporter,
                last_price: initial_price,
                last_update: now,
                confidence_bps: Bps(10_000),
                active: true,
            },
        );
    }

    pub fn get(&self, commodity_id: CommodityId) -> Option<&OracleFeed> {
        self.feeds.get(&commodity_id)
    }

    pub fn get_mut(&mut self, commodity_id: CommodityId) -> Option<&mut OracleFeed> {
        self.feeds.get_mut(&commodity_id)
    }

    /// Record a price push. Returns the prior price so the caller can derive a
    /// change percentage. Rejects mismatched reporters and low-confidence data
    /// without touching the stored feed.
    pub fn record_update(
        &mut self,
        commodity_id: CommodityId,
        reporter: AccountId,
        price: Price,
        confidence_bps: Bps,
        confidence_floor: Bps,
        now: Tick,
    ) -> Result<Price, OracleError> {
        let feed = self
            .feeds
            .get_mut(&commodity_id)
            .ok_or(OracleError::FeedNotFound(commodity_id))?;

        if feed.reporter != reporter {
            return Err(OracleError::UnauthorizedReporter {
                commodity_id,
                reporter,
            });
        }
        if !feed.active {
            return Err(OracleError::FeedInactive(commodity_id));
        }
        if confidence_bps < confidence_floor {
            return Err(OracleError::LowConfidence {
                commodity_id,
                confidence: confidence_bps,
                floor: confidence_floor,
            });
        }

        let prior = feed.last_price;
        feed.last_price = price;
        feed.last_update = now;
        feed.confidence_bps = confidence_bps;
        Ok(prior)
    }

    /// True iff the commodity has a feed passing the freshness gate.
    pub fn is_fresh(
        &self,
        commodity_id: CommodityId,
        now: Tick,
        validity_window: u64,
        confidence_floor: Bps,
    ) -> bool {
        self.feeds
            .get(&commodity_id)
            .map(|feed| feed.is_fresh(now, validity_window, confidence_floor))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("no oracle feed registered for commodity {0:?}")]
    FeedNotFound(CommodityId),

    #[error("account {reporter:?} is not the reporter for commodity {commodity_id:?}")]
    UnauthorizedReporter {
        commodity_id: CommodityId,
        reporter: AccountId,
    },

    #[error("oracle feed for commodity {0:?} is inactive")]
    FeedInactive(CommodityId),

    #[error(
        "confidence {confidence} below floor {floor} for commodity {commodity_id:?}"
    )]
    LowConfidence {
        commodity_id: CommodityId,
        confidence: Bps,
        floor: Bps,
    },
}
