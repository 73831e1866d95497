//! Commodity registry: static and slow-changing parameters per commodity.
//!
//! A commodity is a tradable instrument identity (gold, oil, wheat) with a
//! price in micro-units, a margin requirement, and an activity flag. Entries
//! are created by administration, refreshed by oracle pushes, and never
//! deleted.

use crate::types::{Bps, CommodityId, Price, Quantity, SignedBps, Tick, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Margin requirement ceiling: 5000 bps = 50% of notional.
pub const MAX_MARGIN_REQUIREMENT_BPS: Bps = Bps(5_000);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub id: CommodityId,
    /// Human-readable name (e.g., "Gold").
    pub name: String,
    /// Ticker symbol (e.g., "XAU").
    pub symbol: String,
    /// Unit the quantity is denominated in (e.g., "troy oz").
    pub unit: String,
    /// Last pushed price, micro-units per whole unit.
    pub price: Price,
    /// Tick of the last price refresh.
    pub last_updated: Tick,
    /// Signed change vs. the previous pushed price.
    pub daily_change_bps: SignedBps,
    pub volatility_bps: Bps,
    /// Collateral required to open a position, as a fraction of notional.
    pub margin_requirement_bps: Bps,
    pub contract_size: Quantity,
    pub active: bool,
}

impl Commodity {
    /// Refresh the price from an oracle push. `prior` is the previously stored
    /// feed price, used to derive the signed change.
    pub fn refresh_price(&mut self, new_price: Price, prior: Price, now: Tick) {
        self.price = new_price;
        self.last_updated = now;
        self.daily_change_bps = price_change_bps(prior, new_price);
    }
}

/// Signed bps change from `prior` to `current`, floor division. Saturates at
/// the i32 range rather than wrapping for absurd jumps.
pub fn price_change_bps(prior: Price, current: Price) -> SignedBps {
    let prior_wide = i128::from(prior.value());
    let delta = i128::from(current.value()) - prior_wide;
    let bps = delta * BPS_DENOMINATOR as i128 / prior_wide;
    SignedBps(bps.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
}

/// Parameters supplied when listing or updating a commodity. Split from the
/// record itself so administration cannot touch price state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityParams {
    pub name: String,
    pub symbol: String,
    pub unit: String,
    pub initial_price: Price,
    pub volatility_bps: Bps,
    pub margin_requirement_bps: Bps,
    pub contract_size: Quantity,
}

impl CommodityParams {
    pub fn validate(&self) -> Result<(), CommodityError> {
        if self.margin_requirement_bps > MAX_MARGIN_REQUIREMENT_BPS {
            return Err(CommodityError::MarginRequirementOutOfRange {
                requested: self.margin_requirement_bps,
                maximum: MAX_MARGIN_REQUIREMENT_BPS,
            });
        }
        Ok(())
    }
}

/// All listed commodities. New commodities require no new code path, only an
/// entry here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommodityRegistry {
    entries: HashMap<CommodityId, Commodity>,
}

impl CommodityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        id: CommodityId,
        params: CommodityParams,
        now: Tick,
    ) -> Result<(), CommodityError> {
        params.validate()?;
        if self.entries.contains_key(&id) {
            return Err(CommodityError::AlreadyListed(id));
        }
        self.entries.insert(
            id,
            Commodity {
                id,
                name: params.name,
                symbol: params.symbol,
                unit: params.unit,
                price: params.initial_price,
                last_updated: now,
                daily_change_bps: SignedBps(0),
                volatility_bps: params.volatility_bps,
                margin_requirement_bps: params.margin_requirement_bps,
                contract_size: params.contract_size,
                active: true,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: CommodityId) -> Option<&Commodity> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: CommodityId) -> Option<&mut Commodity> {
        self.entries.get_mut(&id)
    }

    /// Lookup that also requires the commodity to be tradable.
    pub fn get_active(&self, id: CommodityId) -> Result<&Commodity, CommodityError> {
        let commodity = self
            .entries
            .get(&id)
            .ok_or(CommodityError::NotListed(id))?;
        if !commodity.active {
            return Err(CommodityError::Inactive(id));
        }
        Ok(commodity)
    }

    pub fn ids(&self) -> impl Iterator<Item = CommodityId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CommodityError {
    #[error("commodity {0:?} is not listed")]
    NotListed(CommodityId),

    #[error("commodity {0:?} is already listed")]
    AlreadyListed(CommodityId),

    #[error("commodity {0:?} is inactive")]
    Inactive(CommodityId),

    #[error("margin requirement {requested} exceeds maximum {maximum}")]
    MarginRequirementOutOfRange { requested: Bps, maximum: Bps },
}
