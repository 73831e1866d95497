//! Protocol configuration: fees, risk thresholds, oracle gating, event
//! retention. All bounds are validated at construction and on every admin
//! update, so a running engine can never hold an out-of-range parameter.

use crate::types::Bps;
use serde::{Deserialize, Serialize};

/// Fee ceiling: 500 bps = 5%.
pub const MAX_FEE_RATE_BPS: Bps = Bps(500);
/// Liquidation threshold band: 50% to 95% of margin consumed by losses.
pub const MIN_LIQUIDATION_THRESHOLD_BPS: Bps = Bps(5_000);
pub const MAX_LIQUIDATION_THRESHOLD_BPS: Bps = Bps(9_500);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Trade fee on token buys and sells.
    pub fee_rate_bps: Bps,
    /// Loss-to-margin ratio at which anyone may liquidate.
    pub liquidation_threshold_bps: Bps,
    /// Maximum feed age, in ticks, before prices are considered stale.
    pub oracle_validity_window: u64,
    /// Minimum reported confidence for a price push to be accepted.
    pub confidence_floor_bps: Bps,
    /// Audit events retained in memory.
    pub max_events: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Environment::Production.config()
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_fee_rate(self.fee_rate_bps)?;
        validate_liquidation_threshold(self.liquidation_threshold_bps)?;
        Ok(())
    }
}

pub fn validate_fee_rate(rate: Bps) -> Result<(), ConfigError> {
    if rate > MAX_FEE_RATE_BPS {
        return Err(ConfigError::FeeRateOutOfRange {
            requested: rate,
            maximum: MAX_FEE_RATE_BPS,
        });
    }
    Ok(())
}

pub fn validate_liquidation_threshold(threshold: Bps) -> Result<(), ConfigError> {
    if threshold < MIN_LIQUIDATION_THRESHOLD_BPS || threshold > MAX_LIQUIDATION_THRESHOLD_BPS {
        return Err(ConfigError::LiquidationThresholdOutOfRange {
            requested: threshold,
            minimum: MIN_LIQUIDATION_THRESHOLD_BPS,
            maximum: MAX_LIQUIDATION_THRESHOLD_BPS,
        });
    }
    Ok(())
}

/// Deployment presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Loose gating for local simulation: wide oracle window, small event cap.
    Development,
    /// Mainnet-shaped defaults.
    Production,
}

impl Environment {
    pub fn config(&self) -> ProtocolConfig {
        match self {
            Environment::Development => ProtocolConfig {
                fee_rate_bps: Bps(50),
                liquidation_threshold_bps: Bps(8_000),
                oracle_validity_window: 1_000,
                confidence_floor_bps: Bps(8_000),
                max_events: 10_000,
            },
            Environment::Production => ProtocolConfig {
                fee_rate_bps: Bps(50),
                liquidation_threshold_bps: Bps(9_000),
                oracle_validity_window: 144,
                confidence_floor_bps: Bps(8_000),
                max_events: 100_000,
            },
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("fee rate {requested} exceeds maximum {maximum}")]
    FeeRateOutOfRange { requested: Bps, maximum: Bps },

    #[error(
        "liquidation threshold {requested} outside [{minimum}, {maximum}]"
    )]
    LiquidationThresholdOutOfRange {
        requested: Bps,
        minimum: Bps,
        maximum: Bps,
    },
}
