//! Margin and valuation: the pure arithmetic core.
//!
//! Required margin is a basis-point fraction of notional, floored. PnL is
//! signed and computed against the commodity's current price. Liquidation
//! risk compares the loss against deposited margin in basis points. No
//! function here touches persistent state.
//!
//! Safe input bounds: `quantity` and `price` are u64, so `quantity * price`
//! always fits u128 and margin math cannot overflow its intermediates. PnL
//! magnitude is `quantity * |delta|` which likewise fits u128; the signed
//! result fits i128 for any inputs this engine can store.

use crate::commodity::Commodity;
use crate::types::{Amount, Bps, Direction, Price, Quantity, BPS_DENOMINATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("margin computation overflowed the amount range")]
    MarginOverflow,

    #[error("position value magnitude exceeds the signed range")]
    ValueOverflow,

    #[error("liquidation risk is undefined for a position with zero margin")]
    ZeroMargin,
}

/// floor(quantity * price * margin_requirement_bps / 10000), u128 throughout.
pub fn required_margin(
    commodity: &Commodity,
    quantity: Quantity,
) -> Result<Amount, ValuationError> {
    let notional = u128::from(quantity.value()) * u128::from(commodity.price.value());
    let margin = notional * u128::from(commodity.margin_requirement_bps.value()) / BPS_DENOMINATOR;
    u64::try_from(margin)
        .map(Amount)
        .map_err(|_| ValuationError::MarginOverflow)
}

/// Signed mark-to-market PnL in micro-units. Long gains when price rises,
/// short gains when it falls.
pub fn position_value(
    direction: Direction,
    quantity: Quantity,
    entry_price: Price,
    current_price: Price,
) -> Result<i128, ValuationError> {
    let delta = match direction {
        Direction::Long => {
            i128::from(current_price.value()) - i128::from(entry_price.value())
        }
        Direction::Short => {
            i128::from(entry_price.value()) - i128::from(current_price.value())
        }
    };
    i128::from(quantity.value())
        .checked_mul(delta)
        .ok_or(ValuationError::ValueOverflow)
}

/// Whether a position is liquidatable: loss as a bps fraction of deposited
/// margin at or above the threshold. A non-negative PnL is never at risk.
/// Zero margin with a loss is a defined error, not a crash.
pub fn liquidation_risk(
    pnl: i128,
    margin_deposited: Amount,
    threshold: Bps,
) -> Result<bool, ValuationError> {
    if pnl >= 0 {
        return Ok(false);
    }
    if margin_deposited.is_zero() {
        return Err(ValuationError::ZeroMargin);
    }
    let loss = pnl.unsigned_abs();
    let risk_bps = loss * BPS_DENOMINATOR / u128::from(margin_deposited.value());
    Ok(risk_bps >= u128::from(threshold.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommodityId, SignedBps, Tick};

    fn gold_at(price: u64, margin_bps: u32) -> Commodity {
        Commodity {
            id: CommodityId(1),
            name: "Gold".to_string(),
            symbol: "XAU".to_string(),
            unit: "troy oz".to_string(),
            price: Price::new_unchecked(price),
            last_updated: Tick(0),
            daily_change_bps: SignedBps(0),
            volatility_bps: Bps(150),
            margin_requirement_bps: Bps(margin_bps),
            contract_size: Quantity(1),
            active: true,
        }
    }

    #[test]
    fn required_margin_scenario() {
        // 10 * 2_000_000_000 * 2000 / 10000 = 4_000_000_000
        let gold = gold_at(2_000_000_000, 2_000);
        let margin = required_margin(&gold, Quantity(10)).unwrap();
        assert_eq!(margin, Amount(4_000_000_000));
    }

    #[test]
    fn required_margin_floors() {
        // 3 * 333 * 100 / 10000 = 9.99 -> 9
        let commodity = gold_at(333, 100);
        assert_eq!(required_margin(&commodity, Quantity(3)).unwrap(), Amount(9));
    }

    #[test]
    fn required_margin_overflow_detected() {
        let commodity = gold_at(u64::MAX, 5_000);
        let result = required_margin(&commodity, Quantity(u64::MAX));
        assert_eq!(result, Err(ValuationError::MarginOverflow));
    }

    #[test]
    fn long_pnl_on_rise() {
        // 10 * (2_100_000_000 - 2_000_000_000) = 1_000_000_000
        let pnl = position_value(
            Direction::Long,
            Quantity(10),
            Price::new_unchecked(2_000_000_000),
            Price::new_unchecked(2_100_000_000),
        )
        .unwrap();
        assert_eq!(pnl, 1_000_000_000);
    }

    #[test]
    fn long_pnl_on_drop_is_negative() {
        let pnl = position_value(
            Direction::Long,
            Quantity(10),
            Price::new_unchecked(2_000_000_000),
            Price::new_unchecked(1_900_000_000),
        )
        .unwrap();
        assert_eq!(pnl, -1_000_000_000);
    }

    #[test]
    fn short_pnl_on_drop() {
        // 5 * (2_000_000_000 - 1_900_000_000) = 500_000_000
        let pnl = position_value(
            Direction::Short,
            Quantity(5),
            Price::new_unchecked(2_000_000_000),
            Price::new_unchecked(1_900_000_000),
        )
        .unwrap();
        assert_eq!(pnl, 500_000_000);
    }

    #[test]
    fn unchanged_price_is_flat() {
        let price = Price::new_unchecked(2_000_000_000);
        for direction in [Direction::Long, Direction::Short] {
            assert_eq!(
                position_value(direction, Quantity(7), price, price).unwrap(),
                0
            );
        }
    }

    #[test]
    fn risk_requires_a_loss() {
        assert!(!liquidation_risk(0, Amount(1), Bps(8_000)).unwrap());
        assert!(!liquidation_risk(1_000, Amount(1), Bps(8_000)).unwrap());
    }

    #[test]
    fn risk_threshold_boundary() {
        // loss 800 on margin 1000 = 8000bps, exactly at an 8000bps threshold
        assert!(liquidation_risk(-800, Amount(1_000), Bps(8_000)).unwrap());
        // 799 -> 7990bps, just under
        assert!(!liquidation_risk(-799, Amount(1_000), Bps(8_000)).unwrap());
    }

    #[test]
    fn zero_margin_is_a_defined_error() {
        assert_eq!(
            liquidation_risk(-1, Amount::ZERO, Bps(8_000)),
            Err(ValuationError::ZeroMargin)
        );
        // but zero margin with no loss is simply not at risk
        assert!(!liquidation_risk(0, Amount::ZERO, Bps(8_000)).unwrap());
    }
}
