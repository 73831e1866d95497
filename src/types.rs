// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, amounts, prices, quantities, ticks, basis points. each is a newtype so the
// compiler catches type mixups. all monetary magnitudes are unsigned micro-units
// (1e-6 of a whole unit); intermediates widen to u128 and pnl is i128.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Micro-units per whole unit of currency or price.
pub const MICRO_UNIT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommodityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

// 1.1: settlement currency amount in micro-units. margins, fees, settlements,
// custody balances all use this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(&self, other: Amount) -> Result<Amount, ArithmeticError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(ArithmeticError::Underflow)
    }

    /// Widen into a signed context. Lossless: u64 always fits i128.
    pub fn as_signed(&self) -> i128 {
        i128::from(self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| Amount(acc.0 + a.0))
    }
}

// 1.2: price in micro-units of settlement currency per whole token. must be positive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Price(u64);

impl Price {
    #[must_use]
    pub fn new(value: u64) -> Option<Self> {
        if value > 0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: u64) -> Self {
        debug_assert!(value > 0);
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: unsigned token or contract quantity in whole units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Quantity(pub u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.4: monotonic tick supplied by the host (block height or equivalent).
// the engine never reads a wall clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Ticks elapsed since `earlier`, saturating at zero for out-of-order input.
    pub fn since(&self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// 1.5: non-negative basis points. 100 bps = 1%. fee rates, margin requirements,
// confidence, liquidation thresholds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Bps(pub u32);

impl Bps {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

// 1.6: signed basis points for stored rates that may go negative: daily price
// change, funding rate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SignedBps(pub i32);

impl SignedBps {
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SignedBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}bps", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,
}

/// floor(a * bps / 10000) with a u128 intermediate. Cannot overflow the
/// intermediate for any u64 `a`; the result only exceeds u64 when bps > 10000,
/// which the config bounds rule out, but the conversion stays checked anyway.
pub fn apply_bps_floor(a: u64, bps: Bps) -> Result<u64, ArithmeticError> {
    let wide = u128::from(a) * u128::from(bps.0) / BPS_DENOMINATOR;
    u64::try_from(wide).map_err(|_| ArithmeticError::Overflow)
}

/// Narrow a u128 back into an Amount, erroring instead of wrapping.
pub fn narrow_amount(wide: u128) -> Result<Amount, ArithmeticError> {
    u64::try_from(wide).map(Amount).map_err(|_| ArithmeticError::Overflow)
}

/// Narrow a signed i128 into an unsigned Amount. Negative input is a caller
/// bug surfaced as underflow, never a wrap.
pub fn narrow_signed(value: i128) -> Result<Amount, ArithmeticError> {
    if value < 0 {
        return Err(ArithmeticError::Underflow);
    }
    u64::try_from(value).map(Amount).map_err(|_| ArithmeticError::Overflow)
}
