//! Tick validation and the tick → price mapping.
//!
//! Prices are WAD-scaled (18 decimals) quote-per-base. The mapping from
//! discrete tick to price is pluggable behind [`TickPricer`] so a geometric
//! curve (e.g. `1.0001^tick`) can replace the linear placeholder without
//! touching clearing semantics — clearing only ever compares ticks.

use crate::constants::{MAX_TICK, MIN_TICK, WAD};
use crate::{FbaError, Result};

/// Whether `tick` lies in the admissible 24-bit signed range.
#[must_use]
pub fn valid_tick(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

/// Converts a price tick to a WAD-scaled price.
pub trait TickPricer {
    /// WAD-scaled quote-per-base price for `tick`.
    ///
    /// # Errors
    /// Returns `InvalidTick` when the tick has no price under this mapping.
    fn tick_to_price(&self, tick: i32) -> Result<u128>;
}

/// Reference mapping: `price = tick × WAD`.
///
/// Non-positive ticks carry no settleable price under the linear map and
/// are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTickPricer;

impl TickPricer for LinearTickPricer {
    fn tick_to_price(&self, tick: i32) -> Result<u128> {
        if !valid_tick(tick) || tick <= 0 {
            return Err(FbaError::InvalidTick { tick });
        }
        // tick > 0 and ≤ 2^23 − 1, so the WAD product stays well inside u128.
        Ok(u128::from(tick.unsigned_abs()) * WAD)
    }
}
