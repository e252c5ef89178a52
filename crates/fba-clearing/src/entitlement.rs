//! Per-order entitlement against a finalized clearing.
//!
//! Pure functions: settlement asks "is this order in the money, and for
//! how much" and moves funds accordingly. Orders resting exactly at the
//! clearing tick are pro-rated by the stored marginal bps; everyone else
//! either fills fully or not at all.

use fba_types::math::mul_bps;
use fba_types::{Clearing, Flow, Order, Result, Side};

/// Whether the order participates in the cleared quantity at all.
///
/// Requires a finalized, non-empty clearing. Takers are always in the
/// money; makers only when the clearing tick is at or better than their
/// limit.
#[must_use]
pub fn in_the_money(order: &Order, clearing: &Clearing) -> bool {
    if !clearing.finalized || clearing.cleared_qty == 0 {
        return false;
    }
    match order.flow {
        Flow::Taker => true,
        Flow::Maker => match order.side {
            Side::Buy => order.price_tick >= clearing.clearing_tick,
            Side::Sell => order.price_tick <= clearing.clearing_tick,
        },
    }
}

/// Quantity this order fills at the clearing tick.
///
/// Full quantity away from the marginal tick; `floor(qty × bps / 10000)`
/// on it, using the maker or taker bps as appropriate. Rounding dust is
/// never reassigned — it stays uncleared.
///
/// # Errors
/// Returns `MathOverflow` for quantities outside fixed-point range.
pub fn filled_qty(order: &Order, clearing: &Clearing) -> Result<u128> {
    if !in_the_money(order, clearing) {
        return Ok(0);
    }
    if order.price_tick != clearing.clearing_tick {
        return Ok(order.qty);
    }
    let bps = match order.flow {
        Flow::Maker => clearing.marginal_fill_maker_bps,
        Flow::Taker => clearing.marginal_fill_taker_bps,
    };
    mul_bps(order.qty, bps)
}
