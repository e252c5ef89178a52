//! Uniform-price scan over a batch's aggregates.
//!
//! The **buy scan** matches taker-buy demand against maker-sell supply at
//! the lowest tick that satisfies demand, walking active ticks upward. The
//! **sell scan** is its mirror: taker-sell supply against maker-buy demand,
//! walking downward. Both are resumable — a [`ScanCursor`] carries the
//! position and running total between bounded calls, so a long clearing
//! never blocks other work on the market.
//!
//! Determinism: integer arithmetic only, divisions floor, and a tick whose
//! liquidity exactly meets the remaining demand clears at that tick.

use std::collections::HashMap;

use fba_types::constants::{MAX_TICK, MIN_TICK};
use fba_types::math::fraction_bps;
use fba_types::{Clearing, FbaError, Result, TickLevel};

use crate::bitmap::TickBitmap;

/// Resumable scan position: `(current tick, cumulative quantity)` plus the
/// deepest active tick seen, which becomes the clearing tick when the scan
/// exhausts the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScanCursor {
    /// Next tick the search resumes from.
    from: i32,
    /// Maker quantity accumulated so far.
    cumulative: u128,
    /// Last active tick visited (any aggregate).
    last_active: Option<i32>,
}

impl ScanCursor {
    /// Fresh cursor for a buy scan (ascending from `MIN_TICK`).
    #[must_use]
    pub fn start_buy() -> Self {
        Self {
            from: MIN_TICK,
            cumulative: 0,
            last_active: None,
        }
    }

    /// Fresh cursor for a sell scan (descending from `MAX_TICK`).
    #[must_use]
    pub fn start_sell() -> Self {
        Self {
            from: MAX_TICK,
            cumulative: 0,
            last_active: None,
        }
    }
}

/// Result of one bounded scan call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Step budget exhausted; resume later from the cursor.
    Pending(ScanCursor),
    /// Scan finished; the clearing is final for this side.
    Complete(Clearing),
}

/// Advance the buy-auction scan by at most `max_steps` active ticks.
///
/// `demand` is the batch's total taker-buy quantity. Maker-sell supply is
/// consumed tick by tick upward; the scan completes at the first tick where
/// cumulative supply covers demand, pro-rating the marginal tick's makers.
/// If supply runs out, the deepest active tick clears whatever accumulated
/// and takers are pro-rated instead.
///
/// # Errors
/// Returns `MathOverflow` only if aggregate totals exceed fixed-point range.
pub fn step_buy_scan(
    levels: &HashMap<i32, TickLevel>,
    bitmap: &TickBitmap,
    demand: u128,
    mut cursor: ScanCursor,
    max_steps: u32,
) -> Result<ScanOutcome> {
    if demand == 0 {
        return Ok(ScanOutcome::Complete(Clearing::empty()));
    }

    for _ in 0..max_steps {
        let Some(tick) = bitmap.next_active(cursor.from, MAX_TICK) else {
            return Ok(ScanOutcome::Complete(exhausted(&cursor, demand)?));
        };
        cursor.last_active = Some(tick);
        cursor.from = tick + 1;

        let supply = levels.get(&tick).map_or(0, |level| level.maker_sell);
        if supply > 0 {
            let needed = demand - cursor.cumulative;
            if supply >= needed {
                return Ok(ScanOutcome::Complete(Clearing {
                    clearing_tick: tick,
                    marginal_fill_maker_bps: if needed < supply {
                        fraction_bps(needed, supply)?
                    } else {
                        10_000
                    },
                    marginal_fill_taker_bps: 10_000,
                    cleared_qty: demand,
                    finalized: false,
                }));
            }
            cursor.cumulative = cursor
                .cumulative
                .checked_add(supply)
                .ok_or(FbaError::MathOverflow { context: "buy scan cumulative" })?;
        }
    }
    Ok(ScanOutcome::Pending(cursor))
}

/// Advance the sell-auction scan by at most `max_steps` active ticks.
///
/// Mirror image of [`step_buy_scan`]: `demand` is the batch's total
/// taker-sell quantity, absorbed by maker-buy interest from the highest
/// active tick downward.
///
/// # Errors
/// Returns `MathOverflow` only if aggregate totals exceed fixed-point range.
pub fn step_sell_scan(
    levels: &HashMap<i32, TickLevel>,
    bitmap: &TickBitmap,
    demand: u128,
    mut cursor: ScanCursor,
    max_steps: u32,
) -> Result<ScanOutcome> {
    if demand == 0 {
        return Ok(ScanOutcome::Complete(Clearing::empty()));
    }

    for _ in 0..max_steps {
        let Some(tick) = bitmap.prev_active(cursor.from, MIN_TICK) else {
            return Ok(ScanOutcome::Complete(exhausted(&cursor, demand)?));
        };
        cursor.last_active = Some(tick);
        cursor.from = tick - 1;

        let interest = levels.get(&tick).map_or(0, |level| level.maker_buy);
        if interest > 0 {
            let needed = demand - cursor.cumulative;
            if interest >= needed {
                return Ok(ScanOutcome::Complete(Clearing {
                    clearing_tick: tick,
                    marginal_fill_maker_bps: if needed < interest {
                        fraction_bps(needed, interest)?
                    } else {
                        10_000
                    },
                    marginal_fill_taker_bps: 10_000,
                    cleared_qty: demand,
                    finalized: false,
                }));
            }
            cursor.cumulative = cursor
                .cumulative
                .checked_add(interest)
                .ok_or(FbaError::MathOverflow { context: "sell scan cumulative" })?;
        }
    }
    Ok(ScanOutcome::Pending(cursor))
}

/// Clearing for a scan that ran out of active ticks before covering demand.
fn exhausted(cursor: &ScanCursor, demand: u128) -> Result<Clearing> {
    let (Some(tick), true) = (cursor.last_active, cursor.cumulative > 0) else {
        return Ok(Clearing::empty());
    };
    Ok(Clearing {
        clearing_tick: tick,
        marginal_fill_maker_bps: 10_000,
        marginal_fill_taker_bps: fraction_bps(cursor.cumulative, demand)?,
        cleared_qty: cursor.cumulative,
        finalized: false,
    })
}

/// Run a buy scan to completion in one call (tests and small books).
///
/// # Errors
/// Propagates any scan error.
pub fn run_buy_scan(
    levels: &HashMap<i32, TickLevel>,
    bitmap: &TickBitmap,
    demand: u128,
) -> Result<Clearing> {
    let mut cursor = ScanCursor::start_buy();
    loop {
        match step_buy_scan(levels, bitmap, demand, cursor, u32::MAX)? {
            ScanOutcome::Complete(clearing) => return Ok(clearing),
            ScanOutcome::Pending(next) => cursor = next,
        }
    }
}

/// Run a sell scan to completion in one call (tests and small books).
///
/// # Errors
/// Propagates any scan error.
pub fn run_sell_scan(
    levels: &HashMap<i32, TickLevel>,
    bitmap: &TickBitmap,
    demand: u128,
) -> Result<Clearing> {
    let mut cursor = ScanCursor::start_sell();
    loop {
        match step_sell_scan(levels, bitmap, demand, cursor, u32::MAX)? {
            ScanOutcome::Complete(clearing) => return Ok(clearing),
            ScanOutcome::Pending(next) => cursor = next,
        }
    }
}
