//! Checked fixed-point arithmetic helpers.
//!
//! All divisions round toward zero; overflow is a reported error, never a
//! silent wrap. Quantities are `u128`, fractions are basis points
//! (`1/10000`), prices are WAD-scaled (`1e18`).

use crate::constants::{BPS, WAD};
use crate::{FbaError, Result};

/// `floor(qty × bps / 10000)`.
///
/// # Errors
/// Returns `MathOverflow` if the intermediate product wraps.
pub fn mul_bps(qty: u128, bps: u16) -> Result<u128> {
    qty.checked_mul(u128::from(bps))
        .map(|p| p / BPS)
        .ok_or(FbaError::MathOverflow { context: "mul_bps" })
}

/// The pro-rata fraction `floor(part × 10000 / whole)` as bps.
///
/// # Errors
/// Returns `MathOverflow` on a wrapping product or a zero `whole`.
pub fn fraction_bps(part: u128, whole: u128) -> Result<u16> {
    if whole == 0 {
        return Err(FbaError::MathOverflow { context: "fraction_bps" });
    }
    let bps = part
        .checked_mul(BPS)
        .ok_or(FbaError::MathOverflow { context: "fraction_bps" })?
        / whole;
    u16::try_from(bps).map_err(|_| FbaError::MathOverflow { context: "fraction_bps" })
}

/// `floor(qty × price / WAD)` — the quote-token notional of a trade.
///
/// # Errors
/// Returns `MathOverflow` if the intermediate product wraps.
pub fn notional(qty: u128, price_wad: u128) -> Result<u128> {
    qty.checked_mul(price_wad)
        .map(|p| p / WAD)
        .ok_or(FbaError::MathOverflow { context: "notional" })
}
