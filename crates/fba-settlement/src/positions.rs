//! Signed perp position ledger.
//!
//! Perp claims reuse the spot entitlement math but book a signed position
//! delta instead of moving tokens: a buy fill grows the position, a sell
//! fill shrinks it, and the quote leg accrues with the opposite sign.
//! Across all traders of a market the deltas cancel, so net exposure stays
//! at zero (up to pro-rata rounding dust left uncleared).

use std::collections::HashMap;

use fba_types::constants::WAD;
use fba_types::{FbaError, MarketId, Result, Side, TraderId};
use serde::{Deserialize, Serialize};

/// One trader's open exposure in one perp market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Signed contract quantity (positive = long).
    pub qty: i128,
    /// Cumulative signed quote flow; entry cost carried with opposite sign.
    pub quote: i128,
}

impl Position {
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.qty == 0 && self.quote == 0
    }

    /// Unrealized PnL against a WAD-scaled mark price.
    ///
    /// # Errors
    /// `MathOverflow` outside fixed-point range.
    pub fn unrealized_pnl(&self, mark_price_wad: u128) -> Result<i128> {
        let mark = i128::try_from(mark_price_wad)
            .map_err(|_| FbaError::MathOverflow { context: "pnl mark" })?;
        let value = self
            .qty
            .checked_mul(mark)
            .ok_or(FbaError::MathOverflow { context: "pnl value" })?
            / i128::try_from(WAD).map_err(|_| FbaError::MathOverflow { context: "pnl wad" })?;
        value
            .checked_add(self.quote)
            .ok_or(FbaError::MathOverflow { context: "pnl sum" })
    }
}

/// Per-market, per-trader position book.
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: HashMap<(MarketId, TraderId), Position>,
}

impl PositionBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Book a fill: `qty` contracts at `notional` quote value.
    ///
    /// # Errors
    /// `MathOverflow` when a counter leaves `i128` range.
    pub fn apply_fill(
        &mut self,
        market_id: MarketId,
        trader: TraderId,
        side: Side,
        qty: u128,
        notional: u128,
    ) -> Result<()> {
        let qty = i128::try_from(qty).map_err(|_| FbaError::MathOverflow { context: "fill qty" })?;
        let notional =
            i128::try_from(notional).map_err(|_| FbaError::MathOverflow { context: "fill notional" })?;
        let (dq, dn) = match side {
            Side::Buy => (qty, -notional),
            Side::Sell => (-qty, notional),
        };
        let entry = self.positions.entry((market_id, trader)).or_default();
        entry.qty = entry
            .qty
            .checked_add(dq)
            .ok_or(FbaError::MathOverflow { context: "position qty" })?;
        entry.quote = entry
            .quote
            .checked_add(dn)
            .ok_or(FbaError::MathOverflow { context: "position quote" })?;
        if entry.is_flat() {
            self.positions.remove(&(market_id, trader));
        }
        Ok(())
    }

    #[must_use]
    pub fn position(&self, market_id: MarketId, trader: TraderId) -> Position {
        self.positions
            .get(&(market_id, trader))
            .copied()
            .unwrap_or_default()
    }

    /// Net signed contract quantity across all traders of a market.
    #[must_use]
    pub fn net_qty(&self, market_id: MarketId) -> i128 {
        self.positions
            .iter()
            .filter(|((m, _), _)| *m == market_id)
            .map(|(_, p)| p.qty)
            .sum()
    }

    /// Net signed quote flow across all traders of a market.
    #[must_use]
    pub fn net_quote(&self, market_id: MarketId) -> i128 {
        self.positions
            .iter()
            .filter(|((m, _), _)| *m == market_id)
            .map(|(_, p)| p.quote)
            .sum()
    }
}
