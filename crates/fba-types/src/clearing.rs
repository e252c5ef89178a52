//! Clearing results for batch auctions.
//!
//! Each batch runs two independent uniform-price auctions: the **buy
//! auction** matches taker-buy demand against maker-sell supply, the
//! **sell auction** matches taker-sell supply against maker-buy demand.
//! Each produces its own [`Clearing`].

use serde::{Deserialize, Serialize};

use crate::{Flow, Side};

/// Which of the two per-batch auctions a clearing (or an order) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionSide {
    /// Taker-buy demand vs maker-sell supply; scans ticks upward.
    Buy,
    /// Taker-sell supply vs maker-buy demand; scans ticks downward.
    Sell,
}

impl AuctionSide {
    /// The auction a `(side, flow)` pair clears in.
    #[must_use]
    pub fn of(side: Side, flow: Flow) -> Self {
        match (side, flow) {
            (Side::Buy, Flow::Taker) | (Side::Sell, Flow::Maker) => Self::Buy,
            (Side::Sell, Flow::Taker) | (Side::Buy, Flow::Maker) => Self::Sell,
        }
    }
}

impl std::fmt::Display for AuctionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY_AUCTION"),
            Self::Sell => write!(f, "SELL_AUCTION"),
        }
    }
}

/// Uniform-price clearing result for one side of one batch.
///
/// Immutable once `finalized` — claims read it, nothing rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clearing {
    /// The single tick at which all cleared quantity transacts.
    pub clearing_tick: i32,
    /// Pro-rata fraction (1/10000) for makers resting exactly at the
    /// clearing tick. `10000` when marginal makers fill fully.
    pub marginal_fill_maker_bps: u16,
    /// Pro-rata fraction for takers; below `10000` only when supply ran out.
    pub marginal_fill_taker_bps: u16,
    /// Total quantity that transacts at the clearing tick.
    pub cleared_qty: u128,
    pub finalized: bool,
}

impl Clearing {
    /// The no-match result: nothing cleared, everyone refunds.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            clearing_tick: 0,
            marginal_fill_maker_bps: 0,
            marginal_fill_taker_bps: 0,
            cleared_qty: 0,
            finalized: false,
        }
    }

    /// Mark the result immutable.
    #[must_use]
    pub fn finalize(mut self) -> Self {
        self.finalized = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auction_side_of_pairs() {
        assert_eq!(AuctionSide::of(Side::Buy, Flow::Taker), AuctionSide::Buy);
        assert_eq!(AuctionSide::of(Side::Sell, Flow::Maker), AuctionSide::Buy);
        assert_eq!(AuctionSide::of(Side::Sell, Flow::Taker), AuctionSide::Sell);
        assert_eq!(AuctionSide::of(Side::Buy, Flow::Maker), AuctionSide::Sell);
    }

    #[test]
    fn empty_clearing_is_unfinalized_zero() {
        let clearing = Clearing::empty();
        assert_eq!(clearing.cleared_qty, 0);
        assert!(!clearing.finalized);
        assert!(clearing.finalize().finalized);
    }

    #[test]
    fn clearing_serde_roundtrip() {
        let clearing = Clearing {
            clearing_tick: 900,
            marginal_fill_maker_bps: 7500,
            marginal_fill_taker_bps: 10000,
            cleared_qty: 150,
            finalized: true,
        };
        let json = serde_json::to_string(&clearing).unwrap();
        let back: Clearing = serde_json::from_str(&json).unwrap();
        assert_eq!(clearing, back);
    }
}
