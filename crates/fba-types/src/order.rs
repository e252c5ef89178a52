//! Order types for the FBA batch auction core.
//!
//! Orders are immutable once submitted; all mutation happens on the
//! separate [`OrderState`] record (cancel and claim only).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchId, FbaError, MarketId, OrderId, Result, TraderId};

/// Which side of the auction this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Whether the order posts price-limited liquidity or takes any price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Flow {
    /// Limit-priced resting liquidity; fills only at or better than its tick.
    Maker = 0,
    /// Accepts whatever price the batch clears at.
    Taker = 1,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maker => write!(f, "MAKER"),
            Self::Taker => write!(f, "TAKER"),
        }
    }
}

/// Core order struct. Immutable after submit; the id commits to every field
/// that matters for matching (see [`OrderId::derive`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub trader: TraderId,
    pub market_id: MarketId,
    pub batch_id: BatchId,
    pub side: Side,
    pub flow: Flow,
    /// Price-binding limit for makers. Takers carry a tick too, but it only
    /// locates their aggregate in the book — they match at any price.
    pub price_tick: i32,
    pub qty: u128,
    /// Unique per trader per batch; replay protection.
    pub nonce: u128,
    /// Unix seconds; 0 means no expiry.
    pub expiry: u64,
    pub submitted_at: DateTime<Utc>,
}

impl Order {
    /// Whether this order participates in the buy auction
    /// (taker-buy demand vs maker-sell supply) or the sell auction.
    #[must_use]
    pub fn auction_side(&self) -> crate::AuctionSide {
        crate::AuctionSide::of(self.side, self.flow)
    }
}

/// Mutable companion record of an [`Order`].
///
/// `claimed_qty` only ever grows and `remaining_qty` only ever shrinks;
/// their sum never exceeds the original quantity. Once `cancelled`, the
/// record is frozen except for historical reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub remaining_qty: u128,
    pub claimed_qty: u128,
    pub cancelled: bool,
}

impl OrderState {
    /// Fresh state for a newly-submitted order.
    #[must_use]
    pub fn open(qty: u128) -> Self {
        Self {
            remaining_qty: qty,
            claimed_qty: 0,
            cancelled: false,
        }
    }

    /// Apply a monotone update: `claimed` may only grow, `remaining` may only
    /// shrink, and the pair must stay within the original quantity.
    ///
    /// # Errors
    /// Returns `StateMonotonicity` if the update would move either counter
    /// the wrong way or exceed `original_qty`.
    pub fn update(&mut self, claimed: u128, remaining: u128, original_qty: u128) -> Result<()> {
        if claimed < self.claimed_qty
            || remaining > self.remaining_qty
            || claimed.checked_add(remaining).is_none_or(|sum| sum > original_qty)
        {
            return Err(FbaError::StateMonotonicity {
                claimed,
                remaining,
                original_qty,
            });
        }
        self.claimed_qty = claimed;
        self.remaining_qty = remaining;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn dummy(
        trader: TraderId,
        market_id: MarketId,
        batch_id: BatchId,
        side: Side,
        flow: Flow,
        price_tick: i32,
        qty: u128,
        nonce: u128,
    ) -> Self {
        let expiry = 0;
        Self {
            id: OrderId::derive(trader, market_id, batch_id, side, flow, price_tick, qty, nonce, expiry),
            trader,
            market_id,
            batch_id,
            side,
            flow,
            price_tick,
            qty,
            nonce,
            expiry,
            submitted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn dummy_maker(side: Side, price_tick: i32, qty: u128) -> Self {
        Self::dummy(TraderId::new(), MarketId(0), BatchId(0), side, Flow::Maker, price_tick, qty, 0)
    }

    #[must_use]
    pub fn dummy_taker(side: Side, price_tick: i32, qty: u128) -> Self {
        Self::dummy(TraderId::new(), MarketId(0), BatchId(0), side, Flow::Taker, price_tick, qty, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuctionSide;

    #[test]
    fn side_and_flow_display() {
        assert_eq!(format!("{}", Side::Buy), "BUY");
        assert_eq!(format!("{}", Side::Sell), "SELL");
        assert_eq!(format!("{}", Flow::Maker), "MAKER");
        assert_eq!(format!("{}", Flow::Taker), "TAKER");
    }

    #[test]
    fn auction_side_mapping() {
        assert_eq!(Order::dummy_taker(Side::Buy, 900, 1).auction_side(), AuctionSide::Buy);
        assert_eq!(Order::dummy_maker(Side::Sell, 900, 1).auction_side(), AuctionSide::Buy);
        assert_eq!(Order::dummy_taker(Side::Sell, 900, 1).auction_side(), AuctionSide::Sell);
        assert_eq!(Order::dummy_maker(Side::Buy, 900, 1).auction_side(), AuctionSide::Sell);
    }

    #[test]
    fn open_state() {
        let state = OrderState::open(100);
        assert_eq!(state.remaining_qty, 100);
        assert_eq!(state.claimed_qty, 0);
        assert!(!state.cancelled);
    }

    #[test]
    fn monotone_update_accepts_claim() {
        let mut state = OrderState::open(100);
        state.update(75, 25, 100).unwrap();
        assert_eq!(state.claimed_qty, 75);
        assert_eq!(state.remaining_qty, 25);
    }

    #[test]
    fn update_rejects_shrinking_claim() {
        let mut state = OrderState::open(100);
        state.update(75, 25, 100).unwrap();
        let err = state.update(50, 25, 100).unwrap_err();
        assert!(matches!(err, FbaError::StateMonotonicity { .. }));
        assert_eq!(state.claimed_qty, 75);
    }

    #[test]
    fn update_rejects_growing_remaining() {
        let mut state = OrderState::open(100);
        state.update(75, 25, 100).unwrap();
        let err = state.update(75, 30, 100).unwrap_err();
        assert!(matches!(err, FbaError::StateMonotonicity { .. }));
    }

    #[test]
    fn update_rejects_exceeding_original() {
        let mut state = OrderState::open(100);
        let err = state.update(80, 30, 100).unwrap_err();
        assert!(matches!(err, FbaError::StateMonotonicity { .. }));
    }

    #[test]
    fn order_serde_roundtrip() {
        let order = Order::dummy_maker(Side::Sell, 900, 100);
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.id, back.id);
        assert_eq!(order.price_tick, back.price_tick);
        assert_eq!(order.qty, back.qty);
    }
}
