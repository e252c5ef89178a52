//! Per-tick aggregate totals.
//!
//! Every `(market, batch, tick)` holds four quantity buckets, one per
//! `(side, flow)` pair. The book's bitmap bit for a tick is set exactly
//! when at least one bucket is non-zero.

use serde::{Deserialize, Serialize};

use crate::{FbaError, Flow, Result, Side};

/// Aggregate open quantity resting at one tick of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickLevel {
    pub maker_buy: u128,
    pub maker_sell: u128,
    pub taker_buy: u128,
    pub taker_sell: u128,
}

impl TickLevel {
    /// The bucket for a `(side, flow)` pair.
    #[must_use]
    pub fn qty(&self, side: Side, flow: Flow) -> u128 {
        match (side, flow) {
            (Side::Buy, Flow::Maker) => self.maker_buy,
            (Side::Sell, Flow::Maker) => self.maker_sell,
            (Side::Buy, Flow::Taker) => self.taker_buy,
            (Side::Sell, Flow::Taker) => self.taker_sell,
        }
    }

    /// Add `qty` to the matching bucket.
    ///
    /// # Errors
    /// Returns `AggregateOverflow` if the bucket would wrap.
    pub fn add(&mut self, side: Side, flow: Flow, qty: u128) -> Result<()> {
        let bucket = self.bucket_mut(side, flow);
        *bucket = bucket
            .checked_add(qty)
            .ok_or(FbaError::AggregateOverflow { side, flow })?;
        Ok(())
    }

    /// Subtract `qty` from the matching bucket.
    ///
    /// An underflow here means the book lost track of resting quantity —
    /// a bug, not a user error — and the caller must halt the market.
    ///
    /// # Errors
    /// Returns `AggregateUnderflow` if the bucket holds less than `qty`.
    pub fn sub(&mut self, side: Side, flow: Flow, qty: u128) -> Result<()> {
        let bucket = self.bucket_mut(side, flow);
        *bucket = bucket
            .checked_sub(qty)
            .ok_or(FbaError::AggregateUnderflow { side, flow })?;
        Ok(())
    }

    /// Whether all four buckets are zero (bitmap bit must be clear).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maker_buy == 0 && self.maker_sell == 0 && self.taker_buy == 0 && self.taker_sell == 0
    }

    fn bucket_mut(&mut self, side: Side, flow: Flow) -> &mut u128 {
        match (side, flow) {
            (Side::Buy, Flow::Maker) => &mut self.maker_buy,
            (Side::Sell, Flow::Maker) => &mut self.maker_sell,
            (Side::Buy, Flow::Taker) => &mut self.taker_buy,
            (Side::Sell, Flow::Taker) => &mut self.taker_sell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_routes_to_matching_bucket() {
        let mut level = TickLevel::default();
        level.add(Side::Buy, Flow::Maker, 10).unwrap();
        level.add(Side::Sell, Flow::Maker, 20).unwrap();
        level.add(Side::Buy, Flow::Taker, 30).unwrap();
        level.add(Side::Sell, Flow::Taker, 40).unwrap();

        assert_eq!(level.maker_buy, 10);
        assert_eq!(level.maker_sell, 20);
        assert_eq!(level.taker_buy, 30);
        assert_eq!(level.taker_sell, 40);
        assert_eq!(level.qty(Side::Buy, Flow::Taker), 30);
    }

    #[test]
    fn add_then_sub_restores_empty() {
        let mut level = TickLevel::default();
        level.add(Side::Buy, Flow::Maker, 100).unwrap();
        assert!(!level.is_empty());
        level.sub(Side::Buy, Flow::Maker, 100).unwrap();
        assert!(level.is_empty());
    }

    #[test]
    fn sub_underflow_is_an_error() {
        let mut level = TickLevel::default();
        level.add(Side::Sell, Flow::Maker, 5).unwrap();
        let err = level.sub(Side::Sell, Flow::Maker, 6).unwrap_err();
        assert!(matches!(err, FbaError::AggregateUnderflow { .. }));
        // Bucket untouched on failure.
        assert_eq!(level.maker_sell, 5);
    }

    #[test]
    fn add_overflow_is_an_error() {
        let mut level = TickLevel::default();
        level.add(Side::Buy, Flow::Taker, u128::MAX).unwrap();
        let err = level.add(Side::Buy, Flow::Taker, 1).unwrap_err();
        assert!(matches!(err, FbaError::AggregateOverflow { .. }));
    }
}
