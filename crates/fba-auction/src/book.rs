//! Per-batch book: tick aggregates, bitmap, nonces, and scan progress.
//!
//! The book keeps three structures coherent under arbitrary submit/cancel
//! sequences: the per-tick [`TickLevel`] totals, the sparse [`TickBitmap`]
//! (bit set ⇔ level non-empty), and the running taker totals the clearing
//! scans use as demand.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use fba_clearing::{ScanCursor, TickBitmap};
use fba_types::{BatchPhase, Flow, Order, Result, Side, TickLevel, TraderId};

/// All mutable state of one `(market, batch)` pair.
#[derive(Debug, Clone)]
pub struct BatchBook {
    levels: HashMap<i32, TickLevel>,
    bitmap: TickBitmap,
    /// `(trader, nonce)` pairs seen this batch; replay protection.
    nonces: HashSet<(TraderId, u128)>,
    /// Σ taker-buy quantity over all ticks — the buy scan's demand.
    taker_buy_total: u128,
    /// Σ taker-sell quantity over all ticks — the sell scan's demand.
    taker_sell_total: u128,
    /// When this batch began collecting.
    pub start: DateTime<Utc>,
    pub phase: BatchPhase,
    /// Persisted scan position while CLEARING_BUY / CLEARING_SELL.
    pub cursor: Option<ScanCursor>,
}

impl BatchBook {
    #[must_use]
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            levels: HashMap::new(),
            bitmap: TickBitmap::new(),
            nonces: HashSet::new(),
            taker_buy_total: 0,
            taker_sell_total: 0,
            start,
            phase: BatchPhase::Open,
            cursor: None,
        }
    }

    /// Record a submitted order: aggregate, bitmap bit, taker total, nonce.
    ///
    /// # Errors
    /// Returns `AggregateOverflow` on a wrapping bucket; nothing is written
    /// in that case.
    pub fn apply_submit(&mut self, order: &Order) -> Result<()> {
        // Pre-compute the taker total so a failure leaves nothing written.
        let new_total = match order.flow {
            Flow::Taker => Some(
                self.taker_total(order.side)
                    .checked_add(order.qty)
                    .ok_or(fba_types::FbaError::AggregateOverflow {
                        side: order.side,
                        flow: order.flow,
                    })?,
            ),
            Flow::Maker => None,
        };
        let level = self.levels.entry(order.price_tick).or_default();
        if let Err(err) = level.add(order.side, order.flow, order.qty) {
            if level.is_empty() {
                self.levels.remove(&order.price_tick);
            }
            return Err(err);
        }
        self.bitmap.set(order.price_tick);
        if let Some(total) = new_total {
            match order.side {
                Side::Buy => self.taker_buy_total = total,
                Side::Sell => self.taker_sell_total = total,
            }
        }
        self.nonces.insert((order.trader, order.nonce));
        Ok(())
    }

    /// Undo a resting order: aggregate, bitmap bit if the level empties,
    /// taker total. The nonce stays burned.
    ///
    /// # Errors
    /// Returns `AggregateUnderflow` when the book lost track of resting
    /// quantity — the caller must halt the market.
    pub fn apply_cancel(&mut self, order: &Order) -> Result<()> {
        let level = self
            .levels
            .get_mut(&order.price_tick)
            .ok_or(fba_types::FbaError::AggregateUnderflow {
                side: order.side,
                flow: order.flow,
            })?;
        level.sub(order.side, order.flow, order.qty)?;
        if level.is_empty() {
            self.levels.remove(&order.price_tick);
            self.bitmap.clear(order.price_tick);
        }
        match (order.side, order.flow) {
            (Side::Buy, Flow::Taker) => {
                self.taker_buy_total = self
                    .taker_buy_total
                    .checked_sub(order.qty)
                    .ok_or(fba_types::FbaError::AggregateUnderflow {
                        side: order.side,
                        flow: order.flow,
                    })?;
            }
            (Side::Sell, Flow::Taker) => {
                self.taker_sell_total = self
                    .taker_sell_total
                    .checked_sub(order.qty)
                    .ok_or(fba_types::FbaError::AggregateUnderflow {
                        side: order.side,
                        flow: order.flow,
                    })?;
            }
            _ => {}
        }
        Ok(())
    }

    #[must_use]
    pub fn nonce_used(&self, trader: TraderId, nonce: u128) -> bool {
        self.nonces.contains(&(trader, nonce))
    }

    #[must_use]
    pub fn level(&self, tick: i32) -> TickLevel {
        self.levels.get(&tick).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn levels(&self) -> &HashMap<i32, TickLevel> {
        &self.levels
    }

    #[must_use]
    pub fn bitmap(&self) -> &TickBitmap {
        &self.bitmap
    }

    #[must_use]
    pub fn taker_total(&self, side: Side) -> u128 {
        match side {
            Side::Buy => self.taker_buy_total,
            Side::Sell => self.taker_sell_total,
        }
    }

    /// Coherence check: every stored level non-empty with its bit set, and
    /// no bit set without a level. Test and audit hook.
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.levels
            .iter()
            .all(|(tick, level)| !level.is_empty() && self.bitmap.is_set(*tick))
            && {
                let mut from = fba_types::constants::MIN_TICK;
                loop {
                    match self.bitmap.next_active(from, fba_types::constants::MAX_TICK) {
                        None => break true,
                        Some(tick) => {
                            if self.levels.get(&tick).is_none_or(TickLevel::is_empty) {
                                break false;
                            }
                            if tick == fba_types::constants::MAX_TICK {
                                break true;
                            }
                            from = tick + 1;
                        }
                    }
                }
            }
    }
}

#[cfg(test)]
mod tests {
    use fba_types::{FbaError, Order};

    use super::*;

    fn book() -> BatchBook {
        BatchBook::open(Utc::now())
    }

    #[test]
    fn submit_sets_level_and_bit() {
        let mut book = book();
        let order = Order::dummy_maker(Side::Buy, 1000, 100);
        book.apply_submit(&order).unwrap();

        assert_eq!(book.level(1000).maker_buy, 100);
        assert!(book.bitmap().is_set(1000));
        assert!(book.is_coherent());
    }

    #[test]
    fn cancel_restores_pre_submit_state() {
        let mut book = book();
        let order = Order::dummy_maker(Side::Buy, 1000, 100);
        book.apply_submit(&order).unwrap();
        book.apply_cancel(&order).unwrap();

        assert_eq!(book.level(1000), TickLevel::default());
        assert!(!book.bitmap().is_set(1000));
        assert!(book.is_coherent());
    }

    #[test]
    fn cancel_keeps_bit_while_level_occupied() {
        let mut book = book();
        let a = Order::dummy_maker(Side::Buy, 1000, 100);
        let b = Order::dummy_maker(Side::Sell, 1000, 50);
        book.apply_submit(&a).unwrap();
        book.apply_submit(&b).unwrap();

        book.apply_cancel(&a).unwrap();
        assert!(book.bitmap().is_set(1000));
        assert_eq!(book.level(1000).maker_sell, 50);
        assert!(book.is_coherent());
    }

    #[test]
    fn taker_totals_track_submissions() {
        let mut book = book();
        let buy = Order::dummy_taker(Side::Buy, 900, 70);
        let sell = Order::dummy_taker(Side::Sell, 800, 30);
        book.apply_submit(&buy).unwrap();
        book.apply_submit(&sell).unwrap();
        assert_eq!(book.taker_total(Side::Buy), 70);
        assert_eq!(book.taker_total(Side::Sell), 30);

        book.apply_cancel(&buy).unwrap();
        assert_eq!(book.taker_total(Side::Buy), 0);
        assert_eq!(book.taker_total(Side::Sell), 30);
    }

    #[test]
    fn nonce_burned_on_submit_and_stays_burned() {
        let mut book = book();
        let order = Order::dummy_maker(Side::Buy, 1000, 100);
        assert!(!book.nonce_used(order.trader, order.nonce));
        book.apply_submit(&order).unwrap();
        assert!(book.nonce_used(order.trader, order.nonce));
        book.apply_cancel(&order).unwrap();
        assert!(book.nonce_used(order.trader, order.nonce));
    }

    #[test]
    fn cancel_of_untracked_tick_underflows() {
        let mut book = book();
        let order = Order::dummy_maker(Side::Buy, 1000, 100);
        let err = book.apply_cancel(&order).unwrap_err();
        assert!(matches!(err, FbaError::AggregateUnderflow { .. }));
    }
}
