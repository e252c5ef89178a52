//! Settlement claims: escrow lock at submit, payout/refund at claim.
//!
//! The settlement plane sits between traders and the auction house. On
//! submit it moves the worst-case cost into escrow and forwards the order;
//! on claim it reads the finalized clearing, computes the entitlement, and
//! drains the escrow legs. Perp markets reuse the same entitlement math
//! but book signed positions instead of moving tokens.
//!
//! Write ordering keeps claims atomic per order: every vault leg is
//! validated against the escrow balance before the first transfer, and
//! order state is only written after all transfers succeed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fba_auction::AuctionHouse;
use fba_clearing::{filled_qty, in_the_money};
use fba_types::math;
use fba_types::{
    BatchId, Clearing, EngineEvent, FbaError, Flow, MarketId, MarketKind, Order, OrderId, Result,
    SettlerCap, Side, TickPricer, Token, TraderId,
};

use crate::claim_guard::ClaimGuard;
use crate::fees::FeeModel;
use crate::locked::{LockLedger, LockedFunds};
use crate::oracle::Oracle;
use crate::positions::{Position, PositionBook};
use crate::vault::Vault;

/// Parameters of a new order, as traders hand them to settlement.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub trader: TraderId,
    pub market_id: MarketId,
    pub side: Side,
    pub flow: Flow,
    pub price_tick: i32,
    pub qty: u128,
    pub nonce: u128,
    pub expiry: u64,
}

/// What one claim paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClaimOutcome {
    pub order_id: OrderId,
    pub fill_qty: u128,
    /// WAD-scaled price the fill transacted at; 0 when nothing filled.
    pub fill_price: u128,
    pub fee: u128,
    pub refund_base: u128,
    pub refund_quote: u128,
}

/// The settlement plane: owns the vault handle, the fee model, the lock
/// ledger, and the claim guard. Holds a settler capability registered with
/// the auction house for order-state writes.
pub struct Settlement<V: Vault, F: FeeModel, P: TickPricer> {
    vault: V,
    fees: F,
    pricer: P,
    settler: SettlerCap,
    locks: LockLedger,
    guard: ClaimGuard,
    positions: PositionBook,
    events: Vec<EngineEvent>,
}

impl<V: Vault, F: FeeModel, P: TickPricer> Settlement<V, F, P> {
    #[must_use]
    pub fn new(vault: V, fees: F, pricer: P, settler: SettlerCap) -> Self {
        Self {
            vault,
            fees,
            pricer,
            settler,
            locks: LockLedger::new(),
            guard: ClaimGuard::new(fba_types::constants::DEFAULT_CLAIM_GUARD_CAPACITY),
            positions: PositionBook::new(),
            events: Vec::new(),
        }
    }

    // =====================================================================
    // Submission
    // =====================================================================

    /// Lock escrow for a spot order, then forward it to the auction house.
    ///
    /// Buys lock `notional + fee` of quote at the order's own tick; sells
    /// lock the base quantity. If the house rejects the order, the lock is
    /// unwound and nothing remains.
    ///
    /// # Errors
    /// Vault and house failures propagate; the escrow state is restored on
    /// any rejection.
    pub fn submit_spot(
        &mut self,
        house: &mut AuctionHouse,
        req: &OrderRequest,
        now: DateTime<Utc>,
    ) -> Result<(OrderId, BatchId)> {
        let MarketKind::Spot { base, quote } = house.market(req.market_id)?.kind.clone() else {
            return Err(FbaError::WrongMarketKind(req.market_id));
        };

        let price = self.pricer.tick_to_price(req.price_tick)?;
        let gross = math::notional(req.qty, price)?;
        let (fee, _) = self
            .fees
            .fee_for(req.market_id, req.flow == Flow::Maker, gross)?;
        let (lock_base, lock_quote) = match req.side {
            Side::Buy => (
                0,
                gross
                    .checked_add(fee)
                    .ok_or(FbaError::MathOverflow { context: "submit lock" })?,
            ),
            Side::Sell => (req.qty, 0),
        };

        if lock_base > 0 {
            self.vault
                .debit_credit(&base, req.trader, TraderId::ESCROW, lock_base)?;
        }
        if lock_quote > 0 {
            self.vault
                .debit_credit(&quote, req.trader, TraderId::ESCROW, lock_quote)?;
        }

        match house.submit_order(
            req.trader,
            req.market_id,
            req.side,
            req.flow,
            req.price_tick,
            req.qty,
            req.nonce,
            req.expiry,
            now,
        ) {
            Ok((order_id, batch_id)) => {
                self.locks.insert(
                    order_id,
                    LockedFunds {
                        base_token: base,
                        quote_token: quote,
                        base: lock_base,
                        quote: lock_quote,
                    },
                );
                self.events.push(EngineEvent::FundsLocked {
                    order_id,
                    trader: req.trader,
                    base: lock_base,
                    quote: lock_quote,
                });
                tracing::debug!(order = %order_id, base = lock_base, quote = lock_quote, "Escrow locked");
                Ok((order_id, batch_id))
            }
            Err(err) => {
                // Unwind the lock; the escrow just received these funds.
                if lock_base > 0 {
                    self.vault
                        .debit_credit(&base, TraderId::ESCROW, req.trader, lock_base)?;
                }
                if lock_quote > 0 {
                    self.vault
                        .debit_credit(&quote, TraderId::ESCROW, req.trader, lock_quote)?;
                }
                Err(err)
            }
        }
    }

    /// Forward a perp order without token escrow — margin reservation is
    /// the risk engine's concern, not settlement's.
    ///
    /// # Errors
    /// `WrongMarketKind` for spot markets; house failures propagate.
    pub fn submit_perp(
        &mut self,
        house: &mut AuctionHouse,
        req: &OrderRequest,
        now: DateTime<Utc>,
    ) -> Result<(OrderId, BatchId)> {
        if !house.market(req.market_id)?.kind.is_perp() {
            return Err(FbaError::WrongMarketKind(req.market_id));
        }
        house.submit_order(
            req.trader,
            req.market_id,
            req.side,
            req.flow,
            req.price_tick,
            req.qty,
            req.nonce,
            req.expiry,
            now,
        )
    }

    /// Cancel a spot order and refund its escrow lock.
    ///
    /// # Errors
    /// House cancellation failures propagate and leave the lock in place.
    pub fn cancel_spot(
        &mut self,
        house: &mut AuctionHouse,
        trader: TraderId,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        // Lock first: a cancel without a lock would half-apply.
        let lock = self.locks.get(order_id)?.clone();
        house.cancel_order(trader, order_id, now)?;

        self.pay_from_escrow(&[
            (lock.base_token.clone(), trader, lock.base),
            (lock.quote_token.clone(), trader, lock.quote),
        ])?;
        self.locks.remove(order_id);
        self.events.push(EngineEvent::FundsRefunded {
            order_id,
            trader,
            base: lock.base,
            quote: lock.quote,
        });
        tracing::debug!(order = %order_id, "Cancel refunded");
        Ok(())
    }

    // =====================================================================
    // Claims
    // =====================================================================

    /// Settle one order against its finalized clearing.
    ///
    /// Out-of-the-money orders refund their full lock; winners receive the
    /// fill at the uniform clearing price, the excess lock back, and the
    /// fee recipient its cut. Exactly-once: a second claim fails with
    /// `AlreadyClaimed` and changes nothing.
    ///
    /// # Errors
    /// Ownership, lifecycle, and finalization failures; vault failures
    /// abort before any state write.
    pub fn claim(
        &mut self,
        house: &mut AuctionHouse,
        caller: TraderId,
        order_id: OrderId,
    ) -> Result<ClaimOutcome> {
        let order = house.get_order(order_id)?.clone();
        if order.trader != caller {
            return Err(FbaError::NotOrderOwner(order_id));
        }
        let state = house.get_order_state(order_id)?;
        if state.cancelled {
            return Err(FbaError::AlreadyCancelled(order_id));
        }
        if state.claimed_qty > 0 || self.guard.is_claimed(order_id) {
            return Err(FbaError::AlreadyClaimed(order_id));
        }
        let clearing = house.get_clearing(order.market_id, order.batch_id, order.auction_side())?;

        let outcome = match house.market(order.market_id)?.kind.clone() {
            MarketKind::Spot { base, quote } => {
                self.claim_spot(house, &order, &clearing, &base, &quote)?
            }
            MarketKind::Perp { .. } => self.claim_perp(house, &order, &clearing)?,
        };
        self.guard.mark_claimed(order_id)?;
        self.events.push(EngineEvent::OrderClaimed {
            order_id,
            trader: order.trader,
            fill_qty: outcome.fill_qty,
            fill_price: outcome.fill_price,
            fee: outcome.fee,
        });
        tracing::info!(
            order = %order_id,
            fill = outcome.fill_qty,
            fee = outcome.fee,
            "Order claimed"
        );
        Ok(outcome)
    }

    /// Claim a batch of orders; each id succeeds or fails independently,
    /// and no order's state is ever half-written.
    pub fn claim_many(
        &mut self,
        house: &mut AuctionHouse,
        caller: TraderId,
        order_ids: &[OrderId],
    ) -> Vec<(OrderId, Result<ClaimOutcome>)> {
        order_ids
            .iter()
            .map(|&id| (id, self.claim(house, caller, id)))
            .collect()
    }

    fn claim_spot(
        &mut self,
        house: &mut AuctionHouse,
        order: &Order,
        clearing: &Clearing,
        base: &str,
        quote: &str,
    ) -> Result<ClaimOutcome> {
        let lock = self.locks.get(order.id)?.clone();

        if !in_the_money(order, clearing) {
            self.pay_from_escrow(&[
                (base.to_string(), order.trader, lock.base),
                (quote.to_string(), order.trader, lock.quote),
            ])?;
            house.update_order_state(&self.settler, order.id, 0, order.qty)?;
            self.locks.remove(order.id);
            self.events.push(EngineEvent::FundsRefunded {
                order_id: order.id,
                trader: order.trader,
                base: lock.base,
                quote: lock.quote,
            });
            return Ok(ClaimOutcome {
                order_id: order.id,
                fill_qty: 0,
                fill_price: 0,
                fee: 0,
                refund_base: lock.base,
                refund_quote: lock.quote,
            });
        }

        let fill = filled_qty(order, clearing)?;
        let fill_price = self.pricer.tick_to_price(clearing.clearing_tick)?;
        let fill_notional = math::notional(fill, fill_price)?;
        let (fee, recipient) =
            self.fees
                .fee_for(order.market_id, order.flow == Flow::Maker, fill_notional)?;

        let (legs, refund_base, refund_quote) = match order.side {
            Side::Buy => {
                let owed = fill_notional
                    .checked_add(fee)
                    .ok_or(FbaError::MathOverflow { context: "claim owed" })?;
                let refund_quote = lock.quote.checked_sub(owed).ok_or_else(|| {
                    FbaError::Internal(format!("lock under-collateralized for {}", order.id))
                })?;
                (
                    vec![
                        (base.to_string(), order.trader, fill),
                        (quote.to_string(), order.trader, refund_quote),
                        (quote.to_string(), recipient, fee),
                    ],
                    0,
                    refund_quote,
                )
            }
            Side::Sell => {
                let proceeds = fill_notional
                    .checked_sub(fee)
                    .ok_or(FbaError::MathOverflow { context: "claim proceeds" })?;
                let refund_base = lock.base.checked_sub(fill).ok_or_else(|| {
                    FbaError::Internal(format!("lock under-collateralized for {}", order.id))
                })?;
                (
                    vec![
                        (quote.to_string(), order.trader, proceeds),
                        (base.to_string(), order.trader, refund_base),
                        (quote.to_string(), recipient, fee),
                    ],
                    refund_base,
                    0,
                )
            }
        };

        self.pay_from_escrow(&legs)?;
        house.update_order_state(&self.settler, order.id, fill, order.qty - fill)?;
        self.locks.remove(order.id);
        if refund_base > 0 || refund_quote > 0 {
            self.events.push(EngineEvent::FundsRefunded {
                order_id: order.id,
                trader: order.trader,
                base: refund_base,
                quote: refund_quote,
            });
        }
        Ok(ClaimOutcome {
            order_id: order.id,
            fill_qty: fill,
            fill_price,
            fee,
            refund_base,
            refund_quote,
        })
    }

    fn claim_perp(
        &mut self,
        house: &mut AuctionHouse,
        order: &Order,
        clearing: &Clearing,
    ) -> Result<ClaimOutcome> {
        if !in_the_money(order, clearing) {
            house.update_order_state(&self.settler, order.id, 0, order.qty)?;
            return Ok(ClaimOutcome {
                order_id: order.id,
                fill_qty: 0,
                fill_price: 0,
                fee: 0,
                refund_base: 0,
                refund_quote: 0,
            });
        }

        let fill = filled_qty(order, clearing)?;
        let fill_price = self.pricer.tick_to_price(clearing.clearing_tick)?;
        let fill_notional = math::notional(fill, fill_price)?;
        self.positions
            .apply_fill(order.market_id, order.trader, order.side, fill, fill_notional)?;
        house.update_order_state(&self.settler, order.id, fill, order.qty - fill)?;
        Ok(ClaimOutcome {
            order_id: order.id,
            fill_qty: fill,
            fill_price,
            fee: 0,
            refund_base: 0,
            refund_quote: 0,
        })
    }

    /// Validate every leg against the escrow balance, then execute. A claim
    /// either moves all of its legs or none of them.
    fn pay_from_escrow(&mut self, legs: &[(Token, TraderId, u128)]) -> Result<()> {
        let mut needed: HashMap<&str, u128> = HashMap::new();
        for (token, _, amount) in legs {
            *needed.entry(token.as_str()).or_insert(0) += amount;
        }
        for (token, total) in needed {
            let available = self.vault.balance_of(TraderId::ESCROW, token);
            if available < total {
                return Err(FbaError::InsufficientBalance {
                    token: token.to_string(),
                    needed: total,
                    available,
                });
            }
        }
        for (token, to, amount) in legs {
            if *amount > 0 {
                self.vault
                    .debit_credit(token, TraderId::ESCROW, *to, *amount)?;
            }
        }
        Ok(())
    }

    // =====================================================================
    // Perp marks and read surface
    // =====================================================================

    /// Unrealized PnL of a trader's perp position at the oracle mark.
    ///
    /// # Errors
    /// `WrongMarketKind` for spot markets; oracle failures propagate.
    pub fn mark_to_market<O: Oracle>(
        &self,
        house: &AuctionHouse,
        oracle: &O,
        market_id: MarketId,
        trader: TraderId,
    ) -> Result<i128> {
        let MarketKind::Perp { oracle: oracle_id, .. } = &house.market(market_id)?.kind else {
            return Err(FbaError::WrongMarketKind(market_id));
        };
        let mark = oracle.price(*oracle_id)?;
        self.positions.position(market_id, trader).unrealized_pnl(mark)
    }

    #[must_use]
    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    pub fn fees_mut(&mut self) -> &mut F {
        &mut self.fees
    }

    #[must_use]
    pub fn locks(&self) -> &LockLedger {
        &self.locks
    }

    #[must_use]
    pub fn position(&self, market_id: MarketId, trader: TraderId) -> Position {
        self.positions.position(market_id, trader)
    }

    #[must_use]
    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    /// Drain accumulated settlement events for indexers.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}
