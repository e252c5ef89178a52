//! The auction house: single writer for markets, books, and clearings.
//!
//! Every operation takes an explicit `now` so batch-window semantics are
//! deterministic under test and the engine can be driven by any scheduler.
//! All writes validate first and mutate last — a failed operation leaves
//! orders, aggregates, bitmap, and state untouched.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use fba_clearing::{ScanCursor, ScanOutcome, step_buy_scan, step_sell_scan};
use fba_types::{
    AdminCap, AuctionSide, BatchId, BatchPhase, Clearing, EngineConfig, EngineEvent, FbaError,
    Flow, Market, MarketId, MarketKind, Order, OrderId, OrderState, Result, SettlerCap, Side,
    TickLevel, TraderId, valid_tick,
};

use crate::book::BatchBook;

/// Long-lived state owner for one shard of markets.
///
/// All operations on a market are linearized through `&mut self`; distinct
/// houses (shards) share nothing.
pub struct AuctionHouse {
    config: EngineConfig,
    markets: BTreeMap<MarketId, Market>,
    books: HashMap<(MarketId, BatchId), BatchBook>,
    orders: HashMap<OrderId, Order>,
    states: HashMap<OrderId, OrderState>,
    clearings: HashMap<(MarketId, BatchId, AuctionSide), Clearing>,
    /// Registered settler capability ids; unregistered caps fail writes.
    settlers: HashSet<u64>,
    next_settler_id: u64,
    next_market_id: u64,
    events: Vec<EngineEvent>,
}

impl AuctionHouse {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            markets: BTreeMap::new(),
            books: HashMap::new(),
            orders: HashMap::new(),
            states: HashMap::new(),
            clearings: HashMap::new(),
            settlers: HashSet::new(),
            next_settler_id: 0,
            next_market_id: 0,
            events: Vec::new(),
        }
    }

    // =====================================================================
    // Admin surface
    // =====================================================================

    /// Create a market and open its first batch.
    ///
    /// # Errors
    /// `InvalidToken` for empty or self-paired tokens, `DuplicateMarket`
    /// when the same kind already trades.
    pub fn create_market(
        &mut self,
        _admin: &AdminCap,
        kind: MarketKind,
        now: DateTime<Utc>,
    ) -> Result<MarketId> {
        match &kind {
            MarketKind::Spot { base, quote } => {
                if base.is_empty() || quote.is_empty() {
                    return Err(FbaError::InvalidToken {
                        reason: "empty token symbol".into(),
                    });
                }
                if base == quote {
                    return Err(FbaError::InvalidToken {
                        reason: format!("base and quote are both {base}"),
                    });
                }
            }
            MarketKind::Perp { collateral, .. } => {
                if collateral.is_empty() {
                    return Err(FbaError::InvalidToken {
                        reason: "empty collateral symbol".into(),
                    });
                }
            }
        }
        if self.markets.values().any(|m| m.kind == kind) {
            return Err(FbaError::DuplicateMarket);
        }

        let id = MarketId(self.next_market_id);
        self.next_market_id += 1;
        self.markets.insert(
            id,
            Market {
                id,
                kind,
                active: true,
                batch_id: BatchId(0),
                batch_start: now,
            },
        );
        self.books.insert((id, BatchId(0)), BatchBook::open(now));
        tracing::info!(market = %id, "Market created");
        Ok(id)
    }

    /// Pause or resume a market. Halted markets can be resumed only after
    /// operator intervention; the flag is the same.
    ///
    /// # Errors
    /// `MarketNotFound` for unknown ids.
    pub fn set_market_active(
        &mut self,
        _admin: &AdminCap,
        market_id: MarketId,
        active: bool,
    ) -> Result<()> {
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(FbaError::MarketNotFound(market_id))?;
        market.active = active;
        tracing::info!(market = %market_id, active, "Market activity changed");
        Ok(())
    }

    /// Issue a settler capability and register it for state writes.
    pub fn register_settler(&mut self, _admin: &AdminCap) -> SettlerCap {
        let id = self.next_settler_id;
        self.next_settler_id += 1;
        self.settlers.insert(id);
        SettlerCap::with_id(id)
    }

    /// Revoke a previously-issued settler capability.
    pub fn revoke_settler(&mut self, _admin: &AdminCap, cap: SettlerCap) {
        self.settlers.remove(&cap.id());
    }

    // =====================================================================
    // Order surface
    // =====================================================================

    /// Submit an order into the market's open batch.
    ///
    /// If the previous batch has ended, this first runs up to the
    /// configured number of finalization steps on the submitter's behalf;
    /// only once the old batch is FINALIZED does the next batch open (with
    /// this order as its first entry). The roll-over is atomic with the
    /// submission: either the order lands in the new batch or nothing
    /// changes.
    ///
    /// # Errors
    /// Validation failures per the table in the crate docs; fatal aggregate
    /// errors halt the market.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_order(
        &mut self,
        trader: TraderId,
        market_id: MarketId,
        side: Side,
        flow: Flow,
        price_tick: i32,
        qty: u128,
        nonce: u128,
        expiry: u64,
        now: DateTime<Utc>,
    ) -> Result<(OrderId, BatchId)> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(FbaError::MarketNotFound(market_id))?;
        if !market.active {
            return Err(FbaError::MarketInactive(market_id));
        }
        if qty == 0 {
            return Err(FbaError::ZeroQty);
        }
        if !valid_tick(price_tick) {
            return Err(FbaError::InvalidTick { tick: price_tick });
        }

        // Roll the batch over if the previous window has elapsed.
        let mut batch_id = market.batch_id;
        let mut batch_start = market.batch_start;
        if now >= self.window_end(batch_start) {
            if let Some(book) = self.books.get_mut(&(market_id, batch_id)) {
                if book.phase == BatchPhase::Open {
                    book.phase = BatchPhase::Ended;
                }
            }
            let (phase, done) = self.advance_finalize(
                market_id,
                batch_id,
                self.config.submit_finalize_steps,
            )?;
            if !done {
                tracing::debug!(market = %market_id, batch = %batch_id, %phase, "Roll-over pending");
                return Err(FbaError::ClearingInProgress(batch_id));
            }
            batch_id = batch_id.next();
            batch_start = now;
            self.books.insert((market_id, batch_id), BatchBook::open(now));
            if let Some(market) = self.markets.get_mut(&market_id) {
                market.batch_id = batch_id;
                market.batch_start = now;
            }
            tracing::info!(market = %market_id, batch = %batch_id, "Batch opened");
        }

        let end = self.window_end(batch_start);
        if expiry != 0 && i64::try_from(expiry).unwrap_or(i64::MAX) < end.timestamp() {
            return Err(FbaError::ExpiryBeforeBatchEnd { expiry });
        }

        let book = self
            .books
            .get_mut(&(market_id, batch_id))
            .ok_or(FbaError::BatchNotFound(batch_id))?;
        if book.nonce_used(trader, nonce) {
            return Err(FbaError::DuplicateNonce { nonce });
        }

        let order_id =
            OrderId::derive(trader, market_id, batch_id, side, flow, price_tick, qty, nonce, expiry);
        if self.orders.contains_key(&order_id) {
            return Err(FbaError::DuplicateOrder(order_id));
        }

        let order = Order {
            id: order_id,
            trader,
            market_id,
            batch_id,
            side,
            flow,
            price_tick,
            qty,
            nonce,
            expiry,
            submitted_at: now,
        };
        if let Err(err) = book.apply_submit(&order) {
            return Err(self.halt_market(market_id, err));
        }
        self.orders.insert(order_id, order);
        self.states.insert(order_id, OrderState::open(qty));
        self.events.push(EngineEvent::OrderSubmitted {
            order_id,
            trader,
            market_id,
            batch_id,
        });
        tracing::debug!(order = %order_id, market = %market_id, batch = %batch_id, %side, %flow, qty, "Order submitted");
        Ok((order_id, batch_id))
    }

    /// Cancel a resting order within its batch window.
    ///
    /// Restores the tick aggregate and clears the bitmap bit if the level
    /// empties; the nonce stays burned.
    ///
    /// # Errors
    /// Ownership, lifecycle, and window failures; fatal aggregate underflow
    /// halts the market.
    pub fn cancel_order(
        &mut self,
        trader: TraderId,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let order = self
            .orders
            .get(&order_id)
            .ok_or(FbaError::OrderNotFound(order_id))?
            .clone();
        if order.trader != trader {
            return Err(FbaError::NotOrderOwner(order_id));
        }
        let state = self
            .states
            .get(&order_id)
            .ok_or(FbaError::OrderNotFound(order_id))?;
        if state.cancelled {
            return Err(FbaError::AlreadyCancelled(order_id));
        }
        if state.claimed_qty > 0 {
            return Err(FbaError::AlreadyClaimed(order_id));
        }

        let market = self
            .markets
            .get(&order.market_id)
            .ok_or(FbaError::MarketNotFound(order.market_id))?;
        let window_open = market.batch_id == order.batch_id
            && now < self.window_end(market.batch_start);
        if !window_open {
            return Err(FbaError::BatchExpired(order.batch_id));
        }

        let book = self
            .books
            .get_mut(&(order.market_id, order.batch_id))
            .ok_or(FbaError::BatchNotFound(order.batch_id))?;
        if let Err(err) = book.apply_cancel(&order) {
            return Err(self.halt_market(order.market_id, err));
        }
        if let Some(state) = self.states.get_mut(&order_id) {
            state.cancelled = true;
            state.remaining_qty = 0;
        }
        self.events.push(EngineEvent::OrderCancelled {
            order_id,
            trader,
        });
        tracing::debug!(order = %order_id, "Order cancelled");
        Ok(())
    }

    /// Monotone order-state write, restricted to registered settlers.
    ///
    /// # Errors
    /// `NotSettler` for unregistered capabilities, `StateMonotonicity` if
    /// the update moves a counter the wrong way.
    pub fn update_order_state(
        &mut self,
        settler: &SettlerCap,
        order_id: OrderId,
        claimed: u128,
        remaining: u128,
    ) -> Result<()> {
        if !self.settlers.contains(&settler.id()) {
            return Err(FbaError::NotSettler);
        }
        let order = self
            .orders
            .get(&order_id)
            .ok_or(FbaError::OrderNotFound(order_id))?;
        let qty = order.qty;
        self.states
            .get_mut(&order_id)
            .ok_or(FbaError::OrderNotFound(order_id))?
            .update(claimed, remaining, qty)
    }

    // =====================================================================
    // Finalization state machine
    // =====================================================================

    /// Advance batch finalization by at most `max_steps` active ticks per
    /// clearing phase. Progress persists; re-entry resumes from the stored
    /// cursor and always advances strictly.
    ///
    /// # Errors
    /// `BatchNotEnded` while the window is open, `AlreadyFinalized` after
    /// completion.
    pub fn step_finalize(
        &mut self,
        market_id: MarketId,
        batch_id: BatchId,
        max_steps: u32,
        now: DateTime<Utc>,
    ) -> Result<(BatchPhase, bool)> {
        let (phase, start) = {
            let book = self
                .books
                .get(&(market_id, batch_id))
                .ok_or(FbaError::BatchNotFound(batch_id))?;
            (book.phase, book.start)
        };
        match phase {
            BatchPhase::Open => {
                if now < self.window_end(start) {
                    return Err(FbaError::BatchNotEnded(batch_id));
                }
                // Window elapsed: the book leaves OPEN even before the
                // first clearing step runs.
                if let Some(book) = self.books.get_mut(&(market_id, batch_id)) {
                    book.phase = BatchPhase::Ended;
                }
            }
            BatchPhase::Finalized => return Err(FbaError::AlreadyFinalized(batch_id)),
            _ => {}
        }
        self.advance_finalize(market_id, batch_id, max_steps)
    }

    /// Run the clearing phases under a step budget. The batch must already
    /// be past OPEN. Idempotent on FINALIZED batches (reports done).
    fn advance_finalize(
        &mut self,
        market_id: MarketId,
        batch_id: BatchId,
        max_steps: u32,
    ) -> Result<(BatchPhase, bool)> {
        loop {
            let book = self
                .books
                .get_mut(&(market_id, batch_id))
                .ok_or(FbaError::BatchNotFound(batch_id))?;
            match book.phase {
                BatchPhase::Open => return Err(FbaError::BatchNotEnded(batch_id)),
                BatchPhase::Ended => {
                    book.phase = BatchPhase::ClearingBuy;
                    book.cursor = Some(ScanCursor::start_buy());
                }
                BatchPhase::ClearingBuy => {
                    let cursor = book.cursor.unwrap_or_else(ScanCursor::start_buy);
                    let demand = book.taker_total(Side::Buy);
                    match step_buy_scan(book.levels(), book.bitmap(), demand, cursor, max_steps)? {
                        ScanOutcome::Pending(next) => {
                            book.cursor = Some(next);
                            return Ok((BatchPhase::ClearingBuy, false));
                        }
                        ScanOutcome::Complete(clearing) => {
                            book.phase = BatchPhase::ClearingSell;
                            book.cursor = Some(ScanCursor::start_sell());
                            self.store_clearing(market_id, batch_id, AuctionSide::Buy, clearing);
                        }
                    }
                }
                BatchPhase::ClearingSell => {
                    let cursor = book.cursor.unwrap_or_else(ScanCursor::start_sell);
                    let demand = book.taker_total(Side::Sell);
                    match step_sell_scan(book.levels(), book.bitmap(), demand, cursor, max_steps)? {
                        ScanOutcome::Pending(next) => {
                            book.cursor = Some(next);
                            return Ok((BatchPhase::ClearingSell, false));
                        }
                        ScanOutcome::Complete(clearing) => {
                            book.phase = BatchPhase::Finalized;
                            book.cursor = None;
                            self.store_clearing(market_id, batch_id, AuctionSide::Sell, clearing);
                        }
                    }
                }
                BatchPhase::Finalized => return Ok((BatchPhase::Finalized, true)),
            }
        }
    }

    fn store_clearing(
        &mut self,
        market_id: MarketId,
        batch_id: BatchId,
        side: AuctionSide,
        clearing: Clearing,
    ) {
        let clearing = clearing.finalize();
        tracing::info!(
            market = %market_id,
            batch = %batch_id,
            %side,
            tick = clearing.clearing_tick,
            cleared = clearing.cleared_qty,
            maker_bps = clearing.marginal_fill_maker_bps,
            taker_bps = clearing.marginal_fill_taker_bps,
            "Batch side finalized"
        );
        self.clearings.insert((market_id, batch_id, side), clearing);
        self.events.push(EngineEvent::BatchFinalized {
            market_id,
            batch_id,
            side,
        });
    }

    /// Deactivate the market after an invariant violation and pass the
    /// fatal error through.
    fn halt_market(&mut self, market_id: MarketId, err: FbaError) -> FbaError {
        if let Some(market) = self.markets.get_mut(&market_id) {
            market.active = false;
        }
        tracing::error!(market = %market_id, %err, "Market halted on invariant violation");
        err
    }

    // =====================================================================
    // Read surface
    // =====================================================================

    /// Market snapshot.
    ///
    /// # Errors
    /// `MarketNotFound`.
    pub fn market(&self, market_id: MarketId) -> Result<&Market> {
        self.markets
            .get(&market_id)
            .ok_or(FbaError::MarketNotFound(market_id))
    }

    /// All markets, id-ordered.
    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values()
    }

    /// Order snapshot.
    ///
    /// # Errors
    /// `OrderNotFound`.
    pub fn get_order(&self, order_id: OrderId) -> Result<&Order> {
        self.orders
            .get(&order_id)
            .ok_or(FbaError::OrderNotFound(order_id))
    }

    /// Order-state snapshot.
    ///
    /// # Errors
    /// `OrderNotFound`.
    pub fn get_order_state(&self, order_id: OrderId) -> Result<OrderState> {
        self.states
            .get(&order_id)
            .copied()
            .ok_or(FbaError::OrderNotFound(order_id))
    }

    /// Aggregate totals at a tick of a batch (zero level if untouched).
    ///
    /// # Errors
    /// `BatchNotFound`.
    pub fn get_tick_level(
        &self,
        market_id: MarketId,
        batch_id: BatchId,
        tick: i32,
    ) -> Result<TickLevel> {
        self.books
            .get(&(market_id, batch_id))
            .map(|book| book.level(tick))
            .ok_or(FbaError::BatchNotFound(batch_id))
    }

    /// Clearing result for one auction side of a finalized batch.
    ///
    /// # Errors
    /// `BatchNotFound` for unknown batches, `NotFinalized` before the side
    /// has cleared.
    pub fn get_clearing(
        &self,
        market_id: MarketId,
        batch_id: BatchId,
        side: AuctionSide,
    ) -> Result<Clearing> {
        if !self.books.contains_key(&(market_id, batch_id)) {
            return Err(FbaError::BatchNotFound(batch_id));
        }
        self.clearings
            .get(&(market_id, batch_id, side))
            .copied()
            .ok_or(FbaError::NotFinalized(batch_id))
    }

    /// Lifecycle phase of a batch.
    ///
    /// # Errors
    /// `BatchNotFound`.
    pub fn book_phase(&self, market_id: MarketId, batch_id: BatchId) -> Result<BatchPhase> {
        self.books
            .get(&(market_id, batch_id))
            .map(|book| book.phase)
            .ok_or(FbaError::BatchNotFound(batch_id))
    }

    /// The batch currently collecting orders.
    ///
    /// # Errors
    /// `MarketNotFound`.
    pub fn batch_id(&self, market_id: MarketId) -> Result<BatchId> {
        Ok(self.market(market_id)?.batch_id)
    }

    /// When the current batch stops accepting orders.
    ///
    /// # Errors
    /// `MarketNotFound`.
    pub fn batch_end(&self, market_id: MarketId) -> Result<DateTime<Utc>> {
        Ok(self.window_end(self.market(market_id)?.batch_start))
    }

    /// The configured batch window in seconds.
    #[must_use]
    pub fn batch_duration_secs(&self) -> u64 {
        self.config.batch_duration_secs
    }

    /// Whether a trader has burned `nonce` in the market's current batch.
    ///
    /// # Errors
    /// `MarketNotFound` / `BatchNotFound`.
    pub fn nonce_used(&self, market_id: MarketId, trader: TraderId, nonce: u128) -> Result<bool> {
        let batch_id = self.batch_id(market_id)?;
        self.books
            .get(&(market_id, batch_id))
            .map(|book| book.nonce_used(trader, nonce))
            .ok_or(FbaError::BatchNotFound(batch_id))
    }

    /// Drain accumulated events for indexers.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Direct book access for audits and tests.
    #[must_use]
    pub fn book(&self, market_id: MarketId, batch_id: BatchId) -> Option<&BatchBook> {
        self.books.get(&(market_id, batch_id))
    }

    fn window_end(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        let secs = i64::try_from(self.config.batch_duration_secs).unwrap_or(i64::MAX);
        let window = chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX);
        start
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
