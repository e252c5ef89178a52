//! # fba-auction
//!
//! **State-owner plane**: markets, per-batch order books, tick aggregates,
//! and the bounded finalization state machine.
//!
//! ## Architecture
//!
//! The [`AuctionHouse`] is the single writer for everything a batch
//! auction accumulates:
//! 1. **Markets**: created by the admin capability, paused or halted
//! 2. **BatchBook**: per-batch levels, bitmap, nonces, and running totals
//! 3. **Finalization**: `step_finalize` advances OPEN → ENDED →
//!    CLEARING_BUY → CLEARING_SELL → FINALIZED under a step budget
//! 4. **Order state**: monotone claim/remaining updates gated by a
//!    registered settler capability
//!
//! ## Order Flow
//!
//! ```text
//! submit → aggregates + bitmap updated → (window elapses) → step_finalize
//!        → Clearing stored per auction side → settlement claims read it
//! ```
//!
//! One `AuctionHouse` value per shard; `&mut self` linearizes all writes.

pub mod book;
pub mod house;

pub use book::BatchBook;
pub use house::AuctionHouse;
