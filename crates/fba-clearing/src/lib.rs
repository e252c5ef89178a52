//! # fba-clearing
//!
//! **Pure deterministic clearing engine for the FBA core.**
//!
//! This is the compute plane — it reads a batch's per-tick aggregates and
//! bitmap and produces uniform-price [`Clearing`](fba_types::Clearing)
//! results. It has:
//!
//! - **Zero side effects**: no state writes, no balance checks, no clocks
//! - **Deterministic output**: same aggregates -> same clearing everywhere
//! - **Bounded steps**: scans resume from a persisted cursor, so callers
//!   amortize long clearings across many small calls

pub mod bitmap;
pub mod engine;
pub mod entitlement;

pub use bitmap::{TickBitmap, Word256};
pub use engine::{ScanCursor, ScanOutcome, step_buy_scan, step_sell_scan};
pub use entitlement::{filled_qty, in_the_money};
