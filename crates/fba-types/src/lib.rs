//! # fba-types
//!
//! Shared types, errors, and configuration for the **FBA** batch auction
//! exchange core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`TraderId`], [`MarketId`], [`BatchId`], [`OracleId`]
//! - **Order model**: [`Order`], [`OrderState`], [`Side`], [`Flow`]
//! - **Market model**: [`Market`], [`MarketKind`]
//! - **Tick model**: [`TickPricer`], [`LinearTickPricer`], tick bounds
//! - **Aggregates**: [`TickLevel`]
//! - **Clearing model**: [`Clearing`], [`AuctionSide`]
//! - **Batch model**: [`BatchPhase`]
//! - **Events**: [`EngineEvent`] for indexers
//! - **Capabilities**: [`AdminCap`], [`SettlerCap`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`FbaError`] with `FBA_ERR_` prefix codes
//! - **Constants**: tick range, `BPS`, `WAD`, batch defaults

pub mod auth;
pub mod batch;
pub mod clearing;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ids;
pub mod level;
pub mod market;
pub mod math;
pub mod order;
pub mod tick;

// Re-export all primary types at crate root for ergonomic imports:
//   use fba_types::{Order, Side, Clearing, TickLevel, ...};

pub use auth::*;
pub use batch::*;
pub use clearing::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use level::*;
pub use market::*;
pub use order::*;
pub use tick::*;

// Constants are accessed via `fba_types::constants::FOO`
// (not re-exported to avoid name collisions).
