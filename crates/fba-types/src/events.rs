//! Engine events consumed by indexers.
//!
//! Every successful write operation emits exactly one event (plus funding
//! events from settlement). The auction house and settlement each keep a
//! drainable log; a polling indexer mirrors the log into its own cache.

use serde::{Deserialize, Serialize};

use crate::{AuctionSide, BatchId, MarketId, OrderId, TraderId};

/// Events emitted by the auction house and settlement planes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    OrderSubmitted {
        order_id: OrderId,
        trader: TraderId,
        market_id: MarketId,
        batch_id: BatchId,
    },
    OrderCancelled {
        order_id: OrderId,
        trader: TraderId,
    },
    BatchFinalized {
        market_id: MarketId,
        batch_id: BatchId,
        side: AuctionSide,
    },
    OrderClaimed {
        order_id: OrderId,
        trader: TraderId,
        fill_qty: u128,
        /// WAD-scaled price the fill transacted at; 0 for refund-only claims.
        fill_price: u128,
        fee: u128,
    },
    FundsLocked {
        order_id: OrderId,
        trader: TraderId,
        base: u128,
        quote: u128,
    },
    FundsRefunded {
        order_id: OrderId,
        trader: TraderId,
        base: u128,
        quote: u128,
    },
}
