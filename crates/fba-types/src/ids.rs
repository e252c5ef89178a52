//! Identifiers used throughout the FBA core.
//!
//! Trader identities use UUIDv7 for time-ordered lexicographic sorting.
//! Order ids are SHA-256 commitments over the order's immutable fields so
//! indexers and UIs can re-derive them off-process.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::{Flow, Side};

// ---------------------------------------------------------------------------
// TraderId
// ---------------------------------------------------------------------------

/// Unique identifier for a trader / trading account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TraderId(pub Uuid);

impl TraderId {
    /// Reserved account holding all escrowed funds.
    pub const ESCROW: Self = Self(Uuid::nil());

    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for TraderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MarketId
// ---------------------------------------------------------------------------

/// Sequential identifier for a market, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MarketId(pub u64);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mkt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a batch window within a market.
///
/// Each batch runs: OPEN → ENDED → CLEARING_BUY → CLEARING_SELL → FINALIZED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchId(pub u64);

impl BatchId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OracleId
// ---------------------------------------------------------------------------

/// Identifier of a price feed used by perp markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OracleId(pub u64);

impl fmt::Display for OracleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oracle:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Deterministic order identifier: SHA-256 over the order's immutable fields.
///
/// The byte layout is stable — fields are hashed little-endian in declaration
/// order behind a domain prefix, so any indexer can re-derive the id from the
/// submitted fields without talking to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub [u8; 32]);

impl OrderId {
    /// Derive the order id from the immutable order fields.
    ///
    /// Layout: `sha256("fba:order_id:v1:" || trader || market_id || batch_id
    /// || side || flow || price_tick || qty || nonce || expiry)` with all
    /// integers little-endian and `side`/`flow` as single discriminant bytes.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        trader: TraderId,
        market_id: MarketId,
        batch_id: BatchId,
        side: Side,
        flow: Flow,
        price_tick: i32,
        qty: u128,
        nonce: u128,
        expiry: u64,
    ) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"fba:order_id:v1:");
        hasher.update(trader.0.as_bytes());
        hasher.update(market_id.0.to_le_bytes());
        hasher.update(batch_id.0.to_le_bytes());
        hasher.update([side as u8]);
        hasher.update([flow as u8]);
        hasher.update(price_tick.to_le_bytes());
        hasher.update(qty.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.update(expiry.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trader_id_uniqueness() {
        let a = TraderId::new();
        let b = TraderId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn trader_id_ordering() {
        let a = TraderId::new();
        let b = TraderId::new();
        assert!(a < b);
    }

    #[test]
    fn escrow_account_is_nil() {
        assert_eq!(TraderId::ESCROW.0, Uuid::nil());
        assert_ne!(TraderId::new(), TraderId::ESCROW);
    }

    #[test]
    fn batch_id_next() {
        assert_eq!(BatchId(0).next(), BatchId(1));
        assert_eq!(BatchId(99).next(), BatchId(100));
    }

    #[test]
    fn order_id_is_deterministic() {
        let trader = TraderId::new();
        let a = OrderId::derive(
            trader,
            MarketId(1),
            BatchId(4),
            Side::Buy,
            Flow::Maker,
            900,
            100,
            7,
            0,
        );
        let b = OrderId::derive(
            trader,
            MarketId(1),
            BatchId(4),
            Side::Buy,
            Flow::Maker,
            900,
            100,
            7,
            0,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn order_id_sensitive_to_every_field() {
        let trader = TraderId::new();
        let base = OrderId::derive(
            trader,
            MarketId(1),
            BatchId(4),
            Side::Buy,
            Flow::Maker,
            900,
            100,
            7,
            0,
        );
        let variants = [
            OrderId::derive(TraderId::new(), MarketId(1), BatchId(4), Side::Buy, Flow::Maker, 900, 100, 7, 0),
            OrderId::derive(trader, MarketId(2), BatchId(4), Side::Buy, Flow::Maker, 900, 100, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(5), Side::Buy, Flow::Maker, 900, 100, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Sell, Flow::Maker, 900, 100, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Buy, Flow::Taker, 900, 100, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Buy, Flow::Maker, 901, 100, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Buy, Flow::Maker, 900, 101, 7, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Buy, Flow::Maker, 900, 100, 8, 0),
            OrderId::derive(trader, MarketId(1), BatchId(4), Side::Buy, Flow::Maker, 900, 100, 7, 60),
        ];
        for v in variants {
            assert_ne!(base, v);
        }
    }

    #[test]
    fn order_id_display_is_hex() {
        let id = OrderId([0xAB; 32]);
        assert_eq!(format!("{id}"), "order:abababababababab");
        assert_eq!(id.short(), "abababab");
    }

    #[test]
    fn serde_roundtrips() {
        let tid = TraderId::new();
        let json = serde_json::to_string(&tid).unwrap();
        let back: TraderId = serde_json::from_str(&json).unwrap();
        assert_eq!(tid, back);

        let oid = OrderId([7u8; 32]);
        let json = serde_json::to_string(&oid).unwrap();
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(oid, back);
    }
}
