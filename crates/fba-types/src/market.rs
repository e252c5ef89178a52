//! Market types for the FBA batch auction core.
//!
//! A market owns its batch sequence, aggregates, and clearing results
//! exclusively; distinct markets share no mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchId, MarketId, OracleId};

/// Token identifier (e.g., "BTC", "USDC"). Contract-like identity keyed by
/// symbol; the vault partitions balances per token.
pub type Token = String;

/// What the market trades and which collaterals back it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketKind {
    /// Base/quote token pair settled by escrow transfers.
    Spot { base: Token, quote: Token },
    /// Perpetual future: positions in the contract, margined in `collateral`,
    /// marked against `oracle`.
    Perp { collateral: Token, oracle: OracleId },
}

impl MarketKind {
    #[must_use]
    pub fn is_spot(&self) -> bool {
        matches!(self, Self::Spot { .. })
    }

    #[must_use]
    pub fn is_perp(&self) -> bool {
        matches!(self, Self::Perp { .. })
    }
}

impl std::fmt::Display for MarketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spot { base, quote } => write!(f, "SPOT {base}/{quote}"),
            Self::Perp { collateral, oracle } => write!(f, "PERP {collateral} ({oracle})"),
        }
    }
}

/// A market and its current batch window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub kind: MarketKind,
    /// Inactive markets reject submissions; a fatal invariant violation
    /// also flips this off.
    pub active: bool,
    /// The batch currently collecting orders.
    pub batch_id: BatchId,
    /// When the current batch started collecting.
    pub batch_start: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_predicates() {
        let spot = MarketKind::Spot {
            base: "BTC".into(),
            quote: "USDC".into(),
        };
        assert!(spot.is_spot());
        assert!(!spot.is_perp());

        let perp = MarketKind::Perp {
            collateral: "USDC".into(),
            oracle: OracleId(1),
        };
        assert!(perp.is_perp());
    }

    #[test]
    fn kind_display() {
        let spot = MarketKind::Spot {
            base: "BTC".into(),
            quote: "USDC".into(),
        };
        assert_eq!(format!("{spot}"), "SPOT BTC/USDC");
    }

    #[test]
    fn market_serde_roundtrip() {
        let market = Market {
            id: MarketId(3),
            kind: MarketKind::Spot {
                base: "ETH".into(),
                quote: "USDC".into(),
            },
            active: true,
            batch_id: BatchId(0),
            batch_start: Utc::now(),
        };
        let json = serde_json::to_string(&market).unwrap();
        let back: Market = serde_json::from_str(&json).unwrap();
        assert_eq!(market.id, back.id);
        assert_eq!(market.kind, back.kind);
    }
}
