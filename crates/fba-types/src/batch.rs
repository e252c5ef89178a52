//! Batch lifecycle phases.
//!
//! Each batch progresses **OPEN → ENDED → CLEARING_BUY → CLEARING_SELL →
//! FINALIZED**. Only OPEN batches accept submits and cancels; only
//! FINALIZED batches expose clearing results and accept claims.

use serde::{Deserialize, Serialize};

/// The non-overlapping phases of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchPhase {
    /// Collecting orders; ends when the batch window elapses.
    Open,
    /// Window elapsed; waiting for the first finalize step.
    Ended,
    /// Scanning ticks upward for the buy-auction clearing.
    ClearingBuy,
    /// Scanning ticks downward for the sell-auction clearing.
    ClearingSell,
    /// Both clearings stored; claims may proceed.
    Finalized,
}

impl BatchPhase {
    /// Whether the batch still accepts submits and cancels.
    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }

    /// Whether finalization has fully completed.
    #[must_use]
    pub fn is_finalized(self) -> bool {
        self == Self::Finalized
    }
}

impl std::fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Ended => write!(f, "ENDED"),
            Self::ClearingBuy => write!(f, "CLEARING_BUY"),
            Self::ClearingSell => write!(f, "CLEARING_SELL"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display() {
        assert_eq!(format!("{}", BatchPhase::Open), "OPEN");
        assert_eq!(format!("{}", BatchPhase::Ended), "ENDED");
        assert_eq!(format!("{}", BatchPhase::ClearingBuy), "CLEARING_BUY");
        assert_eq!(format!("{}", BatchPhase::ClearingSell), "CLEARING_SELL");
        assert_eq!(format!("{}", BatchPhase::Finalized), "FINALIZED");
    }

    #[test]
    fn phase_predicates() {
        assert!(BatchPhase::Open.is_open());
        assert!(!BatchPhase::Ended.is_open());
        assert!(BatchPhase::Finalized.is_finalized());
        assert!(!BatchPhase::ClearingSell.is_finalized());
    }

    #[test]
    fn phase_serde_roundtrip() {
        let phase = BatchPhase::ClearingBuy;
        let json = serde_json::to_string(&phase).unwrap();
        let back: BatchPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(phase, back);
    }
}
