//! Fee model collaborator.
//!
//! Fees are charged in quote token on the fill notional, with separate
//! maker and taker rates per market and a configurable recipient.

use std::collections::HashMap;

use fba_types::math::mul_bps;
use fba_types::{FbaError, MarketId, Result, TraderId};
use serde::{Deserialize, Serialize};

/// Per-market fee schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketFees {
    pub maker_bps: u16,
    pub taker_bps: u16,
    pub recipient: TraderId,
}

/// Pluggable fee schedule: `(fee_amount, recipient)` per market and role.
pub trait FeeModel {
    /// Fee owed on `notional` for a maker or taker fill in `market_id`.
    ///
    /// # Errors
    /// `MathOverflow` for notionals outside fixed-point range.
    fn fee_for(&self, market_id: MarketId, is_maker: bool, notional: u128) -> Result<(u128, TraderId)>;

    /// Install a market's fee schedule.
    ///
    /// # Errors
    /// `InvalidFeeBps` when either rate exceeds 10000.
    fn set_market_fees(
        &mut self,
        market_id: MarketId,
        maker_bps: u16,
        taker_bps: u16,
        recipient: TraderId,
    ) -> Result<()>;
}

/// Basis-point fee model with a zero-fee default for unconfigured markets.
#[derive(Debug, Default)]
pub struct BpsFeeModel {
    schedules: HashMap<MarketId, MarketFees>,
}

impl BpsFeeModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeeModel for BpsFeeModel {
    fn fee_for(&self, market_id: MarketId, is_maker: bool, notional: u128) -> Result<(u128, TraderId)> {
        let Some(schedule) = self.schedules.get(&market_id) else {
            return Ok((0, TraderId::ESCROW));
        };
        let bps = if is_maker {
            schedule.maker_bps
        } else {
            schedule.taker_bps
        };
        Ok((mul_bps(notional, bps)?, schedule.recipient))
    }

    fn set_market_fees(
        &mut self,
        market_id: MarketId,
        maker_bps: u16,
        taker_bps: u16,
        recipient: TraderId,
    ) -> Result<()> {
        if maker_bps > 10_000 {
            return Err(FbaError::InvalidFeeBps { bps: maker_bps });
        }
        if taker_bps > 10_000 {
            return Err(FbaError::InvalidFeeBps { bps: taker_bps });
        }
        self.schedules.insert(
            market_id,
            MarketFees {
                maker_bps,
                taker_bps,
                recipient,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_market_charges_nothing() {
        let fees = BpsFeeModel::new();
        let (fee, _) = fees.fee_for(MarketId(0), true, 1_000_000).unwrap();
        assert_eq!(fee, 0);
    }

    #[test]
    fn maker_and_taker_rates_differ() {
        let mut fees = BpsFeeModel::new();
        let treasury = TraderId::new();
        fees.set_market_fees(MarketId(0), 10, 30, treasury).unwrap();

        let (maker_fee, to) = fees.fee_for(MarketId(0), true, 1_000_000).unwrap();
        assert_eq!(maker_fee, 1_000);
        assert_eq!(to, treasury);

        let (taker_fee, _) = fees.fee_for(MarketId(0), false, 1_000_000).unwrap();
        assert_eq!(taker_fee, 3_000);
    }

    #[test]
    fn fee_floors() {
        let mut fees = BpsFeeModel::new();
        fees.set_market_fees(MarketId(0), 1, 1, TraderId::new()).unwrap();
        // 1 bps of 9999 floors to 0.
        let (fee, _) = fees.fee_for(MarketId(0), true, 9_999).unwrap();
        assert_eq!(fee, 0);
    }

    #[test]
    fn rates_capped_at_ten_thousand() {
        let mut fees = BpsFeeModel::new();
        let err = fees
            .set_market_fees(MarketId(0), 10_001, 0, TraderId::new())
            .unwrap_err();
        assert!(matches!(err, FbaError::InvalidFeeBps { bps: 10_001 }));
        let err = fees
            .set_market_fees(MarketId(0), 0, 10_001, TraderId::new())
            .unwrap_err();
        assert!(matches!(err, FbaError::InvalidFeeBps { bps: 10_001 }));
    }
}
