//! Price-feed collaborator for perp markets.

use std::collections::HashMap;

use fba_types::{FbaError, OracleId, Result};

/// Read surface of an external price feed. Prices are WAD-scaled.
pub trait Oracle {
    /// Latest price for `oracle_id`.
    ///
    /// # Errors
    /// `OraclePriceUnavailable` when the feed has no price.
    fn price(&self, oracle_id: OracleId) -> Result<u128>;
}

/// Static oracle for tests and local runs.
#[derive(Debug, Default)]
pub struct FixedOracle {
    prices: HashMap<OracleId, u128>,
}

impl FixedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&mut self, oracle_id: OracleId, price_wad: u128) {
        self.prices.insert(oracle_id, price_wad);
    }
}

impl Oracle for FixedOracle {
    fn price(&self, oracle_id: OracleId) -> Result<u128> {
        self.prices
            .get(&oracle_id)
            .copied()
            .ok_or(FbaError::OraclePriceUnavailable(oracle_id))
    }
}
