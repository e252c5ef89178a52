//! Token custody collaborator.
//!
//! The core never touches token balances directly — it drives a [`Vault`]
//! through two primitives: an internal balance move and a balance read.
//! Settlement owns the vault handle exclusively, so every escrow movement
//! is linearized through the claim plane.

use std::collections::HashMap;

use fba_types::{FbaError, Result, Token, TraderId};

/// Minimal custody surface the settlement plane requires.
pub trait Vault {
    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    /// Fails with `InsufficientBalance` when `from` holds less than
    /// `amount`; nothing moves in that case.
    fn debit_credit(&mut self, token: &str, from: TraderId, to: TraderId, amount: u128) -> Result<()>;

    /// Current internal balance of `user` in `token`.
    fn balance_of(&self, user: TraderId, token: &str) -> u128;
}

/// Reference in-memory vault.
///
/// Production deployments wrap real custody; this one backs tests and
/// local runs. `deposit` is the faucet where external funds enter.
#[derive(Debug, Default)]
pub struct InMemoryVault {
    balances: HashMap<(TraderId, Token), u128>,
}

impl InMemoryVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit freshly-deposited funds to a user.
    pub fn deposit(&mut self, user: TraderId, token: &str, amount: u128) {
        *self.balances.entry((user, token.to_string())).or_insert(0) += amount;
    }
}

impl Vault for InMemoryVault {
    fn debit_credit(&mut self, token: &str, from: TraderId, to: TraderId, amount: u128) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let from_key = (from, token.to_string());
        let available = self.balances.get(&from_key).copied().unwrap_or(0);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| FbaError::InsufficientBalance {
                token: token.to_string(),
                needed: amount,
                available,
            })?;
        if remaining == 0 {
            self.balances.remove(&from_key);
        } else {
            self.balances.insert(from_key, remaining);
        }
        *self.balances.entry((to, token.to_string())).or_insert(0) += amount;
        Ok(())
    }

    fn balance_of(&self, user: TraderId, token: &str) -> u128 {
        self.balances
            .get(&(user, token.to_string()))
            .copied()
            .unwrap_or(0)
    }
}
