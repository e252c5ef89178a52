//! # fba-settlement
//!
//! **Settlement claim plane**: escrow locking at submit, payout/refund at
//! claim, perp position booking, and the collaborator surfaces (vault,
//! fee model, oracle).
//!
//! ## Architecture
//!
//! Settlement is the only component that moves funds:
//! 1. **Vault**: internal balance moves (`debit_credit`) and reads
//! 2. **FeeModel**: `(fee, recipient)` per market and maker/taker role
//! 3. **LockLedger**: per-order escrow locks, deleted exactly once
//! 4. **ClaimGuard**: bounded exactly-once claim tracking
//! 5. **PositionBook**: signed perp exposure per `(market, trader)`
//!
//! ## Claim Flow
//!
//! ```text
//! submit_spot → vault lock → AuctionHouse.submit_order → LockedFunds
//! claim       → Clearing read → entitlement → vault legs → state write
//! ```
//!
//! The settlement plane reads from the auction house and writes order
//! state through its registered [`SettlerCap`](fba_types::SettlerCap).

pub mod claim;
pub mod claim_guard;
pub mod fees;
pub mod locked;
pub mod oracle;
pub mod positions;
pub mod vault;

pub use claim::{ClaimOutcome, OrderRequest, Settlement};
pub use claim_guard::ClaimGuard;
pub use fees::{BpsFeeModel, FeeModel, MarketFees};
pub use locked::{LockLedger, LockedFunds};
pub use oracle::{FixedOracle, Oracle};
pub use positions::{Position, PositionBook};
pub use vault::{InMemoryVault, Vault};
