//! Error types for the FBA exchange core.
//!
//! All errors use the `FBA_ERR_` prefix convention for easy grepping in
//! logs. Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Market errors
//! - 3xx: Batch / finalization errors
//! - 4xx: Clearing errors
//! - 5xx: Settlement / funds errors
//! - 8xx: Invariant violations (fatal — the market halts)
//! - 9xx: General / internal errors
//!
//! Every variant also maps onto a coarse [`ErrorKind`]; callers that only
//! need the class of failure (e.g. to pick an HTTP status) use
//! [`FbaError::kind`].

use thiserror::Error;

use crate::{BatchId, Flow, MarketId, OrderId, Side};

/// Coarse classification of an [`FbaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller lacks the right to perform the operation.
    Unauthorized,
    /// The request itself is malformed (zero qty, bad tick, bad token).
    InvalidInput,
    /// The request is well-formed but conflicts with current state.
    StateConflict,
    /// A balance or reservation cannot cover the operation.
    Insufficient,
    /// The referenced entity does not exist.
    NotFound,
    /// A runtime invariant broke — a bug, not a user error. The market halts.
    Fatal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "UNAUTHORIZED"),
            Self::InvalidInput => write!(f, "INVALID_INPUT"),
            Self::StateConflict => write!(f, "STATE_CONFLICT"),
            Self::Insufficient => write!(f, "INSUFFICIENT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Central error enum for all FBA core operations.
#[derive(Debug, Error)]
pub enum FbaError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order was not found.
    #[error("FBA_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Caller is not the order's trader.
    #[error("FBA_ERR_101: Not the order owner: {0}")]
    NotOrderOwner(OrderId),

    /// An order with this id already exists.
    #[error("FBA_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The nonce was already used by this trader in this batch.
    #[error("FBA_ERR_103: Nonce {nonce} already used in this batch")]
    DuplicateNonce { nonce: u128 },

    /// Orders must carry a positive quantity.
    #[error("FBA_ERR_104: Order quantity must be positive")]
    ZeroQty,

    /// The price tick lies outside the admissible range (or has no price).
    #[error("FBA_ERR_105: Tick {tick} out of range or unpriceable")]
    InvalidTick { tick: i32 },

    /// The order expires before its batch would clear.
    #[error("FBA_ERR_106: Order expiry {expiry} precedes the batch end")]
    ExpiryBeforeBatchEnd { expiry: u64 },

    /// The order was already cancelled.
    #[error("FBA_ERR_107: Order already cancelled: {0}")]
    AlreadyCancelled(OrderId),

    /// The order was already claimed.
    #[error("FBA_ERR_108: Order already claimed: {0}")]
    AlreadyClaimed(OrderId),

    /// An order-state update tried to move a counter the wrong way.
    #[error(
        "FBA_ERR_109: Non-monotone state update: claimed={claimed} remaining={remaining} original={original_qty}"
    )]
    StateMonotonicity {
        claimed: u128,
        remaining: u128,
        original_qty: u128,
    },

    // =================================================================
    // Market Errors (2xx)
    // =================================================================
    /// The requested market was not found.
    #[error("FBA_ERR_200: Market not found: {0}")]
    MarketNotFound(MarketId),

    /// The market is paused or halted.
    #[error("FBA_ERR_201: Market inactive: {0}")]
    MarketInactive(MarketId),

    /// A token identity failed validation.
    #[error("FBA_ERR_202: Invalid token: {reason}")]
    InvalidToken { reason: String },

    /// A market with the same kind and tokens already exists.
    #[error("FBA_ERR_203: Duplicate market")]
    DuplicateMarket,

    /// The operation requires the other market kind (spot vs perp).
    #[error("FBA_ERR_204: Wrong market kind for {0}")]
    WrongMarketKind(MarketId),

    /// The capability is not registered with the auction house.
    #[error("FBA_ERR_205: Settler capability not registered")]
    NotSettler,

    // =================================================================
    // Batch / Finalization Errors (3xx)
    // =================================================================
    /// The batch window has closed for this operation.
    #[error("FBA_ERR_300: Batch expired: {0}")]
    BatchExpired(BatchId),

    /// Finalization requires the batch window to have elapsed.
    #[error("FBA_ERR_301: Batch not ended: {0}")]
    BatchNotEnded(BatchId),

    /// The batch is already fully finalized.
    #[error("FBA_ERR_302: Batch already finalized: {0}")]
    AlreadyFinalized(BatchId),

    /// Clearing results are only readable after finalization.
    #[error("FBA_ERR_303: Batch not finalized: {0}")]
    NotFinalized(BatchId),

    /// The previous batch's clearing did not complete within the step
    /// budget granted to this submission; retry.
    #[error("FBA_ERR_304: Clearing in progress for {0}")]
    ClearingInProgress(BatchId),

    /// The referenced batch was not found.
    #[error("FBA_ERR_305: Batch not found: {0}")]
    BatchNotFound(BatchId),

    // =================================================================
    // Clearing Errors (4xx)
    // =================================================================
    /// A checked multiplication or division overflowed.
    #[error("FBA_ERR_400: Arithmetic overflow in {context}")]
    MathOverflow { context: &'static str },

    // =================================================================
    // Settlement / Funds Errors (5xx)
    // =================================================================
    /// Not enough balance to debit.
    #[error("FBA_ERR_500: Insufficient {token} balance: need {needed}, have {available}")]
    InsufficientBalance {
        token: String,
        needed: u128,
        available: u128,
    },

    /// No locked funds recorded for the order.
    #[error("FBA_ERR_501: No locked funds for {0}")]
    LockNotFound(OrderId),

    /// Fee rates are capped at 10000 bps.
    #[error("FBA_ERR_502: Fee bps {bps} exceeds 10000")]
    InvalidFeeBps { bps: u16 },

    /// The mover is not on the vault's authorization list.
    #[error("FBA_ERR_503: Vault mover not authorized")]
    VaultUnauthorized,

    /// No price available for the oracle.
    #[error("FBA_ERR_504: Oracle price unavailable: {0}")]
    OraclePriceUnavailable(crate::OracleId),

    // =================================================================
    // Invariant Violations (8xx) — fatal, the market halts
    // =================================================================
    /// A per-tick aggregate would go negative.
    #[error("FBA_ERR_800: Aggregate underflow at ({side}, {flow})")]
    AggregateUnderflow { side: Side, flow: Flow },

    /// A per-tick aggregate would wrap.
    #[error("FBA_ERR_801: Aggregate overflow at ({side}, {flow})")]
    AggregateOverflow { side: Side, flow: Flow },

    /// Locked funds no longer reconcile with the escrow balance.
    #[error("FBA_ERR_802: Escrow imbalance for {token}: locked {locked}, escrow holds {escrow}")]
    EscrowImbalance {
        token: String,
        locked: u128,
        escrow: u128,
    },

    /// The market was halted by a prior invariant violation.
    #[error("FBA_ERR_803: Market halted: {0}")]
    MarketHalted(MarketId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FBA_ERR_900: Internal error: {0}")]
    Internal(String),
}

impl FbaError {
    /// The coarse class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOrderOwner(_) | Self::NotSettler | Self::VaultUnauthorized => {
                ErrorKind::Unauthorized
            }
            Self::ZeroQty
            | Self::InvalidTick { .. }
            | Self::ExpiryBeforeBatchEnd { .. }
            | Self::InvalidToken { .. }
            | Self::WrongMarketKind(_)
            | Self::InvalidFeeBps { .. }
            | Self::MathOverflow { .. } => ErrorKind::InvalidInput,
            Self::DuplicateOrder(_)
            | Self::DuplicateNonce { .. }
            | Self::AlreadyCancelled(_)
            | Self::AlreadyClaimed(_)
            | Self::StateMonotonicity { .. }
            | Self::MarketInactive(_)
            | Self::DuplicateMarket
            | Self::BatchExpired(_)
            | Self::BatchNotEnded(_)
            | Self::AlreadyFinalized(_)
            | Self::NotFinalized(_)
            | Self::ClearingInProgress(_) => ErrorKind::StateConflict,
            Self::InsufficientBalance { .. } => ErrorKind::Insufficient,
            Self::OrderNotFound(_)
            | Self::MarketNotFound(_)
            | Self::BatchNotFound(_)
            | Self::LockNotFound(_)
            | Self::OraclePriceUnavailable(_) => ErrorKind::NotFound,
            Self::AggregateUnderflow { .. }
            | Self::AggregateOverflow { .. }
            | Self::EscrowImbalance { .. }
            | Self::MarketHalted(_)
            | Self::Internal(_) => ErrorKind::Fatal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FbaError>;
