//! System-wide constants for the FBA exchange core.

/// Basis-point scale: marginal fills are expressed in 1/10000.
pub const BPS: u128 = 10_000;

/// Fixed-point scale for prices (18 decimals).
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Lowest admissible price tick (24-bit signed range).
pub const MIN_TICK: i32 = -((1 << 23) - 1);

/// Highest admissible price tick (24-bit signed range).
pub const MAX_TICK: i32 = (1 << 23) - 1;

/// Default batch collection window in seconds.
pub const DEFAULT_BATCH_DURATION_SECS: u64 = 10;

/// Default number of finalization steps run on behalf of a submitter
/// when its submit rolls the batch over.
pub const DEFAULT_SUBMIT_FINALIZE_STEPS: u32 = 256;

/// Default claim idempotency guard capacity (order ids remembered).
pub const DEFAULT_CLAIM_GUARD_CAPACITY: usize = 500_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "FBA";
