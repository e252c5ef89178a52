//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Deployment-level configuration for the auction house.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of each batch collection window, in seconds.
    pub batch_duration_secs: u64,
    /// How many finalization steps a submit runs on the previous batch
    /// before giving up with `ClearingInProgress`.
    pub submit_finalize_steps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_duration_secs: constants::DEFAULT_BATCH_DURATION_SECS,
            submit_finalize_steps: constants::DEFAULT_SUBMIT_FINALIZE_STEPS,
        }
    }
}

impl EngineConfig {
    /// The batch window as a [`Duration`].
    #[must_use]
    pub fn batch_duration(&self) -> Duration {
        Duration::from_secs(self.batch_duration_secs)
    }
}
