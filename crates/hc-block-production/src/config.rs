//! Configuration types for block production

use crate::error::{ProductionError, Result};
use hc_consensus::domain::MAX_BLOCK_VERSION;
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for the forger, the miner and their scheduler
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProductionConfig {
    /// Scheduler period for both tracks, milliseconds (default: 500)
    pub tick_interval_ms: u64,

    /// How long a local block may keep retrying after losing a
    /// transaction race, seconds (default: 10)
    pub submission_retry_window_secs: u32,

    /// Pause between retries, milliseconds (default: 100)
    pub submission_retry_backoff_ms: u64,

    /// Header version of locally produced blocks (default: 3)
    pub block_version: u32,

    /// Forging stays suspended until the chain reaches this height
    pub forging_min_height: u32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            submission_retry_window_secs: 10,
            submission_retry_backoff_ms: 100,
            block_version: MAX_BLOCK_VERSION,
            forging_min_height: 0,
        }
    }
}

impl ProductionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(ProductionError::InvalidConfig(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if !(1..=MAX_BLOCK_VERSION).contains(&self.block_version) {
            return Err(ProductionError::InvalidConfig(format!(
                "block_version {} outside 1..={}",
                self.block_version, MAX_BLOCK_VERSION
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.submission_retry_backoff_ms)
    }
}
