//! Bounded retry for locally produced blocks that lose a transaction race.

use crate::config::ProductionConfig;
use crate::error::{ProductionError, Result};
use hc_consensus::{ConsensusError, ConsensusResult, EpochClock};
use std::time::Duration;
use tracing::debug;

/// Retries a submission while it is refused as a duplicate or stale
/// transaction set, until the window after the block timestamp closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    window_secs: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(window_secs: u32, backoff: Duration) -> Self {
        Self {
            window_secs,
            backoff,
        }
    }

    pub fn from_config(config: &ProductionConfig) -> Self {
        Self::new(config.submission_retry_window_secs, config.retry_backoff())
    }

    pub fn window_secs(&self) -> u32 {
        self.window_secs
    }

    /// Run `attempt` until it succeeds, fails for any other reason, or more
    /// than `window_secs` have passed since `started_at`.
    pub fn run<T>(
        &self,
        clock: &dyn EpochClock,
        started_at: u32,
        mut attempt: impl FnMut() -> ConsensusResult<T>,
    ) -> Result<T> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt() {
                Ok(value) => return Ok(value),
                Err(ConsensusError::DuplicateOrStaleSubmission(reason)) => {
                    if clock.now().saturating_sub(started_at) > self.window_secs {
                        debug!(attempts, %reason, "Retry window closed");
                        return Err(ProductionError::RetryWindowExhausted {
                            timestamp: started_at,
                            window_secs: self.window_secs,
                        });
                    }
                    debug!(attempts, %reason, "Submission lost a race, retrying");
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
