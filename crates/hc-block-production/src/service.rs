//! Production scheduler
//!
//! Two fixed-interval Tokio tasks, one per track. A tick holds the head
//! mutex while it decides and submits, so it runs on the blocking pool.

use crate::config::ProductionConfig;
use crate::domain::{CapacityMiner, StakeForger};
use crate::error::Result;
use hc_consensus::LinkedBlock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Drives the forger and the miner.
pub struct ProductionService {
    forger: Arc<StakeForger>,
    miner: Arc<CapacityMiner>,
    config: ProductionConfig,
    running: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ProductionService {
    pub fn new(
        forger: Arc<StakeForger>,
        miner: Arc<CapacityMiner>,
        config: ProductionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            forger,
            miner,
            config,
            running: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        })
    }

    pub fn forger(&self) -> &Arc<StakeForger> {
        &self.forger
    }

    pub fn miner(&self) -> &Arc<CapacityMiner> {
        &self.miner
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn both scheduling tasks. Must be called inside a Tokio runtime.
    /// Starting a running service does nothing.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("[hc-production] Already running");
            return;
        }
        info!(
            "[hc-production] Starting schedulers (tick: {}ms)",
            self.config.tick_interval_ms
        );

        let forger = Arc::clone(&self.forger);
        let stake = spawn_ticker("stake", &self.config, move || forger.tick());
        let miner = Arc::clone(&self.miner);
        let capacity = spawn_ticker("capacity", &self.config, move || miner.tick());

        self.handles.lock().extend([stake, capacity]);
    }

    /// Abort both scheduling tasks.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
        info!("[hc-production] Schedulers stopped");
    }
}

impl Drop for ProductionService {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}

fn spawn_ticker<F>(track: &'static str, config: &ProductionConfig, tick: F) -> JoinHandle<()>
where
    F: Fn() -> Result<Option<Arc<LinkedBlock>>> + Send + Sync + 'static,
{
    let period = config.tick_interval();
    let tick = Arc::new(tick);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let tick = Arc::clone(&tick);
            match tokio::task::spawn_blocking(move || tick()).await {
                Ok(Ok(Some(block))) => {
                    debug!(track, height = block.height(), "[hc-production] Tick produced a block");
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) if e.is_critical() => {
                    error!(track, error = %e, "[hc-production] Tick failed");
                }
                Ok(Err(e)) => {
                    debug!(track, error = %e, "[hc-production] Tick failed");
                }
                Err(e) => {
                    warn!(track, error = %e, "[hc-production] Tick task panicked");
                }
            }
        }
    })
}
