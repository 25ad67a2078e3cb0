//! # Consensus Metrics
//!
//! Prometheus metrics for monitoring block acceptance.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hc-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! - `consensus_blocks_linked_total` - blocks linked onto the chain
//! - `consensus_blocks_rejected_total` - rejected blocks, by reason
//! - `consensus_validation_latency_seconds` - time spent in `push_block`

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks linked
    pub static ref BLOCKS_LINKED: IntCounter = register_int_counter!(
        "consensus_blocks_linked_total",
        "Total number of blocks linked onto the chain"
    )
    .expect("Failed to create BLOCKS_LINKED metric");

    /// Total blocks rejected, labeled by rejection reason
    pub static ref BLOCKS_REJECTED: CounterVec = register_counter_vec!(
        "consensus_blocks_rejected_total",
        "Total number of blocks rejected",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    /// Histogram of block validation latency
    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "consensus_validation_latency_seconds",
        "Time taken to validate and link a block in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to create VALIDATION_LATENCY metric");
}

/// Record a linked block
#[cfg(feature = "metrics")]
pub fn record_block_linked() {
    BLOCKS_LINKED.inc();
}

/// Record a rejected block with reason
#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record validation latency
#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_linked() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}
