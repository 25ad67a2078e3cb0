//! Error types for block production

use hc_consensus::ConsensusError;
use shared_crypto::CryptoError;
use thiserror::Error;

/// Result type alias for block production operations
pub type Result<T> = std::result::Result<T, ProductionError>;

/// Errors that can occur while forging or mining
#[derive(Debug, Error)]
pub enum ProductionError {
    /// The engine refused the block or the proof
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// The secret phrase could not be turned into a key pair
    #[error("Key error: {0}")]
    Crypto(#[from] CryptoError),

    /// Our block kept losing to other blocks for too long
    #[error("Retry window of {window_secs}s exhausted for timestamp {timestamp}")]
    RetryWindowExhausted {
        /// Timestamp the block was produced for
        timestamp: u32,
        /// Configured window
        window_secs: u32,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ProductionError {
    /// Check if error is recoverable (the next tick may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Consensus(e) => e.is_retryable(),
            Self::RetryWindowExhausted { .. } => true,
            Self::Crypto(_) | Self::InvalidConfig(_) => false,
        }
    }

    /// Check if error is critical (should stop production)
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Crypto(_) | Self::InvalidConfig(_))
    }
}
