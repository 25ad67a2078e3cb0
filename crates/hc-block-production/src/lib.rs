//! # Hybrid Chain - Block Production
//!
//! Local leader election for both consensus tracks:
//!
//! - [`StakeForger`]: unlocked accounts compete every second by effective
//!   hit time against the stake track tip.
//! - [`CapacityMiner`]: plot holders submit nonces; the best deadline per
//!   account is kept and turned into a block once it passes.
//!
//! Both produce blocks through the engine's head section, so a block is
//! never built against a head that changes mid-decision. Lost transaction
//! races are retried for a bounded window ([`RetryPolicy`]).
//!
//! [`ProductionService`] runs both on fixed-interval Tokio tasks.

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;


pub use adapters::EmptyTransactionSource;
pub use config::ProductionConfig;
pub use domain::{
    BlockTemplate, CapacityMiner, Forger, ForgingCandidate, MiningInfo, NonceSubmission,
    RetryPolicy, StakeForger,
};
pub use error::{ProductionError, Result};
pub use ports::{BlockPayload, TransactionSource};
pub use service::ProductionService;
