//! # Hybrid Consensus Engine
//!
//! Block acceptance for a chain produced by two interleaved tracks:
//!
//! - **Stake track**: generators prove eligibility with a hit derived from
//!   the previous stake generation signature, scaled by effective balance.
//! - **Capacity track**: miners prove pre-computed storage by reading one
//!   scoop of a plot, yielding a deadline in seconds.
//!
//! Each track keeps its own base target. Fork choice uses cumulative
//! difficulty, grown by destroyed coin age (plus a fixed capacity bonus).
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Service                                            │
//! │  - ConsensusEngine: push / pop under one head lock  │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports / Adapters                                   │
//! │  - AccountLedger, EpochClock                        │
//! │  - InMemoryLedger, ManualClock, SystemEpochClock    │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (pure)                                      │
//! │  - Header lifecycle, wire codec                     │
//! │  - MiningPlot, generation proofs                    │
//! │  - DifficultyAdjuster, ChainState                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. A linked block's parent is the head at the moment it was linked.
//! 2. Cumulative difficulty strictly increases along the chain.
//! 3. Base targets are never zero.
//! 4. Capacity proofs are refused once the chain passes the retirement height.

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod validation;

pub use adapters::InMemoryLedger;
pub use config::ConsensusConfig;
pub use domain::codec::{from_json, from_wire, to_json, to_wire, BlockWire};
pub use domain::{
    account_id_of, BlockHistory, BlockMode, ChainState, ConsensusError, ConsensusResult,
    DifficultyAdjuster, HeaderDraft, HeaderLimits, LinkedBlock, MiningPlot, Track, TrackParams,
    TransactionSummary, UnlinkedHeader, UnsignedHeader, ONE_COIN,
};
pub use ports::{
    AccountLedger, EpochClock, ManualClock, RewardRecipientAssignment, SystemEpochClock,
};
pub use service::{ConsensusEngine, HeadSection};
pub use validation::BlockValidator;
