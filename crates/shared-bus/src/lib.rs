//! # Shared Bus - Node Event Bus
//!
//! Broadcasts what happens to the chain and to the local block producers.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────┐
//! │ ConsensusEngine  │    publish()       │  Listeners   │
//! │ StakeForger      │ ──────┐            │  (RPC, logs) │
//! │ CapacityMiner    │       │            └──────────────┘
//! └──────────────────┘       ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```
//!
//! Publishing never blocks and never fails: with no subscribers the event
//! is dropped. Slow subscribers skip lagged events rather than stall the
//! publisher.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{ConsensusEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus, NullPublisher};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
