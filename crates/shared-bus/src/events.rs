//! # Node Events
//!
//! Everything the consensus engine and the producers announce.

use serde::{Deserialize, Serialize};
use shared_types::entities::{AccountId, BlockId, Track};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConsensusEvent {
    // =========================================================================
    // CHAIN
    // =========================================================================
    /// A block passed validation and became the new head.
    BlockLinked {
        /// Id of the linked block.
        block_id: BlockId,
        /// Its height.
        height: u32,
        /// Its proof family.
        track: Track,
        /// Account that generated it.
        generator_id: AccountId,
        /// Block timestamp, epoch seconds.
        timestamp: u32,
    },

    /// A block was refused by validation.
    BlockRejected {
        /// Id of the refused block.
        block_id: BlockId,
        /// Why it was refused.
        reason: String,
    },

    /// The head block was popped during a rollback.
    BlockRolledBack {
        /// Id of the removed block.
        block_id: BlockId,
        /// Height it occupied.
        height: u32,
    },

    // =========================================================================
    // LOCAL PRODUCTION
    // =========================================================================
    /// A locally produced block was accepted onto the chain.
    BlockProducedLocally {
        /// Id of the produced block.
        block_id: BlockId,
        /// Its height.
        height: u32,
        /// Which producer made it.
        track: Track,
        /// Generator account.
        generator_id: AccountId,
    },

    /// An account started forging.
    LeaderRegistered {
        /// The forging account.
        account_id: AccountId,
    },

    /// An account stopped forging.
    LeaderUnregistered {
        /// The account that stopped.
        account_id: AccountId,
    },

    /// A forger's deadline was recomputed against a new head.
    GenerationDeadline {
        /// The forging account.
        account_id: AccountId,
        /// Seconds until its hit matures.
        deadline_secs: u64,
    },
}

impl ConsensusEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BlockLinked { .. } | Self::BlockRejected { .. } | Self::BlockRolledBack { .. } => {
                EventTopic::Chain
            }
            Self::BlockProducedLocally {
                track: Track::Capacity,
                ..
            } => EventTopic::Mining,
            Self::BlockProducedLocally { .. }
            | Self::LeaderRegistered { .. }
            | Self::LeaderUnregistered { .. }
            | Self::GenerationDeadline { .. } => EventTopic::Forging,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Blocks linked, rejected or rolled back.
    Chain,
    /// Stake forger activity.
    Forging,
    /// Capacity miner activity.
    Mining,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ConsensusEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
