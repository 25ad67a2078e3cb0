//! Error types for the consensus engine

use shared_types::BlockId;

/// Consensus error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    /// Structurally invalid header: bad lengths, unsorted transactions,
    /// oversize payload, inconsistent version fields.
    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    /// The parent is not known locally. Fetch it and resubmit.
    #[error("Missing ancestor {parent_id} for block {block_id}")]
    MissingAncestor { block_id: BlockId, parent_id: BlockId },

    /// The parent is known but is not the current head.
    #[error("Block builds on {parent_id}, head is {head_id}")]
    NotExtendingHead { parent_id: BlockId, head_id: BlockId },

    #[error("Invalid timestamp: block {timestamp} <= parent {parent}")]
    InvalidTimestamp { timestamp: u32, parent: u32 },

    #[error("Timestamp too far in future: {timestamp}, current is {now}")]
    FutureTimestamp { timestamp: u32, now: u32 },

    #[error("Invalid block signature on {0}")]
    InvalidSignature(BlockId),

    #[error("Invalid generation proof on {block_id}: {reason}")]
    InvalidGenerationProof { block_id: BlockId, reason: String },

    /// Capacity proofs are no longer accepted at this height.
    #[error("Capacity proofs retired, chain height {height}")]
    ProofFamilyRetired { height: u32 },

    /// The transaction set was refused, usually because another block
    /// already consumed it.
    #[error("Duplicate or stale submission: {0}")]
    DuplicateOrStaleSubmission(String),

    #[error("Block already linked: {0}")]
    AlreadyLinked(BlockId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A caller broke an API contract. Aborts only the current operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ConsensusError {
    /// Whether the same block may succeed later without modification.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::MissingAncestor { .. }
                | Self::NotExtendingHead { .. }
                | Self::DuplicateOrStaleSubmission(_)
        )
    }

    /// Whether this exact block must be discarded.
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }

    /// Short label for metrics and logs.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::MalformedBlock(_) => "malformed",
            Self::MissingAncestor { .. } => "missing_ancestor",
            Self::NotExtendingHead { .. } => "not_extending_head",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::FutureTimestamp { .. } => "future_timestamp",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::InvalidGenerationProof { .. } => "invalid_generation_proof",
            Self::ProofFamilyRetired { .. } => "proof_family_retired",
            Self::DuplicateOrStaleSubmission(_) => "duplicate_or_stale",
            Self::AlreadyLinked(_) => "already_linked",
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidState(_) => "invalid_state",
        }
    }
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
