//! Outbound ports (driven side - SPI)

use hc_consensus::{LinkedBlock, TransactionSummary};
use shared_types::Hash;

/// Transactions and payload digest for one new block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockPayload {
    /// Strictly ascending by transaction id
    pub transactions: Vec<TransactionSummary>,
    pub total_amount: u64,
    pub total_fee: u64,
    pub payload_length: u32,
    pub payload_hash: Hash,
}

/// Port: supply the payload of a locally produced block
///
/// Called again on every submission retry, so a source can drop
/// transactions another block already consumed.
pub trait TransactionSource: Send + Sync {
    /// Payload for a block on top of `parent` at `timestamp`.
    fn payload(&self, parent: &LinkedBlock, timestamp: u32) -> BlockPayload;
}
