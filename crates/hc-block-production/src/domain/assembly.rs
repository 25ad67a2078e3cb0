//! Building a header on top of the head.

use crate::ports::BlockPayload;
use hc_consensus::{
    BlockMode, ConsensusResult, HeaderDraft, HeaderLimits, LinkedBlock, UnsignedHeader,
};
use shared_types::{Hash, PublicKey};

/// Header fields decided by the producer. The rest comes from the parent
/// and the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub version: u32,
    pub timestamp: u32,
    pub generator_public_key: PublicKey,
    pub generation_signature: Hash,
    pub mode: BlockMode,
}

impl BlockTemplate {
    /// Seal a header that links to `parent`.
    pub fn assemble(
        &self,
        parent: &LinkedBlock,
        payload: BlockPayload,
        limits: &HeaderLimits,
    ) -> ConsensusResult<UnsignedHeader> {
        HeaderDraft {
            version: self.version,
            timestamp: self.timestamp,
            previous_block_id: parent.id(),
            total_amount: payload.total_amount,
            total_fee: payload.total_fee,
            payload_length: payload.payload_length,
            payload_hash: payload.payload_hash,
            generator_public_key: self.generator_public_key,
            generation_signature: self.generation_signature,
            previous_block_hash: (self.version > 1).then(|| *parent.header().full_hash()),
            mode: self.mode,
            transactions: payload.transactions,
        }
        .seal(limits)
    }
}
