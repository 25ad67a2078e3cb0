use crate::ports::{BlockPayload, TransactionSource};
use hc_consensus::LinkedBlock;
use shared_crypto::sha256;

/// Produces blocks without transactions.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyTransactionSource;

impl TransactionSource for EmptyTransactionSource {
    fn payload(&self, _parent: &LinkedBlock, _timestamp: u32) -> BlockPayload {
        BlockPayload {
            payload_hash: sha256(&[]),
            ..BlockPayload::default()
        }
    }
}
