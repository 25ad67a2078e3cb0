//! Block codec
//!
//! Binary layout, little-endian integers:
//!
//! ```text
//! version(4) timestamp(4) previousBlockId(8) txCount(4)
//! amount, fee          4+4 whole coins if version < 3, else 8+8 minor units
//! payloadLength(4) payloadHash(32) generatorPublicKey(32) generationSignature(32)
//! previousBlockHash(32)   only if version > 1
//! nonce(8) blockSignature(64)
//! ```
//!
//! The signature is omitted when computing the bytes to sign. The wire form
//! is JSON with hex byte arrays and decimal-string 64-bit numbers.

use super::block::{
    BlockMode, HeaderDraft, HeaderLimits, TransactionSummary, UnlinkedHeader, UnsignedHeader,
    ONE_COIN,
};
use super::error::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_types::wire::{hex32, hex64, option_hex32};
use shared_types::{BlockId, Hash, PublicKey, Signature};

const FIXED_LEN: usize = 4 + 4 + 8 + 4 + 16 + 4 + 32 + 32 + 32 + 32 + 8 + 64;

/// Encode everything except the block signature.
pub fn encode_unsigned(header: &UnsignedHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FIXED_LEN);
    let version = header.version();

    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(&header.timestamp().to_le_bytes());
    buf.extend_from_slice(&header.previous_block_id().get().to_le_bytes());
    buf.extend_from_slice(&(header.transactions().len() as u32).to_le_bytes());
    if version < 3 {
        // Sealing guarantees both totals are whole coins that fit.
        buf.extend_from_slice(&((header.total_amount() / ONE_COIN) as u32).to_le_bytes());
        buf.extend_from_slice(&((header.total_fee() / ONE_COIN) as u32).to_le_bytes());
    } else {
        buf.extend_from_slice(&header.total_amount().to_le_bytes());
        buf.extend_from_slice(&header.total_fee().to_le_bytes());
    }
    buf.extend_from_slice(&header.payload_length().to_le_bytes());
    buf.extend_from_slice(header.payload_hash());
    buf.extend_from_slice(header.generator_public_key());
    buf.extend_from_slice(header.generation_signature());
    if let Some(previous) = header.previous_block_hash() {
        buf.extend_from_slice(previous);
    }
    buf.extend_from_slice(&header.mode().raw_nonce().to_le_bytes());
    buf
}

/// Full encoding, signature included. Its SHA-256 yields the block id.
pub fn encode(header: &UnlinkedHeader) -> Vec<u8> {
    let mut buf = encode_unsigned(header.unsigned());
    buf.extend_from_slice(header.block_signature());
    buf
}

/// Structured wire representation of a signed header.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockWire {
    pub version: u32,
    pub timestamp: u32,
    pub previous_block_id: BlockId,
    #[serde_as(as = "DisplayFromStr")]
    pub total_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_fee: u64,
    pub payload_length: u32,
    #[serde(with = "hex32")]
    pub payload_hash: Hash,
    #[serde(with = "hex32")]
    pub generator_public_key: PublicKey,
    #[serde(with = "hex32")]
    pub generation_signature: Hash,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_hex32"
    )]
    pub previous_block_hash: Option<Hash>,
    #[serde_as(as = "DisplayFromStr")]
    pub nonce: u64,
    #[serde(with = "hex64")]
    pub block_signature: Signature,
    #[serde(default)]
    pub transactions: Vec<TransactionSummary>,
}

/// Structured form of a signed header.
pub fn to_wire(header: &UnlinkedHeader) -> BlockWire {
    BlockWire {
        version: header.version(),
        timestamp: header.timestamp(),
        previous_block_id: header.previous_block_id(),
        total_amount: header.total_amount(),
        total_fee: header.total_fee(),
        payload_length: header.payload_length(),
        payload_hash: *header.payload_hash(),
        generator_public_key: *header.generator_public_key(),
        generation_signature: *header.generation_signature(),
        previous_block_hash: header.previous_block_hash().copied(),
        nonce: header.mode().raw_nonce(),
        block_signature: *header.block_signature(),
        transactions: header.transactions().to_vec(),
    }
}

/// Rebuild a signed header, applying every structural check.
pub fn from_wire(wire: BlockWire, limits: &HeaderLimits) -> ConsensusResult<UnlinkedHeader> {
    let draft = HeaderDraft {
        version: wire.version,
        timestamp: wire.timestamp,
        previous_block_id: wire.previous_block_id,
        total_amount: wire.total_amount,
        total_fee: wire.total_fee,
        payload_length: wire.payload_length,
        payload_hash: wire.payload_hash,
        generator_public_key: wire.generator_public_key,
        generation_signature: wire.generation_signature,
        previous_block_hash: wire.previous_block_hash,
        mode: BlockMode::from_raw_nonce(wire.nonce),
        transactions: wire.transactions,
    };
    Ok(draft.seal(limits)?.with_signature(wire.block_signature))
}

/// Serialize a signed header to its JSON wire form.
pub fn to_json(header: &UnlinkedHeader) -> ConsensusResult<String> {
    serde_json::to_string(&to_wire(header))
        .map_err(|e| ConsensusError::InvalidState(format!("wire encoding failed: {e}")))
}

/// Parse a JSON wire block.
pub fn from_json(json: &str, limits: &HeaderLimits) -> ConsensusResult<UnlinkedHeader> {
    let wire: BlockWire =
        serde_json::from_str(json).map_err(|e| ConsensusError::MalformedBlock(e.to_string()))?;
    from_wire(wire, limits)
}
