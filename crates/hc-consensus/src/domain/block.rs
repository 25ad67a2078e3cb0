//! Block domain entities
//!
//! A header moves through three shapes:
//!
//! ```text
//! HeaderDraft ──seal()──→ UnsignedHeader ──sign()──→ UnlinkedHeader ──link──→ LinkedBlock
//!  (free fields)          (checked)                  (id-bearing)            (height, target)
//! ```
//!
//! Each shape is immutable; the next one is built exactly once.

use super::codec;
use super::error::{ConsensusError, ConsensusResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use shared_crypto::{sha256, Ed25519KeyPair};
use shared_types::{
    id_from_digest, AccountId, BlockId, Hash, PublicKey, Signature, TransactionId,
};
use std::ops::Deref;
use std::sync::Arc;

pub use shared_types::Track;

/// Minor units per coin.
pub const ONE_COIN: u64 = 100_000_000;

/// Maximum transactions a block may carry.
pub const MAX_NUMBER_OF_TRANSACTIONS: usize = 255;

/// Maximum payload length in bytes.
pub const MAX_PAYLOAD_LENGTH: u32 = 255 * 176;

/// Highest header format version understood.
pub const MAX_BLOCK_VERSION: u32 = 3;

/// How a block proves its generator was entitled to produce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockMode {
    /// Balance-weighted hit against the stake track.
    Stake,
    /// Plot scoop deadline for the given plot nonce.
    Capacity { nonce: u64 },
}

impl BlockMode {
    /// Raw nonce value that marks a stake block on the wire.
    pub const STAKE_NONCE: u64 = u64::MAX;

    /// Interpret a raw wire nonce.
    pub fn from_raw_nonce(nonce: u64) -> Self {
        if nonce == Self::STAKE_NONCE {
            BlockMode::Stake
        } else {
            BlockMode::Capacity { nonce }
        }
    }

    /// Raw nonce as written into the encoded header.
    pub fn raw_nonce(&self) -> u64 {
        match self {
            BlockMode::Stake => Self::STAKE_NONCE,
            BlockMode::Capacity { nonce } => *nonce,
        }
    }

    /// Difficulty track this mode belongs to.
    pub fn track(&self) -> Track {
        match self {
            BlockMode::Stake => Track::Stake,
            BlockMode::Capacity { .. } => Track::Capacity,
        }
    }
}

/// The consensus-relevant slice of a transaction.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: TransactionId,
    pub sender_id: AccountId,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub fee: u64,
}

/// Structural bounds a header must respect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderLimits {
    pub max_payload_length: u32,
    pub max_transactions: usize,
}

impl Default for HeaderLimits {
    fn default() -> Self {
        Self {
            max_payload_length: MAX_PAYLOAD_LENGTH,
            max_transactions: MAX_NUMBER_OF_TRANSACTIONS,
        }
    }
}

/// Header fields before any checking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderDraft {
    pub version: u32,
    pub timestamp: u32,
    pub previous_block_id: BlockId,
    pub total_amount: u64,
    pub total_fee: u64,
    pub payload_length: u32,
    pub payload_hash: Hash,
    pub generator_public_key: PublicKey,
    pub generation_signature: Hash,
    pub previous_block_hash: Option<Hash>,
    pub mode: BlockMode,
    pub transactions: Vec<TransactionSummary>,
}

impl HeaderDraft {
    /// An empty version-1 stake block at timestamp 0 with no parent.
    pub fn genesis(generator_public_key: PublicKey, generation_signature: Hash) -> Self {
        Self {
            version: 1,
            timestamp: 0,
            previous_block_id: BlockId::NONE,
            total_amount: 0,
            total_fee: 0,
            payload_length: 0,
            payload_hash: sha256(&[]),
            generator_public_key,
            generation_signature,
            previous_block_hash: None,
            mode: BlockMode::Stake,
            transactions: Vec::new(),
        }
    }

    /// Check structural invariants and freeze the fields.
    pub fn seal(self, limits: &HeaderLimits) -> ConsensusResult<UnsignedHeader> {
        let malformed = |msg: String| Err(ConsensusError::MalformedBlock(msg));

        if !(1..=MAX_BLOCK_VERSION).contains(&self.version) {
            return malformed(format!("unsupported version {}", self.version));
        }
        if (self.version > 1) != self.previous_block_hash.is_some() {
            return malformed(format!(
                "previousBlockHash presence does not match version {}",
                self.version
            ));
        }
        if self.payload_length > limits.max_payload_length {
            return malformed(format!(
                "payload length {} exceeds {}",
                self.payload_length, limits.max_payload_length
            ));
        }
        if self.transactions.len() > limits.max_transactions {
            return malformed(format!(
                "{} transactions exceeds {}",
                self.transactions.len(),
                limits.max_transactions
            ));
        }
        if self
            .transactions
            .windows(2)
            .any(|pair| pair[0].id >= pair[1].id)
        {
            return malformed("transactions not strictly ascending by id".to_string());
        }
        if self.version < 3 {
            // Older formats carry whole coins in four bytes.
            for (name, value) in [("amount", self.total_amount), ("fee", self.total_fee)] {
                if value % ONE_COIN != 0 || value / ONE_COIN > u64::from(u32::MAX) {
                    return malformed(format!(
                        "total {name} {value} not representable in version {}",
                        self.version
                    ));
                }
            }
        }

        Ok(UnsignedHeader { fields: self })
    }
}

/// A checked header that has not been signed yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedHeader {
    fields: HeaderDraft,
}

impl UnsignedHeader {
    pub fn version(&self) -> u32 {
        self.fields.version
    }

    pub fn timestamp(&self) -> u32 {
        self.fields.timestamp
    }

    pub fn previous_block_id(&self) -> BlockId {
        self.fields.previous_block_id
    }

    pub fn total_amount(&self) -> u64 {
        self.fields.total_amount
    }

    pub fn total_fee(&self) -> u64 {
        self.fields.total_fee
    }

    pub fn payload_length(&self) -> u32 {
        self.fields.payload_length
    }

    pub fn payload_hash(&self) -> &Hash {
        &self.fields.payload_hash
    }

    pub fn generator_public_key(&self) -> &PublicKey {
        &self.fields.generator_public_key
    }

    pub fn generation_signature(&self) -> &Hash {
        &self.fields.generation_signature
    }

    pub fn previous_block_hash(&self) -> Option<&Hash> {
        self.fields.previous_block_hash.as_ref()
    }

    pub fn mode(&self) -> BlockMode {
        self.fields.mode
    }

    pub fn track(&self) -> Track {
        self.fields.mode.track()
    }

    pub fn transactions(&self) -> &[TransactionSummary] {
        &self.fields.transactions
    }

    /// Generator account, derived from the public key.
    pub fn generator_id(&self) -> AccountId {
        account_id_of(&self.fields.generator_public_key)
    }

    /// Bytes covered by the block signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        codec::encode_unsigned(self)
    }

    /// Sign with the given key pair.
    pub fn sign(self, keypair: &Ed25519KeyPair) -> UnlinkedHeader {
        let signature = *keypair.sign(&self.signing_bytes()).as_bytes();
        UnlinkedHeader::new(self, signature)
    }

    /// Attach a signature produced elsewhere (e.g. decoded from the wire).
    pub fn with_signature(self, signature: Signature) -> UnlinkedHeader {
        UnlinkedHeader::new(self, signature)
    }

    /// Back to free fields, for rebuilding a modified header.
    pub fn into_draft(self) -> HeaderDraft {
        self.fields
    }
}

/// A signed header: id-bearing but not yet placed in the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlinkedHeader {
    unsigned: UnsignedHeader,
    signature: Signature,
    id: BlockId,
    full_hash: Hash,
    generator_id: AccountId,
}

impl UnlinkedHeader {
    fn new(unsigned: UnsignedHeader, signature: Signature) -> Self {
        let mut bytes = unsigned.signing_bytes();
        bytes.extend_from_slice(&signature);
        let full_hash = sha256(&bytes);
        let generator_id = unsigned.generator_id();
        Self {
            unsigned,
            signature,
            id: BlockId(id_from_digest(&full_hash)),
            full_hash,
            generator_id,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn generator_id(&self) -> AccountId {
        self.generator_id
    }

    pub fn block_signature(&self) -> &Signature {
        &self.signature
    }

    /// SHA-256 of the full encoding. Children store it as `previousBlockHash`.
    pub fn full_hash(&self) -> &Hash {
        &self.full_hash
    }

    /// Full encoding including the signature.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    pub fn unsigned(&self) -> &UnsignedHeader {
        &self.unsigned
    }
}

impl Deref for UnlinkedHeader {
    type Target = UnsignedHeader;

    fn deref(&self) -> &Self::Target {
        &self.unsigned
    }
}

/// Most recent block of each track at or below some block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackTips {
    pub stake: Option<u32>,
    pub capacity: Option<u32>,
}

impl TrackTips {
    pub fn get(&self, track: Track) -> Option<u32> {
        match track {
            Track::Stake => self.stake,
            Track::Capacity => self.capacity,
        }
    }

    pub(crate) fn advanced(mut self, track: Track, height: u32) -> Self {
        match track {
            Track::Stake => self.stake = Some(height),
            Track::Capacity => self.capacity = Some(height),
        }
        self
    }
}

/// A block placed in the chain, with everything linking assigned.
#[derive(Clone, Debug)]
pub struct LinkedBlock {
    header: Arc<UnlinkedHeader>,
    height: u32,
    base_target: u64,
    cumulative_difficulty: U256,
    tips: TrackTips,
}

impl LinkedBlock {
    pub(crate) fn new(
        header: UnlinkedHeader,
        height: u32,
        base_target: u64,
        cumulative_difficulty: U256,
        tips_before: TrackTips,
    ) -> Self {
        let tips = tips_before.advanced(header.track(), height);
        Self {
            header: Arc::new(header),
            height,
            base_target,
            cumulative_difficulty,
            tips,
        }
    }

    pub fn header(&self) -> &Arc<UnlinkedHeader> {
        &self.header
    }

    pub fn id(&self) -> BlockId {
        self.header.id()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn base_target(&self) -> u64 {
        self.base_target
    }

    pub fn cumulative_difficulty(&self) -> U256 {
        self.cumulative_difficulty
    }

    pub fn timestamp(&self) -> u32 {
        self.header.timestamp()
    }

    pub fn track(&self) -> Track {
        self.header.track()
    }

    pub fn generation_signature(&self) -> &Hash {
        self.header.generation_signature()
    }

    pub fn generator_id(&self) -> AccountId {
        self.header.generator_id()
    }

    /// Track tips as of this block, inclusive.
    pub fn tips(&self) -> TrackTips {
        self.tips
    }
}

/// Account id owning a public key.
pub fn account_id_of(public_key: &PublicKey) -> AccountId {
    AccountId::from_public_key_digest(&sha256(public_key))
}
