//! # Test Fixtures
//!
//! A node is an engine over an in-memory ledger, a manual clock and an
//! in-memory event bus. Block builders produce headers that pass every
//! check unless a test tampers with them.

use hc_consensus::domain::proof::{capacity_proof, stake_generation_signature};
use hc_consensus::{
    account_id_of, BlockMode, ConsensusConfig, ConsensusEngine, HeaderDraft, InMemoryLedger,
    LinkedBlock, ManualClock, Track, TransactionSummary, UnlinkedHeader,
};
use shared_bus::InMemoryEventBus;
use shared_crypto::{sha256, Ed25519KeyPair};
use shared_types::{AccountId, PublicKey};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Effective balance large enough that every stake hit matures one second
/// after the reference block.
pub const RICH: u64 = u64::MAX / 2;

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn keypair(phrase: &str) -> Ed25519KeyPair {
    Ed25519KeyPair::from_secret_phrase(phrase).expect("non-empty phrase")
}

pub fn public_key(phrase: &str) -> PublicKey {
    *keypair(phrase).public_key().as_bytes()
}

pub fn account(phrase: &str) -> AccountId {
    account_id_of(&public_key(phrase))
}

pub fn genesis_header(config: &ConsensusConfig, mode: BlockMode) -> UnlinkedHeader {
    let key = keypair("genesis");
    let mut draft = HeaderDraft::genesis(*key.public_key().as_bytes(), [0u8; 32]);
    draft.mode = mode;
    draft
        .seal(&config.header_limits())
        .expect("genesis is well-formed")
        .sign(&key)
}

pub struct TestNode {
    pub engine: Arc<ConsensusEngine>,
    pub ledger: Arc<InMemoryLedger>,
    pub bus: Arc<InMemoryEventBus>,
    pub clock: Arc<ManualClock>,
}

impl TestNode {
    pub fn new() -> Self {
        Self::with_config(ConsensusConfig::default())
    }

    pub fn with_config(config: ConsensusConfig) -> Self {
        Self::with_genesis(config, BlockMode::Stake)
    }

    pub fn with_genesis(config: ConsensusConfig, mode: BlockMode) -> Self {
        init_tracing();
        let genesis = genesis_header(&config, mode);
        let ledger = Arc::new(InMemoryLedger::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let engine = ConsensusEngine::with_genesis(
            config,
            genesis,
            ledger.clone(),
            bus.clone(),
            clock.clone(),
        )
        .expect("valid genesis");
        Self {
            engine: Arc::new(engine),
            ledger,
            bus,
            clock,
        }
    }

    /// Fund the account behind `phrase`, binding its public key.
    pub fn fund(&self, phrase: &str, balance: u64) -> AccountId {
        self.ledger.fund(public_key(phrase), balance)
    }

    /// A valid stake block by `phrase` on top of the head.
    pub fn stake_block(&self, phrase: &str, timestamp: u32) -> UnlinkedHeader {
        self.stake_block_with(phrase, timestamp, Vec::new())
    }

    pub fn stake_block_with(
        &self,
        phrase: &str,
        timestamp: u32,
        transactions: Vec<TransactionSummary>,
    ) -> UnlinkedHeader {
        let key = keypair(phrase);
        let pk = *key.public_key().as_bytes();
        let reference = self.engine.track_tip(Track::Stake);
        let generation_signature =
            stake_generation_signature(reference.generation_signature(), account_id_of(&pk));
        build(
            &self.engine.head(),
            &key,
            pk,
            generation_signature,
            timestamp,
            BlockMode::Stake,
            transactions,
        )
    }

    /// A capacity block by `phrase` for `nonce` with the proof computed
    /// against the capacity track tip. The timestamp is whatever the
    /// caller picks, so the deadline may or may not have passed.
    pub fn capacity_block(&self, phrase: &str, nonce: u64, timestamp: u32) -> UnlinkedHeader {
        let key = keypair(phrase);
        let pk = *key.public_key().as_bytes();
        let reference = self.engine.track_tip(Track::Capacity);
        let proof = capacity_proof(
            reference.generation_signature(),
            reference.generator_id(),
            reference.height(),
            reference.base_target(),
            account_id_of(&pk),
            nonce,
        );
        build(
            &self.engine.head(),
            &key,
            pk,
            proof.generation_signature,
            timestamp,
            BlockMode::Capacity { nonce },
            Vec::new(),
        )
    }

    /// Push `count` stake blocks by `phrase`, `spacing` seconds apart,
    /// starting one spacing after the head.
    pub fn extend_stake(&self, phrase: &str, count: u32, spacing: u32) -> Vec<Arc<LinkedBlock>> {
        (0..count)
            .map(|_| {
                let timestamp = self.engine.head().timestamp() + spacing;
                self.engine
                    .push_block(self.stake_block(phrase, timestamp))
                    .expect("stake block accepted")
            })
            .collect()
    }
}

impl Default for TestNode {
    fn default() -> Self {
        Self::new()
    }
}

fn build(
    parent: &LinkedBlock,
    key: &Ed25519KeyPair,
    generator_public_key: PublicKey,
    generation_signature: [u8; 32],
    timestamp: u32,
    mode: BlockMode,
    transactions: Vec<TransactionSummary>,
) -> UnlinkedHeader {
    let total_amount = transactions.iter().map(|t| t.amount).sum();
    let total_fee = transactions.iter().map(|t| t.fee).sum();
    HeaderDraft {
        version: 3,
        timestamp,
        previous_block_id: parent.id(),
        total_amount,
        total_fee,
        payload_length: 0,
        payload_hash: sha256(&[]),
        generator_public_key,
        generation_signature,
        previous_block_hash: Some(*parent.header().full_hash()),
        mode,
        transactions,
    }
    .seal(&Default::default())
    .expect("well-formed block")
    .sign(key)
}
