//! Consensus Engine - accept / rollback protocol
//!
//! Owns the canonical chain behind one mutex. Everything that reads the
//! head and then mutates it (network blocks, local forging, rollbacks)
//! goes through a [`HeadSection`] so the head cannot change mid-decision.
//!
//! # Acceptance pipeline
//!
//! 1. parent lookup (missing / not the head)
//! 2. timestamp after parent, within drift of the clock
//! 3. `previousBlockHash` equals the parent's full hash (version > 1)
//! 4. signature under the effective signer
//! 5. generation proof against the track tip
//! 6. transaction admissibility via the ledger
//! 7. base target and cumulative difficulty, then link

use crate::config::ConsensusConfig;
use crate::domain::{
    coin_age_spends, ChainState, ConsensusError, ConsensusResult, DifficultyAdjuster,
    LinkedBlock, Track, TrackTips, UnlinkedHeader, ONE_COIN,
};
use crate::metrics;
use crate::ports::{AccountLedger, EpochClock};
use crate::validation::BlockValidator;
use parking_lot::{Mutex, MutexGuard};
use primitive_types::U256;
use shared_bus::{ConsensusEvent, EventPublisher};
use shared_types::BlockId;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// The consensus context: rules, collaborators and the chain.
pub struct ConsensusEngine {
    config: ConsensusConfig,
    validator: BlockValidator,
    adjuster: DifficultyAdjuster,
    ledger: Arc<dyn AccountLedger>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn EpochClock>,
    chain: Mutex<ChainState>,
}

impl ConsensusEngine {
    /// Create the engine with its genesis block linked at height 0.
    ///
    /// Genesis is trusted: no signature or proof checks.
    pub fn with_genesis(
        config: ConsensusConfig,
        genesis: UnlinkedHeader,
        ledger: Arc<dyn AccountLedger>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn EpochClock>,
    ) -> ConsensusResult<Self> {
        config.validate()?;
        if !genesis.previous_block_id().is_none() {
            return Err(ConsensusError::InvalidState(format!(
                "genesis {} has previous block {}",
                genesis.id(),
                genesis.previous_block_id()
            )));
        }

        let base_target = config.initial_base_target(genesis.track());
        let genesis = LinkedBlock::new(genesis, 0, base_target, U256::zero(), TrackTips::default());
        info!(
            "[hc-consensus] Genesis {} linked (track: {}, base target: {})",
            genesis.id(),
            genesis.track(),
            base_target
        );

        Ok(Self {
            validator: BlockValidator::new(config.capacity_retirement_height),
            adjuster: config.difficulty_adjuster(),
            config,
            ledger,
            events,
            clock,
            chain: Mutex::new(ChainState::with_genesis(genesis)),
        })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn AccountLedger> {
        &self.ledger
    }

    pub fn clock(&self) -> &Arc<dyn EpochClock> {
        &self.clock
    }

    pub fn events(&self) -> &Arc<dyn EventPublisher> {
        &self.events
    }

    pub fn validator(&self) -> &BlockValidator {
        &self.validator
    }

    /// Enter the exclusive head section.
    pub fn lock(&self) -> HeadSection<'_> {
        HeadSection {
            engine: self,
            chain: self.chain.lock(),
        }
    }

    pub fn head(&self) -> Arc<LinkedBlock> {
        Arc::clone(self.chain.lock().head())
    }

    pub fn height(&self) -> u32 {
        self.chain.lock().height()
    }

    pub fn block(&self, id: BlockId) -> Option<Arc<LinkedBlock>> {
        self.chain.lock().get(id).cloned()
    }

    pub fn track_tip(&self, track: Track) -> Arc<LinkedBlock> {
        Arc::clone(self.chain.lock().track_tip(track))
    }

    /// Whether a branch with this cumulative difficulty beats the local head.
    pub fn prefers(&self, cumulative_difficulty: U256) -> bool {
        self.chain.lock().prefers(cumulative_difficulty)
    }

    /// Validate and link a block on top of the head.
    pub fn push_block(&self, header: UnlinkedHeader) -> ConsensusResult<Arc<LinkedBlock>> {
        self.lock().push_block(header)
    }

    /// Remove the head block.
    pub fn pop_last(&self) -> ConsensusResult<Arc<LinkedBlock>> {
        self.lock().pop_last()
    }

    /// Remove blocks until the head is at `height`.
    pub fn pop_off_to(&self, height: u32) -> Vec<Arc<LinkedBlock>> {
        self.lock().pop_off_to(height)
    }
}

/// Exclusive access to the chain head.
pub struct HeadSection<'a> {
    engine: &'a ConsensusEngine,
    chain: MutexGuard<'a, ChainState>,
}

impl<'a> HeadSection<'a> {
    pub fn chain(&self) -> &ChainState {
        &self.chain
    }

    pub fn head(&self) -> &Arc<LinkedBlock> {
        self.chain.head()
    }

    pub fn engine(&self) -> &'a ConsensusEngine {
        self.engine
    }

    /// Validate and link a block on top of the head.
    #[instrument(skip_all, fields(block = %header.id(), height = self.chain.height() + 1))]
    pub fn push_block(&mut self, header: UnlinkedHeader) -> ConsensusResult<Arc<LinkedBlock>> {
        let started = Instant::now();
        let block_id = header.id();
        let result = self.validate_and_link(header);
        metrics::record_validation_latency(started.elapsed().as_secs_f64());

        match &result {
            Ok(block) => {
                metrics::record_block_linked();
                info!(
                    "[hc-consensus] Block {} linked at height {} (track: {}, base target: {})",
                    block.id(),
                    block.height(),
                    block.track(),
                    block.base_target()
                );
                self.engine.events.publish(ConsensusEvent::BlockLinked {
                    block_id: block.id(),
                    height: block.height(),
                    track: block.track(),
                    generator_id: block.generator_id(),
                    timestamp: block.timestamp(),
                });
            }
            Err(e) if e.is_retryable() => {
                debug!(block = %block_id, error = %e, "[hc-consensus] Block deferred");
                metrics::record_block_rejected(e.reason_label());
            }
            Err(e) => {
                warn!(block = %block_id, error = %e, "[hc-consensus] Block rejected");
                metrics::record_block_rejected(e.reason_label());
                self.engine.events.publish(ConsensusEvent::BlockRejected {
                    block_id,
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    fn validate_and_link(&mut self, header: UnlinkedHeader) -> ConsensusResult<Arc<LinkedBlock>> {
        let engine = self.engine;
        let config = &engine.config;

        if self.chain.contains(header.id()) {
            return Err(ConsensusError::AlreadyLinked(header.id()));
        }

        let parent_id = header.previous_block_id();
        let parent = match self.chain.get(parent_id) {
            None => {
                return Err(ConsensusError::MissingAncestor {
                    block_id: header.id(),
                    parent_id,
                })
            }
            Some(parent) if parent.id() != self.chain.head().id() => {
                return Err(ConsensusError::NotExtendingHead {
                    parent_id,
                    head_id: self.chain.head().id(),
                })
            }
            Some(parent) => Arc::clone(parent),
        };

        if header.timestamp() <= parent.timestamp() {
            return Err(ConsensusError::InvalidTimestamp {
                timestamp: header.timestamp(),
                parent: parent.timestamp(),
            });
        }
        let now = engine.clock.now();
        if header.timestamp() > now.saturating_add(config.max_timestamp_drift_secs) {
            return Err(ConsensusError::FutureTimestamp {
                timestamp: header.timestamp(),
                now,
            });
        }

        if let Some(previous_hash) = header.previous_block_hash() {
            if previous_hash != parent.header().full_hash() {
                return Err(ConsensusError::MalformedBlock(
                    "previous block hash does not match parent".to_string(),
                ));
            }
        }

        let track = header.track();
        let reference = Arc::clone(self.chain.track_tip(track));
        let ledger = engine.ledger.as_ref();

        engine.validator.verify_signature(&header, &parent, ledger)?;
        engine
            .validator
            .verify_generation_proof(&header, &parent, &reference, ledger)?;
        ledger
            .check_transactions(&header)
            .map_err(ConsensusError::DuplicateOrStaleSubmission)?;

        let height = parent.height() + 1;
        let base_target =
            engine
                .adjuster
                .next_base_target(track, height, header.timestamp(), &*self.chain);
        let coin_age = self.destroyed_coin_age(&header);
        let cumulative_difficulty =
            engine
                .adjuster
                .cumulative_difficulty(track, Some(parent.cumulative_difficulty()), coin_age);

        let block = LinkedBlock::new(header, height, base_target, cumulative_difficulty, parent.tips());
        self.chain.push(block)
    }

    /// Coin age destroyed by `header`.
    ///
    /// A stake generator counts with its post-reward balance: its current
    /// ledger balance, weighted by the ledger, plus this block's fees and
    /// reward in whole coins. The ledger credits those only once the block
    /// is applied, so they are added here uncapped.
    fn destroyed_coin_age(&self, header: &UnlinkedHeader) -> u64 {
        let engine = self.engine;
        let (generator_balance, credited) = match header.track() {
            Track::Stake => {
                let generator = header.generator_id();
                let credit = header
                    .total_fee()
                    .saturating_add(engine.config.block_reward(Track::Stake));
                (
                    Some((generator, engine.ledger.balance(generator))),
                    credit / ONE_COIN,
                )
            }
            Track::Capacity => (None, 0),
        };
        coin_age_spends(header, generator_balance)
            .into_iter()
            .map(|(account, spend)| engine.ledger.effective_balance_after_spend(account, spend))
            .fold(credited, u64::saturating_add)
    }

    /// Remove the head block. Genesis cannot be removed.
    pub fn pop_last(&mut self) -> ConsensusResult<Arc<LinkedBlock>> {
        let block = self
            .chain
            .pop()
            .ok_or_else(|| ConsensusError::InvalidState("cannot pop genesis".to_string()))?;
        info!(
            "[hc-consensus] Block {} rolled back from height {}",
            block.id(),
            block.height()
        );
        self.engine.events.publish(ConsensusEvent::BlockRolledBack {
            block_id: block.id(),
            height: block.height(),
        });
        Ok(block)
    }

    /// Remove blocks until the head is at `height`, newest first.
    pub fn pop_off_to(&mut self, height: u32) -> Vec<Arc<LinkedBlock>> {
        let mut popped = Vec::new();
        while self.chain.height() > height {
            match self.pop_last() {
                Ok(block) => popped.push(block),
                Err(_) => break,
            }
        }
        popped
    }
}
