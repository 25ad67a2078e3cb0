//! # Stake Forger
//!
//! Continuous leader election over the locally unlocked accounts.
//!
//! Every tick (at most once per epoch second) the forger takes the head
//! section, ranks all registered accounts by effective hit time against the
//! stake track tip and walks the ranking. The first account whose hit has
//! matured forges a block for the current second.
//!
//! The ranking is cached per head block and dropped whenever an account is
//! registered or unregistered.

use super::assembly::BlockTemplate;
use super::retry::RetryPolicy;
use crate::config::ProductionConfig;
use crate::error::Result;
use crate::ports::TransactionSource;
use hc_consensus::domain::proof::{
    compare_stake_candidates, stake_generation_signature, stake_hit, stake_hit_time,
    verify_stake_hit,
};
use hc_consensus::{
    account_id_of, AccountLedger, BlockMode, ConsensusEngine, HeadSection, LinkedBlock, Track,
};
use parking_lot::{Mutex, RwLock};
use shared_bus::ConsensusEvent;
use shared_crypto::Ed25519KeyPair;
use shared_types::{AccountId, BlockId, PublicKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// An unlocked forging account.
#[derive(Debug)]
pub struct Forger {
    account_id: AccountId,
    public_key: PublicKey,
    keypair: Ed25519KeyPair,
}

impl Forger {
    pub fn from_secret_phrase(secret_phrase: &str) -> Result<Self> {
        let keypair = Ed25519KeyPair::from_secret_phrase(secret_phrase)?;
        let public_key = *keypair.public_key().as_bytes();
        Ok(Self {
            account_id: account_id_of(&public_key),
            public_key,
            keypair,
        })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// One account's standing against the current stake track tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForgingCandidate {
    pub account_id: AccountId,
    /// Whole coins
    pub effective_balance: u64,
    pub hit: u64,
    /// Epoch second at which the hit matures. `None` without balance.
    pub hit_time: Option<u64>,
}

impl ForgingCandidate {
    fn compute(account_id: AccountId, reference: &LinkedBlock, ledger: &dyn AccountLedger) -> Self {
        let effective_balance = ledger.effective_balance(account_id);
        let hit = stake_hit(&stake_generation_signature(
            reference.generation_signature(),
            account_id,
        ));
        Self {
            account_id,
            effective_balance,
            hit,
            hit_time: stake_hit_time(
                reference.timestamp(),
                hit,
                reference.base_target(),
                effective_balance,
            ),
        }
    }

    /// Seconds after the reference block, never negative.
    pub fn deadline(&self, reference_timestamp: u32) -> Option<u64> {
        self.hit_time
            .map(|t| t.saturating_sub(u64::from(reference_timestamp)))
    }
}

struct Ranking {
    head_id: BlockId,
    sorted: Vec<(Arc<Forger>, ForgingCandidate)>,
}

/// Stake-track leader election.
pub struct StakeForger {
    engine: Arc<ConsensusEngine>,
    source: Arc<dyn TransactionSource>,
    config: ProductionConfig,
    retry: RetryPolicy,
    forgers: RwLock<HashMap<AccountId, Arc<Forger>>>,
    ranking: Mutex<Option<Ranking>>,
    last_tick: Mutex<Option<u32>>,
}

impl StakeForger {
    pub fn new(
        engine: Arc<ConsensusEngine>,
        source: Arc<dyn TransactionSource>,
        config: ProductionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            source,
            retry: RetryPolicy::from_config(&config),
            config,
            forgers: RwLock::new(HashMap::new()),
            ranking: Mutex::new(None),
            last_tick: Mutex::new(None),
        })
    }

    /// Unlock an account for forging. Registering the same account twice
    /// returns the existing registration.
    pub fn start_forging(&self, secret_phrase: &str) -> Result<Arc<Forger>> {
        let forger = Arc::new(Forger::from_secret_phrase(secret_phrase)?);
        let account = forger.account_id();
        {
            let mut forgers = self.forgers.write();
            if let Some(existing) = forgers.get(&account) {
                debug!("[hc-forge] Account {} is already forging", account);
                return Ok(Arc::clone(existing));
            }
            forgers.insert(account, Arc::clone(&forger));
        }
        self.invalidate();

        self.engine
            .events()
            .publish(ConsensusEvent::LeaderRegistered {
                account_id: account,
            });
        match self.deadline(account) {
            Some(deadline) => info!(
                "[hc-forge] Account {} started forging, deadline {} seconds",
                account, deadline
            ),
            None => info!(
                "[hc-forge] Account {} started forging without effective balance",
                account
            ),
        }
        Ok(forger)
    }

    /// Lock an account again. Returns the removed registration, if any.
    pub fn stop_forging(&self, secret_phrase: &str) -> Result<Option<Arc<Forger>>> {
        let account = Forger::from_secret_phrase(secret_phrase)?.account_id();
        let removed = self.forgers.write().remove(&account);
        if removed.is_some() {
            self.invalidate();
            info!("[hc-forge] Account {} stopped forging", account);
            self.engine
                .events()
                .publish(ConsensusEvent::LeaderUnregistered {
                    account_id: account,
                });
        }
        Ok(removed)
    }

    pub fn forger(&self, account: AccountId) -> Option<Arc<Forger>> {
        self.forgers.read().get(&account).cloned()
    }

    /// All registrations, by account id.
    pub fn forgers(&self) -> Vec<Arc<Forger>> {
        let mut all: Vec<_> = self.forgers.read().values().cloned().collect();
        all.sort_by_key(|f| f.account_id());
        all
    }

    /// Seconds from the stake track tip until `account` may forge.
    pub fn deadline(&self, account: AccountId) -> Option<u64> {
        self.forger(account)?;
        let reference = self.engine.track_tip(Track::Stake);
        ForgingCandidate::compute(account, &reference, self.engine.ledger().as_ref())
            .deadline(reference.timestamp())
    }

    /// Current ranking, earliest effective hit time first.
    pub fn ranked(&self) -> Vec<ForgingCandidate> {
        let section = self.engine.lock();
        let mut ranking = self.ranking.lock();
        self.refresh(&section, &mut ranking);
        ranking
            .as_ref()
            .map(|r| r.sorted.iter().map(|(_, c)| *c).collect())
            .unwrap_or_default()
    }

    /// One scheduling round. Returns the forged block, if any.
    #[instrument(skip(self), name = "stake_tick")]
    pub fn tick(&self) -> Result<Option<Arc<LinkedBlock>>> {
        let now = self.engine.clock().now();
        {
            let mut last = self.last_tick.lock();
            if *last == Some(now) {
                return Ok(None);
            }
            *last = Some(now);
        }

        let mut section = self.engine.lock();
        let head = Arc::clone(section.head());
        if head.height() < self.config.forging_min_height || now <= head.timestamp() {
            return Ok(None);
        }
        let reference = Arc::clone(section.chain().track_tip(Track::Stake));

        let mut ranking = self.ranking.lock();
        self.refresh(&section, &mut ranking);
        let Some(ranking) = ranking.as_ref() else {
            return Ok(None);
        };

        let elapsed = i64::from(now) - i64::from(reference.timestamp());
        for (forger, candidate) in &ranking.sorted {
            match candidate.hit_time {
                Some(hit_time) if hit_time <= u64::from(now) + 1 => {}
                _ => return Ok(None),
            }
            if !verify_stake_hit(
                candidate.hit,
                reference.base_target(),
                candidate.effective_balance,
                elapsed,
            ) {
                continue;
            }
            let block = self.forge(&mut section, forger, &reference, now)?;
            return Ok(Some(block));
        }
        Ok(None)
    }

    fn forge(
        &self,
        section: &mut HeadSection<'_>,
        forger: &Forger,
        reference: &LinkedBlock,
        timestamp: u32,
    ) -> Result<Arc<LinkedBlock>> {
        let template = BlockTemplate {
            version: self.config.block_version,
            timestamp,
            generator_public_key: forger.public_key,
            generation_signature: stake_generation_signature(
                reference.generation_signature(),
                forger.account_id,
            ),
            mode: BlockMode::Stake,
        };
        let limits = self.engine.config().header_limits();

        let block = self
            .retry
            .run(self.engine.clock().as_ref(), timestamp, || {
                let parent = Arc::clone(section.head());
                let payload = self.source.payload(&parent, timestamp);
                let header = template
                    .assemble(&parent, payload, &limits)?
                    .sign(&forger.keypair);
                section.push_block(header)
            })?;

        info!(
            "[hc-forge] Account {} forged block {} at height {}",
            forger.account_id,
            block.id(),
            block.height()
        );
        self.engine
            .events()
            .publish(ConsensusEvent::BlockProducedLocally {
                block_id: block.id(),
                height: block.height(),
                track: Track::Stake,
                generator_id: forger.account_id,
            });
        Ok(block)
    }

    /// Recompute the ranking if the head moved since it was built.
    fn refresh(&self, section: &HeadSection<'_>, ranking: &mut Option<Ranking>) {
        let head_id = section.head().id();
        if ranking.as_ref().map(|r| r.head_id) == Some(head_id) {
            return;
        }

        let reference = section.chain().track_tip(Track::Stake);
        let ledger = self.engine.ledger().as_ref();
        let mut sorted: Vec<_> = self
            .forgers
            .read()
            .values()
            .map(|f| {
                let candidate = ForgingCandidate::compute(f.account_id, reference, ledger);
                (Arc::clone(f), candidate)
            })
            .collect();
        sorted.sort_by(|(_, a), (_, b)| {
            compare_stake_candidates(a.hit, a.effective_balance, b.hit, b.effective_balance)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        for (_, candidate) in &sorted {
            if let Some(deadline_secs) = candidate.deadline(reference.timestamp()) {
                self.engine
                    .events()
                    .publish(ConsensusEvent::GenerationDeadline {
                        account_id: candidate.account_id,
                        deadline_secs,
                    });
            }
        }
        debug!(
            head = %head_id,
            forgers = sorted.len(),
            "[hc-forge] Ranking recomputed"
        );
        *ranking = Some(Ranking { head_id, sorted });
    }

    fn invalidate(&self) {
        *self.ranking.lock() = None;
    }
}
