//! # Capacity Miner
//!
//! One-shot deadline submissions from plot holders. Each submitted
//! `(account, nonce)` is scored once against the capacity track tip; the
//! best submission per account is kept until its deadline passes (then a
//! block is produced) or the capacity track grows past its target height
//! (then it is evicted).

use super::assembly::BlockTemplate;
use super::retry::RetryPolicy;
use crate::config::ProductionConfig;
use crate::error::Result;
use crate::ports::TransactionSource;
use hc_consensus::domain::proof::{capacity_generation_signature, capacity_proof};
use hc_consensus::{
    account_id_of, BlockMode, ConsensusEngine, ConsensusError, HeadSection, LinkedBlock, Track,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use shared_bus::ConsensusEvent;
use shared_crypto::Ed25519KeyPair;
use shared_types::wire::hex32;
use shared_types::{AccountId, Hash, PublicKey};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What a plot holder needs to search its plots for the next block.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningInfo {
    pub height: u32,
    #[serde(with = "hex32")]
    pub generation_signature: Hash,
    #[serde_as(as = "DisplayFromStr")]
    pub base_target: u64,
}

/// A scored nonce waiting for its deadline.
#[derive(Debug)]
pub struct NonceSubmission {
    account_id: AccountId,
    public_key: PublicKey,
    nonce: u64,
    target_height: u32,
    generation_signature: Hash,
    deadline: u64,
    signer: Ed25519KeyPair,
}

impl NonceSubmission {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Capacity track height this submission competes for.
    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    /// Seconds after the capacity track tip.
    pub fn deadline(&self) -> u64 {
        self.deadline
    }

    fn improves_on(&self, current: &NonceSubmission) -> bool {
        self.target_height > current.target_height
            || (self.target_height == current.target_height && self.deadline < current.deadline)
    }
}

/// Capacity-track block production.
pub struct CapacityMiner {
    engine: Arc<ConsensusEngine>,
    source: Arc<dyn TransactionSource>,
    config: ProductionConfig,
    retry: RetryPolicy,
    submissions: RwLock<HashMap<AccountId, Arc<NonceSubmission>>>,
}

impl CapacityMiner {
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
            submissions: RwLock::new(HashMap::new()),
        })
    }

    /// Parameters of the next capacity block.
    pub fn mining_info(&self) -> MiningInfo {
        let reference = self.engine.track_tip(Track::Capacity);
        MiningInfo {
            height: reference.height() + 1,
            generation_signature: capacity_generation_signature(
                reference.generation_signature(),
                reference.generator_id(),
            ),
            base_target: reference.base_target(),
        }
    }

    /// Submit a nonce for the account behind `secret_phrase`.
    pub fn submit_nonce(&self, secret_phrase: &str, nonce: u64) -> Result<Arc<NonceSubmission>> {
        let signer = Ed25519KeyPair::from_secret_phrase(secret_phrase)?;
        let public_key = *signer.public_key().as_bytes();
        self.submit_nonce_for(signer, public_key, nonce)
    }

    /// Submit a nonce for the plot of `public_key`, signed by `signer`.
    ///
    /// The signer differs from the plot owner when the owner assigned its
    /// rewards to a pool. Returns the submission kept for the account,
    /// which is the earlier one if the new nonce is not better.
    pub fn submit_nonce_for(
        &self,
        signer: Ed25519KeyPair,
        public_key: PublicKey,
        nonce: u64,
    ) -> Result<Arc<NonceSubmission>> {
        // Held until the submission is stored so a capacity block cannot
        // land between the retirement check, the proof and the insert.
        let section = self.engine.lock();
        let height = section.head().height();
        let reference = Arc::clone(section.chain().track_tip(Track::Capacity));
        let retirement = self.engine.config().capacity_retirement_height;
        if height >= retirement {
            return Err(ConsensusError::ProofFamilyRetired { height }.into());
        }

        let account_id = account_id_of(&public_key);
        let proof = capacity_proof(
            reference.generation_signature(),
            reference.generator_id(),
            reference.height(),
            reference.base_target(),
            account_id,
            nonce,
        );
        let submission = Arc::new(NonceSubmission {
            account_id,
            public_key,
            nonce,
            target_height: reference.height() + 1,
            generation_signature: proof.generation_signature,
            deadline: proof.deadline,
            signer,
        });

        {
            let mut submissions = self.submissions.write();
            if let Some(current) = submissions.get(&account_id) {
                if !submission.improves_on(current) {
                    debug!(
                        "[hc-mine] Account {} already has a better nonce (deadline {}s)",
                        account_id, current.deadline
                    );
                    return Ok(Arc::clone(current));
                }
            }
            submissions.insert(account_id, Arc::clone(&submission));
        }
        drop(section);

        info!(
            "[hc-mine] Account {} started mining, deadline {} seconds",
            account_id, submission.deadline
        );
        self.engine
            .events()
            .publish(ConsensusEvent::GenerationDeadline {
                account_id,
                deadline_secs: submission.deadline,
            });
        Ok(submission)
    }

    pub fn submission(&self, account: AccountId) -> Option<Arc<NonceSubmission>> {
        self.submissions.read().get(&account).cloned()
    }

    /// Pending submissions, earliest deadline first.
    pub fn submissions(&self) -> Vec<Arc<NonceSubmission>> {
        let mut all: Vec<_> = self.submissions.read().values().cloned().collect();
        all.sort_by_key(|s| (s.deadline, s.account_id));
        all
    }

    /// One scheduling round. Returns the mined block, if any.
    #[instrument(skip(self), name = "capacity_tick")]
    pub fn tick(&self) -> Result<Option<Arc<LinkedBlock>>> {
        let mut section = self.engine.lock();
        let head = Arc::clone(section.head());
        let reference = Arc::clone(section.chain().track_tip(Track::Capacity));

        if head.height() >= self.engine.config().capacity_retirement_height {
            self.submissions.write().clear();
            return Ok(None);
        }
        self.submissions
            .write()
            .retain(|_, s| s.target_height > reference.height());

        let now = self.engine.clock().now();
        if now <= head.timestamp() {
            return Ok(None);
        }
        let elapsed = u64::from(now.saturating_sub(reference.timestamp()));

        for submission in self.submissions() {
            if elapsed <= submission.deadline {
                // Sorted by deadline: nothing further is due either.
                break;
            }
            match self.mine(&mut section, &submission, now) {
                Ok(block) => {
                    self.submissions.write().remove(&submission.account_id);
                    return Ok(Some(block));
                }
                Err(e) => {
                    debug!(
                        account = %submission.account_id,
                        error = %e,
                        "[hc-mine] Submission failed"
                    );
                }
            }
        }
        Ok(None)
    }

    fn mine(
        &self,
        section: &mut HeadSection<'_>,
        submission: &NonceSubmission,
        timestamp: u32,
    ) -> Result<Arc<LinkedBlock>> {
        let template = BlockTemplate {
            version: self.config.block_version,
            timestamp,
            generator_public_key: submission.public_key,
            generation_signature: submission.generation_signature,
            mode: BlockMode::Capacity {
                nonce: submission.nonce,
            },
        };
        let limits = self.engine.config().header_limits();

        let block = self
            .retry
            .run(self.engine.clock().as_ref(), timestamp, || {
                let parent = Arc::clone(section.head());
                let payload = self.source.payload(&parent, timestamp);
                let header = template
                    .assemble(&parent, payload, &limits)?
                    .sign(&submission.signer);
                section.push_block(header)
            })?;

        info!(
            "[hc-mine] Account {} mined block {} at height {} (nonce: {})",
            submission.account_id,
            block.id(),
            block.height(),
            submission.nonce
        );
        self.engine
            .events()
            .publish(ConsensusEvent::BlockProducedLocally {
                block_id: block.id(),
                height: block.height(),
                track: Track::Capacity,
                generator_id: submission.account_id,
            });
        Ok(block)
    }
}
