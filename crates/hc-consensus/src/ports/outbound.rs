//! Driven ports (Outbound dependencies)

use crate::domain::UnlinkedHeader;
use shared_types::{AccountId, PublicKey};
use std::sync::atomic::{AtomicU32, Ordering};

/// Pool-mining delegation: capacity blocks of an account are signed by the
/// recipient once `from_height` is reached, by the previous one before.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardRecipientAssignment {
    pub from_height: u32,
    pub recipient_id: AccountId,
    pub previous_recipient_id: AccountId,
}

/// Account/ledger view used for stake weighting and key lookup.
///
/// Calls happen while the chain lock is held, so implementations must not
/// call back into the engine.
pub trait AccountLedger: Send + Sync {
    /// Whether the account exists at all.
    fn has_account(&self, account: AccountId) -> bool;

    /// Current balance in minor units.
    fn balance(&self, account: AccountId) -> u64;

    /// Stake weight in whole coins.
    fn effective_balance(&self, account: AccountId) -> u64;

    /// Stake weight destroyed if `spend` minor units left the account.
    fn effective_balance_after_spend(&self, account: AccountId, spend: u64) -> u64;

    /// Active reward-recipient assignment, if any.
    fn reward_recipient(&self, account: AccountId) -> Option<RewardRecipientAssignment>;

    /// Public key bound to the account, if any.
    fn public_key(&self, account: AccountId) -> Option<PublicKey>;

    /// Admissibility of the block's transaction set against current state.
    ///
    /// An `Err` means another block already consumed part of the set.
    fn check_transactions(&self, _header: &UnlinkedHeader) -> Result<(), String> {
        Ok(())
    }
}

/// Time source: seconds since the genesis epoch.
pub trait EpochClock: Send + Sync {
    fn now(&self) -> u32;
}

/// Wall clock relative to a configured Unix epoch start.
#[derive(Clone, Copy, Debug)]
pub struct SystemEpochClock {
    epoch_start_unix_secs: u64,
}

impl SystemEpochClock {
    pub fn new(epoch_start_unix_secs: u64) -> Self {
        Self {
            epoch_start_unix_secs,
        }
    }
}

impl EpochClock for SystemEpochClock {
    fn now(&self) -> u32 {
        let unix = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let since_epoch = unix.saturating_sub(self.epoch_start_unix_secs);
        u32::try_from(since_epoch).unwrap_or(u32::MAX)
    }
}

/// Hand-driven clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn new(now: u32) -> Self {
        Self {
            now: AtomicU32::new(now),
        }
    }

    pub fn set(&self, now: u32) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u32) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl EpochClock for ManualClock {
    fn now(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}
