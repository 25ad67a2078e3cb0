//! In-memory ledger adapter
//!
//! Implements the `AccountLedger` port for tests and single-process demos.
//! The whole balance counts as aged stake.

use crate::domain::{account_id_of, UnlinkedHeader, ONE_COIN};
use crate::ports::{AccountLedger, RewardRecipientAssignment};
use parking_lot::RwLock;
use shared_types::{AccountId, PublicKey, TransactionId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, Default)]
struct AccountRecord {
    balance: u64,
    public_key: Option<PublicKey>,
    reward_recipient: Option<RewardRecipientAssignment>,
}

/// In-memory ledger with optional transaction refusal.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountId, AccountRecord>>,
    consumed: RwLock<HashSet<TransactionId>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or top up an account, binding its public key.
    pub fn fund(&self, public_key: PublicKey, balance: u64) -> AccountId {
        let id = account_id_of(&public_key);
        let mut accounts = self.accounts.write();
        let record = accounts.entry(id).or_default();
        record.balance = record.balance.saturating_add(balance);
        record.public_key = Some(public_key);
        id
    }

    /// Create an account without binding a key.
    pub fn fund_unbound(&self, account: AccountId, balance: u64) {
        let mut accounts = self.accounts.write();
        let record = accounts.entry(account).or_default();
        record.balance = record.balance.saturating_add(balance);
    }

    pub fn set_reward_recipient(&self, account: AccountId, assignment: RewardRecipientAssignment) {
        self.accounts
            .write()
            .entry(account)
            .or_default()
            .reward_recipient = Some(assignment);
    }

    /// Mark transactions as already applied so blocks carrying them are refused.
    pub fn consume(&self, ids: impl IntoIterator<Item = TransactionId>) {
        self.consumed.write().extend(ids);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }
}

impl AccountLedger for InMemoryLedger {
    fn has_account(&self, account: AccountId) -> bool {
        self.accounts.read().contains_key(&account)
    }

    fn balance(&self, account: AccountId) -> u64 {
        self.accounts
            .read()
            .get(&account)
            .map(|r| r.balance)
            .unwrap_or(0)
    }

    fn effective_balance(&self, account: AccountId) -> u64 {
        self.balance(account) / ONE_COIN
    }

    fn effective_balance_after_spend(&self, account: AccountId, spend: u64) -> u64 {
        self.balance(account).min(spend) / ONE_COIN
    }

    fn reward_recipient(&self, account: AccountId) -> Option<RewardRecipientAssignment> {
        self.accounts
            .read()
            .get(&account)
            .and_then(|r| r.reward_recipient)
    }

    fn public_key(&self, account: AccountId) -> Option<PublicKey> {
        self.accounts.read().get(&account).and_then(|r| r.public_key)
    }

    fn check_transactions(&self, header: &UnlinkedHeader) -> Result<(), String> {
        let consumed = self.consumed.read();
        match header
            .transactions()
            .iter()
            .find(|tx| consumed.contains(&tx.id))
        {
            Some(tx) => Err(format!("transaction {} already applied", tx.id)),
            None => Ok(()),
        }
    }
}
