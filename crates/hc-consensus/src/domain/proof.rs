//! Generation proofs
//!
//! Pure functions behind both leader-election families. The validator and
//! the block producers share them so that a locally built block passes the
//! same checks a remote one does.

use super::plot::{MiningPlot, SCOOPS_PER_PLOT};
use shared_crypto::{sha256_many, shabal256_many};
use shared_types::{id_from_digest, AccountId, Hash};
use std::cmp::Ordering;

// =============================================================================
// STAKE
// =============================================================================

/// `SHA256(previous generation signature ++ account id big-endian)`.
pub fn stake_generation_signature(previous: &Hash, account: AccountId) -> Hash {
    sha256_many(&[previous, &account.to_be_bytes()])
}

/// Hit carried by a stake generation signature.
pub fn stake_hit(generation_signature: &Hash) -> u64 {
    id_from_digest(generation_signature)
}

/// Whether `hit` falls under the target window after `elapsed` seconds.
///
/// The window is `effective_target * elapsed` where
/// `effective_target = base_target * effective_balance`.
pub fn verify_stake_hit(hit: u64, base_target: u64, effective_balance: u64, elapsed: i64) -> bool {
    if elapsed <= 0 {
        return false;
    }
    let effective_target = u128::from(base_target) * u128::from(effective_balance);
    let elapsed = elapsed as u128;
    let target = effective_target
        .saturating_mul(elapsed - 1)
        .saturating_add(effective_target);
    u128::from(hit) < target
}

/// Timestamp at which a stake hit matures against a reference block.
///
/// Returns `None` when the account has no weight.
pub fn stake_hit_time(
    reference_timestamp: u32,
    hit: u64,
    base_target: u64,
    effective_balance: u64,
) -> Option<u64> {
    let effective_target = u128::from(base_target) * u128::from(effective_balance);
    if effective_target == 0 {
        return None;
    }
    let wait = u128::from(hit) / effective_target;
    Some(u64::from(reference_timestamp).saturating_add(u64::try_from(wait).unwrap_or(u64::MAX)))
}

/// Order two stake candidates by effective hit time without dividing.
///
/// Compares `a.hit * b.balance` against `b.hit * a.balance`.
pub fn compare_stake_candidates(
    a_hit: u64,
    a_balance: u64,
    b_hit: u64,
    b_balance: u64,
) -> Ordering {
    let left = u128::from(a_hit) * u128::from(b_balance);
    let right = u128::from(b_hit) * u128::from(a_balance);
    left.cmp(&right)
}

// =============================================================================
// CAPACITY
// =============================================================================

/// `Shabal256(previous generation signature ++ previous generator id big-endian)`.
pub fn capacity_generation_signature(previous: &Hash, previous_generator: AccountId) -> Hash {
    shabal256_many(&[previous, &previous_generator.to_be_bytes()])
}

/// Scoop selected for a block at `height`.
pub fn scoop_index(generation_signature: &Hash, height: u64) -> usize {
    let digest = shabal256_many(&[generation_signature, &height.to_be_bytes()]);
    // Low 12 bits of the digest read as a big-endian number.
    let tail = u16::from_be_bytes([digest[30], digest[31]]) as usize;
    tail % SCOOPS_PER_PLOT
}

/// Hit for a plot at a given scoop.
pub fn capacity_hit(plot: &MiningPlot, generation_signature: &Hash, scoop: usize) -> u64 {
    id_from_digest(&plot.hash_scoop(generation_signature, scoop))
}

/// Seconds after the reference block at which a capacity hit matures.
pub fn capacity_deadline(hit: u64, base_target: u64) -> u64 {
    hit / base_target.max(1)
}

/// Everything a miner needs for one `(account, nonce)` at a height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityProof {
    pub generation_signature: Hash,
    pub scoop: usize,
    pub hit: u64,
    pub deadline: u64,
}

/// Compute the full capacity proof for a plot against a reference block.
pub fn capacity_proof(
    reference_generation_signature: &Hash,
    reference_generator: AccountId,
    reference_height: u32,
    base_target: u64,
    account: AccountId,
    nonce: u64,
) -> CapacityProof {
    let generation_signature =
        capacity_generation_signature(reference_generation_signature, reference_generator);
    let scoop = scoop_index(&generation_signature, u64::from(reference_height) + 1);
    let plot = MiningPlot::new(account, nonce);
    let hit = capacity_hit(&plot, &generation_signature, scoop);
    CapacityProof {
        generation_signature,
        scoop,
        hit,
        deadline: capacity_deadline(hit, base_target),
    }
}
