//! Difficulty adjustment
//!
//! Each track keeps its own base target. Lower base target means a harder
//! target window. Three regimes apply by chain height:
//!
//! | Height | Rule |
//! |--------|------|
//! | `< 4` | initial base target |
//! | `< change height` | mean of last 4 same-track targets, scaled by elapsed time, ±10% |
//! | otherwise | weighted mean of last 24, elapsed clamped to ½..2 windows, ±20% of current |
//!
//! Every branch floors the result at 1.

use super::block::{Track, UnsignedHeader};
use primitive_types::U256;
use shared_types::AccountId;
use std::collections::BTreeMap;

/// Blocks averaged by the short-window rule.
pub const SHORT_WINDOW: usize = 4;

/// Blocks averaged by the weighted rule.
pub const LONG_WINDOW: usize = 24;

/// Base target and timestamp of one historical block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackSample {
    pub base_target: u64,
    pub timestamp: u32,
}

/// Read access to recent same-track history on the canonical chain.
pub trait BlockHistory {
    /// Up to `n` blocks of `track`, newest first, ending at the head.
    fn last_blocks(&self, track: Track, n: usize) -> Vec<TrackSample>;
}

/// Per-track tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackParams {
    pub initial_base_target: u64,
    pub period_secs: u64,
}

/// Computes base targets and cumulative difficulty for new blocks.
#[derive(Clone, Debug)]
pub struct DifficultyAdjuster {
    stake: TrackParams,
    capacity: TrackParams,
    change_height: u32,
    capacity_bonus: u64,
}

impl DifficultyAdjuster {
    pub fn new(
        stake: TrackParams,
        capacity: TrackParams,
        change_height: u32,
        capacity_bonus: u64,
    ) -> Self {
        Self {
            stake,
            capacity,
            change_height,
            capacity_bonus,
        }
    }

    pub fn params(&self, track: Track) -> TrackParams {
        match track {
            Track::Stake => self.stake,
            Track::Capacity => self.capacity,
        }
    }

    /// Base target for a block of `track` at `height` with `timestamp`.
    pub fn next_base_target(
        &self,
        track: Track,
        height: u32,
        timestamp: u32,
        history: &dyn BlockHistory,
    ) -> u64 {
        let params = self.params(track);
        if height < SHORT_WINDOW as u32 {
            return params.initial_base_target.max(1);
        }

        let target = if height < self.change_height {
            let rows = history.last_blocks(track, SHORT_WINDOW);
            short_window_target(&rows, timestamp, params)
        } else {
            let rows = history.last_blocks(track, LONG_WINDOW);
            weighted_target(&rows, timestamp, params)
        };
        target.max(1)
    }

    /// `parent + coin_age`, plus the fixed bonus on the capacity track
    /// (genesis starts at zero).
    pub fn cumulative_difficulty(&self, track: Track, parent: Option<U256>, coin_age: u64) -> U256 {
        let Some(parent) = parent else {
            return U256::zero();
        };
        let bonus = match track {
            Track::Stake => 0,
            Track::Capacity => self.capacity_bonus,
        };
        parent
            .saturating_add(U256::from(coin_age))
            .saturating_add(U256::from(bonus))
    }
}

// A track with no blocks of its own yet keeps its initial target in both regimes.
fn short_window_target(rows: &[TrackSample], timestamp: u32, params: TrackParams) -> u64 {
    let Some(oldest) = rows.last() else {
        return params.initial_base_target;
    };
    let avg = rows.iter().map(|r| u128::from(r.base_target)).sum::<u128>() / rows.len() as u128;
    let elapsed = u128::from(timestamp.saturating_sub(oldest.timestamp));
    let expected = u128::from(params.period_secs) * SHORT_WINDOW as u128;

    let mut target = avg * elapsed / expected.max(1);
    let floor = avg * 9 / 10;
    let ceiling = avg * 11 / 10;
    if target < floor {
        target = floor;
    }
    if target == 0 {
        target = 1;
    }
    if target > ceiling {
        target = ceiling;
    }
    saturate(target)
}

fn weighted_target(rows: &[TrackSample], timestamp: u32, params: TrackParams) -> u64 {
    let (Some(newest), Some(oldest)) = (rows.first(), rows.last()) else {
        return params.initial_base_target;
    };
    let current = u128::from(newest.base_target);

    // Running weighted mean, newest first.
    let mut avg = 0u128;
    for (i, row) in rows.iter().enumerate() {
        let counter = i as u128 + 2;
        let bt = u128::from(row.base_target);
        avg = if counter == 2 {
            bt
        } else {
            (avg * counter + bt) / (counter + 1)
        };
    }

    let window = u128::from(params.period_secs) * LONG_WINDOW as u128;
    let elapsed = u128::from(timestamp.saturating_sub(oldest.timestamp))
        .clamp(window / 2, window * 2);

    let mut target = avg * elapsed / window.max(1);
    if target == 0 {
        target = 1;
    }
    target = target.clamp(current * 8 / 10, (current * 12 / 10).max(current * 8 / 10));
    saturate(target)
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Hypothetical spend per account used for destroyed coin age.
///
/// Senders contribute their summed amounts. On the stake track the
/// generator's entry is replaced by its current ledger balance; the
/// caller adds the block's fees and reward on top.
pub fn coin_age_spends(
    header: &UnsignedHeader,
    generator_balance: Option<(AccountId, u64)>,
) -> BTreeMap<AccountId, u64> {
    let mut spends = BTreeMap::new();
    for tx in header.transactions() {
        let entry = spends.entry(tx.sender_id).or_insert(0u64);
        *entry = entry.saturating_add(tx.amount);
    }
    if let Some((generator, balance)) = generator_balance {
        spends.insert(generator, balance);
    }
    spends
}
