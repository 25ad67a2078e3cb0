//! Configuration types for the consensus engine

use crate::domain::{
    ConsensusError, ConsensusResult, DifficultyAdjuster, HeaderLimits, Track, TrackParams,
    MAX_NUMBER_OF_TRANSACTIONS, MAX_PAYLOAD_LENGTH, ONE_COIN,
};
use serde::Deserialize;

/// Initial base target of the stake track.
pub const INITIAL_STAKE_BASE_TARGET: u64 = 307_445_734;

/// Initial base target of the capacity track.
pub const INITIAL_CAPACITY_BASE_TARGET: u64 = 18_325_193_796;

/// Height above which capacity proofs are refused.
pub const CAPACITY_RETIREMENT_HEIGHT: u32 = 2_365_200;

/// Consensus rules. Every node on a network must agree on these values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub initial_stake_base_target: u64,
    pub initial_capacity_base_target: u64,
    /// Expected seconds between stake blocks.
    pub stake_block_period_secs: u64,
    /// Expected seconds between capacity blocks.
    pub capacity_block_period_secs: u64,
    /// Height at which the weighted 24-block rule replaces the 4-block mean.
    pub diff_adjust_change_height: u32,
    pub capacity_retirement_height: u32,
    /// Added to cumulative difficulty by every capacity block.
    pub capacity_difficulty_bonus: u64,
    /// Minor units credited to a stake block generator.
    pub stake_block_reward: u64,
    /// Minor units credited to a capacity block generator.
    pub capacity_block_reward: u64,
    pub max_payload_length: u32,
    pub max_transactions_per_block: usize,
    pub max_timestamp_drift_secs: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            initial_stake_base_target: INITIAL_STAKE_BASE_TARGET,
            initial_capacity_base_target: INITIAL_CAPACITY_BASE_TARGET,
            stake_block_period_secs: 30,
            capacity_block_period_secs: 240,
            diff_adjust_change_height: 2_700,
            capacity_retirement_height: CAPACITY_RETIREMENT_HEIGHT,
            capacity_difficulty_bonus: 217,
            stake_block_reward: 2 * ONE_COIN,
            capacity_block_reward: 217 * ONE_COIN,
            max_payload_length: MAX_PAYLOAD_LENGTH,
            max_transactions_per_block: MAX_NUMBER_OF_TRANSACTIONS,
            max_timestamp_drift_secs: 15,
        }
    }
}

impl ConsensusConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> ConsensusResult<()> {
        let invalid = |msg: &str| Err(ConsensusError::InvalidConfig(msg.to_string()));
        if self.initial_stake_base_target == 0 || self.initial_capacity_base_target == 0 {
            return invalid("initial base targets must be positive");
        }
        if self.stake_block_period_secs == 0 || self.capacity_block_period_secs == 0 {
            return invalid("block periods must be positive");
        }
        if self.max_transactions_per_block > MAX_NUMBER_OF_TRANSACTIONS {
            return invalid("max_transactions_per_block exceeds the format limit");
        }
        if self.diff_adjust_change_height < 4 {
            return invalid("diff_adjust_change_height must be at least 4");
        }
        Ok(())
    }

    pub fn header_limits(&self) -> HeaderLimits {
        HeaderLimits {
            max_payload_length: self.max_payload_length,
            max_transactions: self.max_transactions_per_block,
        }
    }

    pub fn initial_base_target(&self, track: Track) -> u64 {
        match track {
            Track::Stake => self.initial_stake_base_target,
            Track::Capacity => self.initial_capacity_base_target,
        }
    }

    pub fn block_reward(&self, track: Track) -> u64 {
        match track {
            Track::Stake => self.stake_block_reward,
            Track::Capacity => self.capacity_block_reward,
        }
    }

    pub fn difficulty_adjuster(&self) -> DifficultyAdjuster {
        DifficultyAdjuster::new(
            TrackParams {
                initial_base_target: self.initial_stake_base_target,
                period_secs: self.stake_block_period_secs,
            },
            TrackParams {
                initial_base_target: self.initial_capacity_base_target,
                period_secs: self.capacity_block_period_secs,
            },
            self.diff_adjust_change_height,
            self.capacity_difficulty_bonus,
        )
    }
}
