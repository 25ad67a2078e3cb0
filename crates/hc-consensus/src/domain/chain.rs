//! Chain state management
//!
//! The canonical chain from genesis to head. Blocks only ever attach to the
//! head and only ever leave from the head, so heights index a vector.

use super::block::{LinkedBlock, Track};
use super::difficulty::{BlockHistory, TrackSample};
use super::error::{ConsensusError, ConsensusResult};
use primitive_types::U256;
use shared_types::BlockId;
use std::collections::HashMap;
use std::sync::Arc;

/// Canonical chain with an id index.
pub struct ChainState {
    /// Linked blocks by height. Never empty: genesis cannot be popped.
    blocks: Vec<Arc<LinkedBlock>>,
    index: HashMap<BlockId, u32>,
}

impl ChainState {
    /// Create chain state with genesis block
    pub fn with_genesis(genesis: LinkedBlock) -> Self {
        let id = genesis.id();
        Self {
            blocks: vec![Arc::new(genesis)],
            index: HashMap::from([(id, 0)]),
        }
    }

    pub fn head(&self) -> &Arc<LinkedBlock> {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn genesis(&self) -> &Arc<LinkedBlock> {
        &self.blocks[0]
    }

    pub fn height(&self) -> u32 {
        self.head().height()
    }

    pub fn cumulative_difficulty(&self) -> U256 {
        self.head().cumulative_difficulty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Arc<LinkedBlock>> {
        self.index
            .get(&id)
            .and_then(|height| self.blocks.get(*height as usize))
    }

    pub fn at_height(&self, height: u32) -> Option<&Arc<LinkedBlock>> {
        self.blocks.get(height as usize)
    }

    /// Id of the block linked on top of `id`, if any.
    pub fn next_block_id(&self, id: BlockId) -> Option<BlockId> {
        let height = *self.index.get(&id)?;
        self.at_height(height + 1).map(|b| b.id())
    }

    /// Newest block of `track` at or below the head; genesis if the track
    /// has no blocks yet.
    pub fn track_tip(&self, track: Track) -> &Arc<LinkedBlock> {
        self.head()
            .tips()
            .get(track)
            .and_then(|height| self.at_height(height))
            .unwrap_or_else(|| self.genesis())
    }

    /// Whether a competing branch tip should replace the local head.
    pub fn prefers(&self, cumulative_difficulty: U256) -> bool {
        cumulative_difficulty > self.cumulative_difficulty()
    }

    /// Attach a block on top of the head.
    pub(crate) fn push(&mut self, block: LinkedBlock) -> ConsensusResult<Arc<LinkedBlock>> {
        let head = self.head();
        if block.header().previous_block_id() != head.id() || block.height() != head.height() + 1 {
            return Err(ConsensusError::InvalidState(format!(
                "block {} at height {} does not extend head {} at height {}",
                block.id(),
                block.height(),
                head.id(),
                head.height()
            )));
        }
        let block = Arc::new(block);
        self.index.insert(block.id(), block.height());
        self.blocks.push(Arc::clone(&block));
        Ok(block)
    }

    /// Detach the head. Genesis stays.
    pub(crate) fn pop(&mut self) -> Option<Arc<LinkedBlock>> {
        if self.blocks.len() <= 1 {
            return None;
        }
        let block = self.blocks.pop()?;
        self.index.remove(&block.id());
        Some(block)
    }
}

impl BlockHistory for ChainState {
    fn last_blocks(&self, track: Track, n: usize) -> Vec<TrackSample> {
        let mut samples = Vec::with_capacity(n);
        let mut cursor = self.head().tips().get(track);
        while let Some(height) = cursor {
            if samples.len() == n {
                break;
            }
            let Some(block) = self.at_height(height) else {
                break;
            };
            samples.push(TrackSample {
                base_target: block.base_target(),
                timestamp: block.timestamp(),
            });
            cursor = match height.checked_sub(1) {
                Some(below) => self.at_height(below).and_then(|b| b.tips().get(track)),
                None => None,
            };
        }
        samples
    }
}
