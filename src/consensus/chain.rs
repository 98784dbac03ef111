//! Read-only view of the chain index
//!
//! The difficulty rules only ever look backwards from a block, one height at
//! a time. [`ChainView`] is that capability; the node's chain index supplies
//! it, and [`InMemoryChain`] is a vector-backed implementation for tests and
//! tools.

use crate::consensus::work::block_proof;
use crate::core::{ChainWork, CompactTarget, U256};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// The fields of an indexed block the difficulty rules read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    /// Height above genesis
    pub height: u32,
    /// Header timestamp in seconds
    pub time: i64,
    /// Compact target claimed by the header
    pub bits: CompactTarget,
    /// Total work of the chain up to and including this block
    pub chain_work: ChainWork,
}

/// Height-indexed ancestor lookup on one chain
pub trait ChainView {
    /// The block at `height` on this chain, if the view holds it
    fn block_at(&self, height: u32) -> Option<BlockView>;

    /// The block directly before `block`; `None` for genesis or a truncated view
    fn predecessor(&self, block: &BlockView) -> Option<BlockView> {
        let height = block.height.checked_sub(1)?;
        self.block_at(height)
    }

    /// The block `steps` heights below `block`
    fn ancestor(&self, block: &BlockView, steps: u32) -> Option<BlockView> {
        if steps == 0 {
            return Some(*block);
        }
        let height = block.height.checked_sub(steps)?;
        self.block_at(height)
    }
}

impl<T: ChainView + ?Sized> ChainView for &T {
    fn block_at(&self, height: u32) -> Option<BlockView> {
        (**self).block_at(height)
    }
}

/// Header fields needed to extend an [`InMemoryChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    /// Header timestamp in seconds
    pub time: i64,
    /// Compact target claimed by the header
    pub bits: CompactTarget,
}

/// A contiguous run of blocks held in memory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InMemoryChain {
    /// Height of `blocks[0]`
    base_height: u32,
    /// Chain work of the block below `base_height`
    base_work: ChainWork,
    blocks: Vec<BlockView>,
}

impl InMemoryChain {
    /// An empty chain whose first pushed block is genesis
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty view whose first pushed block sits at `base_height`.
    ///
    /// Models a pruned snapshot: blocks below `base_height` are not
    /// available, and `parent_work` is the chain work they accumulated.
    pub fn starting_at(base_height: u32, parent_work: ChainWork) -> Self {
        Self {
            base_height,
            base_work: parent_work,
            blocks: Vec::new(),
        }
    }

    /// Build a chain from genesis out of header records
    pub fn from_headers<I>(headers: I) -> Self
    where
        I: IntoIterator<Item = HeaderRecord>,
    {
        let mut chain = Self::new();
        for header in headers {
            chain.push_header(header.time, header.bits);
        }
        chain
    }

    /// Append a block, accumulating its proof onto the parent's chain work.
    ///
    /// Accumulation wraps modulo 2^256 like the work counter it models.
    pub fn push_header(&mut self, time: i64, bits: CompactTarget) -> BlockView {
        let (height, parent_work) = match self.blocks.last() {
            Some(tip) => (tip.height + 1, tip.chain_work),
            None => (self.base_height, self.base_work),
        };

        let block = BlockView {
            height,
            time,
            bits,
            chain_work: parent_work.overflowing_add(block_proof(bits)).0,
        };
        self.blocks.push(block);
        block
    }

    /// The highest block, if any
    pub fn tip(&self) -> Option<BlockView> {
        self.blocks.last().copied()
    }

    /// Like [`ChainView::block_at`], but an error for heights outside the view
    pub fn get(&self, height: u32) -> Result<BlockView> {
        self.block_at(height).ok_or_else(|| {
            Error::invariant(format!(
                "Height {} is outside the chain view ({} blocks from height {})",
                height,
                self.blocks.len(),
                self.base_height
            ))
        })
    }

    /// Number of blocks held
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks are held
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Header records of every held block, e.g. for writing a chain file
    pub fn headers(&self) -> Vec<HeaderRecord> {
        self.blocks
            .iter()
            .map(|block| HeaderRecord {
                time: block.time,
                bits: block.bits,
            })
            .collect()
    }

    /// Total work of the tip, or of the parent of an empty view
    pub fn total_work(&self) -> U256 {
        self.tip().map_or(self.base_work, |tip| tip.chain_work)
    }
}

impl ChainView for InMemoryChain {
    fn block_at(&self, height: u32) -> Option<BlockView> {
        let offset = height.checked_sub(self.base_height)?;
        self.blocks.get(offset as usize).copied()
    }
}
