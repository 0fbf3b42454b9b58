//! The block registry owning every particle of one simulation.

use std::sync::Arc;

use plume_core::{AttributesInfo, BlockId};

use crate::block::ParticlesBlock;
use crate::error::StorageError;

/// Outcome of [`ParticlesContainer::compact`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactionStats {
    /// Rows moved between blocks.
    pub moved_rows: usize,
    /// Blocks released because they ended up empty.
    pub released_blocks: usize,
}

/// Owns a growable set of [`ParticlesBlock`]s sharing one schema and one
/// capacity.
///
/// Blocks are allocated on demand by [`new_block`](Self::new_block) and
/// released once empty. Callers refer to blocks by [`BlockId`]; the
/// container keeps ownership.
pub struct ParticlesContainer {
    info: Arc<AttributesInfo>,
    block_capacity: usize,
    blocks: Vec<ParticlesBlock>,
    next_id: u64,
}

impl ParticlesContainer {
    /// Create an empty container.
    ///
    /// Returns `Err(StorageError::ZeroCapacity)` if `block_capacity` is 0.
    pub fn new(info: Arc<AttributesInfo>, block_capacity: usize) -> Result<Self, StorageError> {
        if block_capacity == 0 {
            return Err(StorageError::ZeroCapacity);
        }
        Ok(Self {
            info,
            block_capacity,
            blocks: Vec::new(),
            next_id: 0,
        })
    }

    /// The schema shared by every block.
    pub fn info(&self) -> &Arc<AttributesInfo> {
        &self.info
    }

    /// Row capacity of every block.
    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    /// Allocate an empty block and register it as active.
    pub fn new_block(&mut self) -> &mut ParticlesBlock {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push(ParticlesBlock::new(
            id,
            Arc::clone(&self.info),
            self.block_capacity,
        ));
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// All registered blocks. The iterator is cheap to clone, so it can
    /// be restarted.
    pub fn active_blocks(&self) -> std::slice::Iter<'_, ParticlesBlock> {
        self.blocks.iter()
    }

    /// All registered blocks as one mutable slice, for disjoint
    /// per-block work.
    pub fn blocks_mut(&mut self) -> &mut [ParticlesBlock] {
        &mut self.blocks
    }

    /// Look up a block.
    pub fn block(&self, id: BlockId) -> Option<&ParticlesBlock> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    /// Look up a block mutably.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut ParticlesBlock> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    /// Deallocate an empty block.
    ///
    /// # Errors
    ///
    /// - [`StorageError::UnknownBlock`] if `id` is not registered.
    /// - [`StorageError::BlockNotEmpty`] if the block has live rows.
    pub fn release_block(&mut self, id: BlockId) -> Result<(), StorageError> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id() == id)
            .ok_or(StorageError::UnknownBlock { block: id })?;
        let active = self.blocks[index].active_amount();
        if active > 0 {
            return Err(StorageError::BlockNotEmpty { block: id, active });
        }
        self.blocks.swap_remove(index);
        Ok(())
    }

    /// Pack live rows into as few blocks as possible, then release every
    /// block left empty.
    pub fn compact(&mut self) -> CompactionStats {
        let moved_rows = ParticlesBlock::compress(&mut self.blocks);
        let before = self.blocks.len();
        self.blocks.retain(|b| !b.is_empty());
        CompactionStats {
            moved_rows,
            released_blocks: before - self.blocks.len(),
        }
    }

    /// Total live particles across all blocks.
    pub fn particle_amount(&self) -> usize {
        self.blocks.iter().map(|b| b.active_amount()).sum()
    }

    /// Number of registered blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Memory used by all block columns in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.memory_bytes()).sum()
    }
}
