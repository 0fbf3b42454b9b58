//! Fixed-capacity particle blocks and block compaction.

use std::ops::Range;
use std::sync::Arc;

use glam::Vec3;
use plume_core::{AttributesInfo, BlockId, ByteAttrId, Float3AttrId, FloatAttrId};

use crate::arrays::AttributeArrays;

/// A fixed-capacity storage unit holding one column per schema attribute.
///
/// Rows `[0, active_amount)` are live particles; rows
/// `[active_amount, capacity)` are free slots. Row order within the
/// active range carries no meaning: death removal and compaction
/// reorder rows freely, but always move whole rows across every column.
pub struct ParticlesBlock {
    id: BlockId,
    info: Arc<AttributesInfo>,
    capacity: usize,
    active_amount: usize,
    bytes: Vec<Vec<u8>>,
    floats: Vec<Vec<f32>>,
    float3s: Vec<Vec<Vec3>>,
}

impl ParticlesBlock {
    /// Create an empty, zero-initialised block.
    pub fn new(id: BlockId, info: Arc<AttributesInfo>, capacity: usize) -> Self {
        let bytes = info.byte_ids().map(|_| vec![0; capacity]).collect();
        let floats = info.float_ids().map(|_| vec![0.0; capacity]).collect();
        let float3s = info.float3_ids().map(|_| vec![Vec3::ZERO; capacity]).collect();
        Self {
            id,
            info,
            capacity,
            active_amount: 0,
            bytes,
            floats,
            float3s,
        }
    }

    /// This block's ID within its container.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The schema shared by this block's columns.
    pub fn info(&self) -> &Arc<AttributesInfo> {
        &self.info
    }

    /// Maximum number of rows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live rows.
    pub fn active_amount(&self) -> usize {
        self.active_amount
    }

    /// Set the number of live rows.
    ///
    /// # Panics
    ///
    /// Panics if `amount` exceeds the capacity.
    pub fn set_active_amount(&mut self, amount: usize) {
        assert!(
            amount <= self.capacity,
            "active amount {amount} exceeds capacity {}",
            self.capacity
        );
        self.active_amount = amount;
    }

    /// Number of free rows.
    pub fn unused_amount(&self) -> usize {
        self.capacity - self.active_amount
    }

    /// Whether the block has no live rows.
    pub fn is_empty(&self) -> bool {
        self.active_amount == 0
    }

    /// Whether every row is live.
    pub fn is_full(&self) -> bool {
        self.active_amount == self.capacity
    }

    /// View over the live rows.
    pub fn slice_active(&mut self) -> AttributeArrays<'_> {
        self.slice(0..self.active_amount)
    }

    /// View over every row, live or free.
    pub fn slice_all(&mut self) -> AttributeArrays<'_> {
        self.slice(0..self.capacity)
    }

    /// View over an arbitrary row range.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the capacity.
    pub fn slice(&mut self, range: Range<usize>) -> AttributeArrays<'_> {
        assert!(range.end <= self.capacity, "slice {range:?} out of bounds");
        let len = range.len();
        let Self {
            info,
            bytes,
            floats,
            float3s,
            ..
        } = self;
        AttributeArrays::new(
            &**info,
            len,
            bytes.iter_mut().map(|c| &mut c[range.clone()]).collect(),
            floats.iter_mut().map(|c| &mut c[range.clone()]).collect(),
            float3s.iter_mut().map(|c| &mut c[range.clone()]).collect(),
        )
    }

    /// Live rows of a byte column.
    pub fn active_byte(&self, id: ByteAttrId) -> &[u8] {
        &self.bytes[id.index()][..self.active_amount]
    }

    /// Live rows of a float column.
    pub fn active_float(&self, id: FloatAttrId) -> &[f32] {
        &self.floats[id.index()][..self.active_amount]
    }

    /// Live rows of a float3 column.
    pub fn active_float3(&self, id: Float3AttrId) -> &[Vec3] {
        &self.float3s[id.index()][..self.active_amount]
    }

    /// Copy every attribute of row `src` onto row `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either row is outside the capacity.
    pub fn move_row(&mut self, src: usize, dst: usize) {
        assert!(
            src < self.capacity && dst < self.capacity,
            "move_row({src}, {dst}) outside capacity {}",
            self.capacity
        );
        for column in &mut self.bytes {
            column[dst] = column[src];
        }
        for column in &mut self.floats {
            column[dst] = column[src];
        }
        for column in &mut self.float3s {
            column[dst] = column[src];
        }
    }

    /// Copy every attribute of row `src` onto row `dst` of another block
    /// with the same schema.
    pub fn copy_row_to(&self, src: usize, other: &mut ParticlesBlock, dst: usize) {
        debug_assert!(Arc::ptr_eq(&self.info, &other.info) || self.info == other.info);
        for (from, to) in self.bytes.iter().zip(&mut other.bytes) {
            to[dst] = from[src];
        }
        for (from, to) in self.floats.iter().zip(&mut other.floats) {
            to[dst] = from[src];
        }
        for (from, to) in self.float3s.iter().zip(&mut other.float3s) {
            to[dst] = from[src];
        }
    }

    /// Remove every live row whose byte attribute `flag` equals `1`.
    ///
    /// A flagged row is overwritten by the current last live row and the
    /// active amount shrinks by one; the same slot is then examined again.
    /// Returns the number of removed rows.
    pub fn remove_flagged(&mut self, flag: ByteAttrId) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.active_amount {
            if self.bytes[flag.index()][index] == 1 {
                self.move_row(self.active_amount - 1, index);
                self.active_amount -= 1;
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Pack live rows so that at most one block stays partially filled.
    ///
    /// Blocks are ranked by active amount; rows are taken from the tail of
    /// the emptiest non-empty block and written into the free slots of the
    /// fullest non-full block until the two meet. A set that is already
    /// packed is left untouched. Returns the number of moved rows.
    pub fn compress(blocks: &mut [ParticlesBlock]) -> usize {
        let mut order: Vec<usize> = (0..blocks.len()).collect();
        order.sort_by(|&a, &b| blocks[b].active_amount.cmp(&blocks[a].active_amount));

        let mut moved = 0;
        let mut fill = 0;
        let mut take = order.len();
        loop {
            while fill < order.len() && blocks[order[fill]].is_full() {
                fill += 1;
            }
            while take > 0 && blocks[order[take - 1]].is_empty() {
                take -= 1;
            }
            if take == 0 || fill + 1 >= take {
                break;
            }

            let (dst, src) = pair_mut(blocks, order[fill], order[take - 1]);
            let amount = dst.unused_amount().min(src.active_amount);
            for k in 0..amount {
                src.copy_row_to(src.active_amount - 1 - k, dst, dst.active_amount + k);
            }
            dst.active_amount += amount;
            src.active_amount -= amount;
            moved += amount;
        }
        moved
    }

    /// Memory used by this block's columns in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.capacity * self.info.bytes_per_particle()
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (lo, hi) = items.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = items.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_core::{names, AttributeSet};
    use proptest::prelude::*;

    fn info() -> Arc<AttributesInfo> {
        Arc::new(
            AttributesInfo::new(
                [names::KILL_STATE].into_iter().collect(),
                [names::BIRTH_TIME].into_iter().collect(),
                [names::POSITION].into_iter().collect::<AttributeSet>(),
            )
            .unwrap(),
        )
    }

    /// Block whose row `i` has birth time `tag + i` and position `(tag + i, 0, 0)`.
    fn tagged_block(id: u64, capacity: usize, active: usize, tag: f32) -> ParticlesBlock {
        let mut block = ParticlesBlock::new(BlockId(id), info(), capacity);
        block.set_active_amount(active);
        let birth = block.info().float_id(names::BIRTH_TIME).unwrap();
        let pos = block.info().float3_id(names::POSITION).unwrap();
        let mut view = block.slice_active();
        for i in 0..active {
            view.float_mut(birth)[i] = tag + i as f32;
            view.float3_mut(pos)[i] = Vec3::new(tag + i as f32, 0.0, 0.0);
        }
        drop(view);
        block
    }

    /// Every live row must still have matching birth time and position.x.
    fn assert_coherent(block: &ParticlesBlock) {
        let birth = block.info().float_id(names::BIRTH_TIME).unwrap();
        let pos = block.info().float3_id(names::POSITION).unwrap();
        for (b, p) in block.active_float(birth).iter().zip(block.active_float3(pos)) {
            assert_eq!(*b, p.x);
        }
    }

    #[test]
    fn new_block_is_empty_and_zeroed() {
        let mut block = ParticlesBlock::new(BlockId(3), info(), 16);
        assert!(block.is_empty());
        assert_eq!(block.unused_amount(), 16);
        let view = block.slice_all();
        assert!(view.byte_by_name(names::KILL_STATE).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn move_row_copies_every_column() {
        let mut block = tagged_block(0, 4, 4, 10.0);
        block.move_row(3, 0);
        assert_coherent(&block);
        let birth = block.info().float_id(names::BIRTH_TIME).unwrap();
        assert_eq!(block.active_float(birth)[0], 13.0);
    }

    #[test]
    #[should_panic]
    fn move_row_outside_capacity_panics() {
        let mut block = tagged_block(0, 4, 4, 0.0);
        block.move_row(4, 0);
    }

    #[test]
    fn remove_flagged_moves_last_row_into_slot() {
        let mut block = tagged_block(0, 8, 5, 0.0);
        let kill = block.info().byte_id(names::KILL_STATE).unwrap();
        block.slice_active().byte_mut(kill)[1] = 1;

        assert_eq!(block.remove_flagged(kill), 1);
        assert_eq!(block.active_amount(), 4);
        let birth = block.info().float_id(names::BIRTH_TIME).unwrap();
        // Former last row (tag 4) now sits at row 1.
        assert_eq!(block.active_float(birth)[1], 4.0);
        assert_coherent(&block);
    }

    #[test]
    fn remove_flagged_rechecks_swapped_in_row() {
        let mut block = tagged_block(0, 8, 4, 0.0);
        let kill = block.info().byte_id(names::KILL_STATE).unwrap();
        {
            let mut view = block.slice_active();
            let flags = view.byte_mut(kill);
            flags[0] = 1;
            flags[3] = 1;
        }
        assert_eq!(block.remove_flagged(kill), 2);
        let birth = block.info().float_id(names::BIRTH_TIME).unwrap();
        let mut survivors = block.active_float(birth).to_vec();
        survivors.sort_by(f32::total_cmp);
        assert_eq!(survivors, vec![1.0, 2.0]);
    }

    #[test]
    fn compress_leaves_one_partial_block() {
        let mut blocks = vec![
            tagged_block(0, 10, 3, 0.0),
            tagged_block(1, 10, 7, 100.0),
            tagged_block(2, 10, 4, 200.0),
        ];
        let moved = ParticlesBlock::compress(&mut blocks);
        assert_eq!(moved, 3);
        let mut amounts: Vec<usize> = blocks.iter().map(|b| b.active_amount()).collect();
        amounts.sort();
        assert_eq!(amounts, vec![0, 4, 10]);
        blocks.iter().for_each(assert_coherent);
    }

    #[test]
    fn compress_is_idempotent() {
        let mut blocks = vec![
            tagged_block(0, 10, 10, 0.0),
            tagged_block(1, 10, 6, 100.0),
        ];
        assert_eq!(ParticlesBlock::compress(&mut blocks), 0);
        assert_eq!(blocks[0].active_amount(), 10);
        assert_eq!(blocks[1].active_amount(), 6);
    }

    proptest! {
        #[test]
        fn compress_preserves_particles(actives in prop::collection::vec(0usize..=12, 0..8)) {
            let mut blocks: Vec<ParticlesBlock> = actives
                .iter()
                .enumerate()
                .map(|(i, &a)| tagged_block(i as u64, 12, a, 1000.0 * i as f32))
                .collect();
            let birth = blocks.first().map(|b| b.info().float_id(names::BIRTH_TIME).unwrap());

            let collect = |blocks: &[ParticlesBlock]| {
                let mut all: Vec<f32> = blocks
                    .iter()
                    .flat_map(|b| b.active_float(birth.unwrap()).to_vec())
                    .collect();
                all.sort_by(f32::total_cmp);
                all
            };
            let before = if birth.is_some() { collect(&blocks) } else { Vec::new() };

            ParticlesBlock::compress(&mut blocks);

            let partial = blocks.iter().filter(|b| !b.is_empty() && !b.is_full()).count();
            prop_assert!(partial <= 1);
            if birth.is_some() {
                prop_assert_eq!(collect(&blocks), before);
            }
            for block in &blocks {
                assert_coherent(block);
            }
            // A second pass has nothing left to do.
            prop_assert_eq!(ParticlesBlock::compress(&mut blocks), 0);
        }
    }
}
