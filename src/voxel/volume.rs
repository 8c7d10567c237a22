//! Target volumes the generator writes into

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;
use crate::math::GridAabb;
use crate::voxel::block::{Block, BlockId};

/// Write interface to an already-allocated local voxel region
pub trait VoxelVolume {
    /// Cells this volume accepts writes for
    fn region(&self) -> GridAabb;

    /// Store `block` at `pos`. Positions outside [`region`](Self::region)
    /// must be ignored, never panic.
    fn set_block(&mut self, pos: IVec3, block: &Block);
}

impl<V: VoxelVolume + ?Sized> VoxelVolume for &mut V {
    fn region(&self) -> GridAabb {
        (**self).region()
    }

    fn set_block(&mut self, pos: IVec3, block: &Block) {
        (**self).set_block(pos, block)
    }
}

/// Dense block storage covering a fixed region
#[derive(Clone, Debug)]
pub struct DenseVolume {
    region: GridAabb,
    cells: Vec<Option<BlockId>>,
}

impl DenseVolume {
    /// Create an empty (all air) volume covering `region`
    pub fn new(region: GridAabb) -> Self {
        Self {
            region,
            cells: vec![None; region.volume()],
        }
    }

    /// Volume of `size` cells with its minimum corner at `origin`
    pub fn with_size(origin: IVec3, size: IVec3) -> Self {
        Self::new(GridAabb::from_origin_size(origin, size))
    }

    /// Block stored at `pos`, `None` for air or out-of-range positions
    pub fn get(&self, pos: IVec3) -> Option<BlockId> {
        self.region.index_of(pos).and_then(|i| self.cells[i])
    }

    /// Number of cells holding `id`
    pub fn count(&self, id: BlockId) -> usize {
        self.cells.iter().filter(|c| **c == Some(id)).count()
    }

    /// Number of non-air cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Iterate over all non-air cells
    pub fn iter_filled(&self) -> impl Iterator<Item = (IVec3, BlockId)> + '_ {
        let size = self.region.size();
        let (sx, sz) = (size.x as usize, size.z as usize);
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let id = (*cell)?;
            let local = IVec3::new(
                (i % sx) as i32,
                (i / (sx * sz)) as i32,
                ((i / sx) % sz) as i32,
            );
            Some((self.region.min + local, id))
        })
    }

    /// Reset every cell to air
    pub fn clear(&mut self) {
        self.cells.fill(None);
    }
}

impl VoxelVolume for DenseVolume {
    fn region(&self) -> GridAabb {
        self.region
    }

    fn set_block(&mut self, pos: IVec3, block: &Block) {
        if let Some(i) = self.region.index_of(pos) {
            self.cells[i] = Some(block.id);
        }
    }
}

/// A single recorded write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelWrite {
    pub pos: IVec3,
    pub block: BlockId,
}

/// Volume that records every accepted write in emission order
#[derive(Clone, Debug, Default)]
pub struct RecordingVolume {
    region: GridAabb,
    writes: Vec<VoxelWrite>,
}

impl RecordingVolume {
    pub fn new(region: GridAabb) -> Self {
        Self {
            region,
            writes: Vec::new(),
        }
    }

    /// Recorded writes in emission order
    pub fn writes(&self) -> &[VoxelWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<VoxelWrite> {
        self.writes
    }
}

impl VoxelVolume for RecordingVolume {
    fn region(&self) -> GridAabb {
        self.region
    }

    fn set_block(&mut self, pos: IVec3, block: &Block) {
        if self.region.contains(pos) {
            self.writes.push(VoxelWrite { pos, block: block.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::block::BlockUri;

    fn block(id: u16) -> Block {
        Block {
            id: BlockId(id),
            uri: BlockUri::new("test", format!("b{}", id)).unwrap(),
        }
    }

    #[test]
    fn test_dense_set_get() {
        let mut volume = DenseVolume::with_size(IVec3::new(-2, 0, -2), IVec3::new(4, 4, 4));
        let bark = block(1);
        volume.set_block(IVec3::new(-2, 3, 1), &bark);
        assert_eq!(volume.get(IVec3::new(-2, 3, 1)), Some(BlockId(1)));
        assert_eq!(volume.get(IVec3::new(0, 0, 0)), None);
        assert_eq!(volume.filled(), 1);
    }

    #[test]
    fn test_dense_ignores_out_of_range() {
        let mut volume = DenseVolume::with_size(IVec3::ZERO, IVec3::splat(2));
        volume.set_block(IVec3::new(5, 0, 0), &block(1));
        volume.set_block(IVec3::new(0, -1, 0), &block(1));
        assert_eq!(volume.filled(), 0);
    }

    #[test]
    fn test_dense_iter_filled_positions() {
        let mut volume = DenseVolume::with_size(IVec3::new(10, 20, 30), IVec3::new(3, 4, 5));
        let cells = [IVec3::new(12, 23, 34), IVec3::new(10, 20, 30), IVec3::new(11, 22, 31)];
        for cell in cells {
            volume.set_block(cell, &block(7));
        }
        let mut found: Vec<IVec3> = volume.iter_filled().map(|(p, _)| p).collect();
        found.sort_by_key(|p| (p.x, p.y, p.z));
        let mut expected = cells.to_vec();
        expected.sort_by_key(|p| (p.x, p.y, p.z));
        assert_eq!(found, expected);
        assert_eq!(volume.count(BlockId(7)), 3);
        volume.clear();
        assert_eq!(volume.filled(), 0);
    }

    #[test]
    fn test_recording_keeps_order_and_clips() {
        let mut volume = RecordingVolume::new(GridAabb::new(IVec3::ZERO, IVec3::splat(8)));
        volume.set_block(IVec3::new(1, 2, 3), &block(1));
        volume.set_block(IVec3::new(-1, 2, 3), &block(1));
        volume.set_block(IVec3::new(4, 4, 4), &block(2));
        assert_eq!(
            volume.writes(),
            &[
                VoxelWrite { pos: IVec3::new(1, 2, 3), block: BlockId(1) },
                VoxelWrite { pos: IVec3::new(4, 4, 4), block: BlockId(2) },
            ]
        );
    }
}
