//! Integer axis-aligned bounding box on the voxel grid

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;

/// Axis-aligned box of voxel cells, `min` inclusive and `max` exclusive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridAabb {
    pub min: IVec3,
    pub max: IVec3,
}

impl GridAabb {
    /// Create box from min (inclusive) and max (exclusive) corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Create box from its minimum corner and size in cells
    pub fn from_origin_size(origin: IVec3, size: IVec3) -> Self {
        Self {
            min: origin,
            max: origin + size.max(IVec3::ZERO),
        }
    }

    /// Box containing exactly one cell
    pub fn single(cell: IVec3) -> Self {
        Self::new(cell, cell + IVec3::ONE)
    }

    /// Get size in cells per axis (zero for inverted boxes)
    pub fn size(&self) -> IVec3 {
        (self.max - self.min).max(IVec3::ZERO)
    }

    /// Number of cells in the box
    pub fn volume(&self) -> usize {
        let size = self.size();
        size.x as usize * size.y as usize * size.z as usize
    }

    /// Check whether the box contains no cells
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Check if a cell lies inside the box
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= self.min.x && p.x < self.max.x &&
        p.y >= self.min.y && p.y < self.max.y &&
        p.z >= self.min.z && p.z < self.max.z
    }

    /// Check if two boxes share at least one cell
    pub fn intersects(&self, other: &GridAabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y &&
        self.min.z < other.max.z && self.max.z > other.min.z
    }

    /// Grow the box so it includes `cell`
    pub fn expand(&mut self, cell: IVec3) {
        if self.is_empty() {
            *self = Self::single(cell);
            return;
        }
        self.min = self.min.min(cell);
        self.max = self.max.max(cell + IVec3::ONE);
    }

    /// Linear index of a contained cell (x fastest, then z, then y)
    pub fn index_of(&self, p: IVec3) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        let size = self.size();
        let local = p - self.min;
        Some(
            local.x as usize
                + local.z as usize * size.x as usize
                + local.y as usize * size.x as usize * size.z as usize,
        )
    }
}
