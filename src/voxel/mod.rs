//! Voxel data structures and operations

pub mod block;
pub mod volume;
pub mod procgen;

pub use block::{Block, BlockId, BlockPalette, BlockRegistry, BlockUri};
pub use volume::{DenseVolume, RecordingVolume, VoxelVolume, VoxelWrite};
pub use procgen::{GenerationReport, TreeGenerator, TreeParams, TreeStyle};
