//! Procedural generation of voxel trees
//!
//! [`TreeParams`] describes a grammar and how to draw it, [`TreeGenerator`]
//! grows one tree per call into any [`VoxelVolume`](crate::voxel::VoxelVolume).

pub mod params;
pub mod tree;
pub mod turtle;

pub use params::{TreeParams, TreeStyle};
pub use tree::{GenerationReport, TreeGenerator};
pub use turtle::{TurtleCommand, TurtleState};
