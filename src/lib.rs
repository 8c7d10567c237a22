//! Sylva - L-system voxel tree generator
//!
//! Grammar rewriting lives in [`lsystem`], the turtle that draws the
//! symbols into a voxel volume in [`voxel::procgen`].

pub mod core;
pub mod math;
pub mod lsystem;
pub mod voxel;
