//! Grid math utilities

pub mod aabb;

pub use aabb::GridAabb;
