//! Core type aliases and re-exports

pub use glam::{IVec3, Quat, Vec3};

/// Standard Result type for the generator
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
