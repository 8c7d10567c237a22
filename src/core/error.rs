//! Error types for the tree generator

use thiserror::Error;

use crate::voxel::block::BlockUri;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockUri),

    #[error("Invalid block uri: {0:?} (expected `namespace:name`)")]
    InvalidBlockUri(String),

    #[error("Block palette is full ({0} blocks registered)")]
    PaletteFull(usize),

    #[error("Invalid tree parameters: {0}")]
    InvalidParams(String),

    #[error("Generation {generation} exceeds the expansion limit of {limit} symbols")]
    ExpansionLimit { generation: u32, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
