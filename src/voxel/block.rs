//! Block references, descriptors and the registry that resolves them

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

/// Opaque `namespace:name` reference to a block type
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockUri {
    namespace: String,
    name: String,
}

impl BlockUri {
    /// Create a uri from its parts
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let name = name.into();
        if !is_valid_part(&namespace) || !is_valid_part(&name) {
            return Err(Error::InvalidBlockUri(format!("{}:{}", namespace, name)));
        }
        Ok(Self { namespace, name })
    }

    /// Uri in the built-in `core` namespace; `name` must be a valid part
    pub(crate) fn core(name: &str) -> Self {
        debug_assert!(is_valid_part(name));
        Self {
            namespace: "core".to_string(),
            name: name.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty() && !part.contains(':') && !part.chars().any(char::is_whitespace)
}

impl FromStr for BlockUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Err(Error::InvalidBlockUri(s.to_string())),
        }
    }
}

impl TryFrom<String> for BlockUri {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<BlockUri> for String {
    fn from(uri: BlockUri) -> Self {
        uri.to_string()
    }
}

impl fmt::Display for BlockUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Numeric block type id as stored in a volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

/// Concrete block descriptor returned by a registry
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    pub id: BlockId,
    pub uri: BlockUri,
}

/// Resolves block references to descriptors.
///
/// Implementations are queried read-only, so a registry shared between
/// threads only has to support concurrent reads.
pub trait BlockRegistry {
    /// Look up the descriptor for `uri`, failing with [`Error::UnknownBlock`]
    fn get_block(&self, uri: &BlockUri) -> Result<Block>;
}

/// In-memory registry assigning sequential ids in registration order
#[derive(Debug, Clone)]
pub struct BlockPalette {
    blocks: HashMap<BlockUri, Block>,
    next_id: u16,
}

impl BlockPalette {
    /// Create an empty palette. Id 0 is reserved for air.
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a block type, returning its descriptor.
    /// Registering the same uri twice returns the existing descriptor.
    pub fn register(&mut self, uri: BlockUri) -> Result<Block> {
        if let Some(block) = self.blocks.get(&uri) {
            return Ok(block.clone());
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::PaletteFull(self.blocks.len()))?;
        let block = Block {
            id: BlockId(id),
            uri: uri.clone(),
        };
        self.blocks.insert(uri, block.clone());
        Ok(block)
    }

    /// Palette with every block the built-in presets reference
    pub fn with_defaults() -> Self {
        let mut palette = Self::new();
        for (id, name) in (1..).zip(DEFAULT_BLOCKS) {
            let uri = BlockUri::core(name);
            palette.blocks.insert(uri.clone(), Block { id: BlockId(id), uri });
            palette.next_id = id + 1;
        }
        palette
    }

    /// Look up a block by id
    pub fn by_id(&self, id: BlockId) -> Option<&Block> {
        self.blocks.values().find(|b| b.id == id)
    }

    /// Number of registered block types
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry for BlockPalette {
    fn get_block(&self, uri: &BlockUri) -> Result<Block> {
        self.blocks
            .get(uri)
            .cloned()
            .ok_or_else(|| Error::UnknownBlock(uri.clone()))
    }
}

/// Names of the `core` blocks used by the tree presets
pub const DEFAULT_BLOCKS: [&str; 6] = [
    "oak_trunk",
    "pine_trunk",
    "birch_trunk",
    "green_leaf",
    "dark_leaf",
    "red_leaf",
];
