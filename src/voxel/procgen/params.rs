//! Tree generation parameters and style presets

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::lsystem::{Grammar, LSystemRule, RuleSet};
use crate::voxel::block::BlockUri;

/// Trunk radius used when a configuration omits it
pub const DEFAULT_THICKNESS: f32 = 3.0;
/// Radius multiplier applied per expansion level
pub const DEFAULT_THICKNESS_DECAY: f32 = 0.7;
/// Length of one forward step in voxels
pub const DEFAULT_SEGMENT_LENGTH: f32 = 1.0;
/// Minimum leaf cluster radius in voxels
pub const DEFAULT_LEAF_RADIUS: f32 = 1.5;
/// Depth from which forward segments also grow foliage
pub const DEFAULT_FOLIAGE_DEPTH: u32 = 2;
/// Upper bound for trunk and leaf cluster radii
pub const MAX_RADIUS: f32 = 32.0;
/// Upper bound for the forward step length
pub const MAX_SEGMENT_LENGTH: f32 = 64.0;
/// Largest per-tree angular jitter (5 degrees)
pub const MAX_ANGLE_OFFSET: f32 = 5.0 * std::f32::consts::PI / 180.0;

/// Tree style presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStyle {
    #[default]
    Oak,
    Pine,
    Birch,
    /// Oak-shaped crown with red foliage
    Maple,
}

impl TreeStyle {
    pub const ALL: [TreeStyle; 4] = [TreeStyle::Oak, TreeStyle::Pine, TreeStyle::Birch, TreeStyle::Maple];

    pub fn name(self) -> &'static str {
        match self {
            TreeStyle::Oak => "oak",
            TreeStyle::Pine => "pine",
            TreeStyle::Birch => "birch",
            TreeStyle::Maple => "maple",
        }
    }
}

impl fmt::Display for TreeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TreeStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TreeStyle::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParams(format!("unknown tree style: {}", s)))
    }
}

/// Everything one generation call needs besides the target, RNG and anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Initial symbol sequence
    pub axiom: String,
    /// Production rules
    #[serde(default)]
    pub rules: RuleSet,
    /// Maximum expansion depth (0 = interpret the axiom only)
    pub max_depth: u32,
    /// Base turn angle in radians
    pub angle: f32,
    /// Branch radius at depth 0, in voxels
    #[serde(default = "default_thickness")]
    pub thickness: f32,
    /// Radius multiplier per depth level (0.0 - 1.0]
    #[serde(default = "default_thickness_decay")]
    pub thickness_decay: f32,
    /// Distance covered by one forward symbol, in voxels
    #[serde(default = "default_segment_length")]
    pub segment_length: f32,
    /// Minimum leaf cluster radius
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: f32,
    /// Segments drawn at this depth or deeper get foliage; `None` leaves only explicit `L`
    #[serde(default = "default_foliage_depth")]
    pub foliage_depth: Option<u32>,
    /// Bound of the per-tree angular jitter, radians
    #[serde(default = "default_max_angle_offset")]
    pub max_angle_offset: f32,
    /// Block used for trunk and branches
    pub bark: BlockUri,
    /// Block used for foliage
    pub leaf: BlockUri,
}

fn default_thickness() -> f32 {
    DEFAULT_THICKNESS
}

fn default_thickness_decay() -> f32 {
    DEFAULT_THICKNESS_DECAY
}

fn default_segment_length() -> f32 {
    DEFAULT_SEGMENT_LENGTH
}

fn default_leaf_radius() -> f32 {
    DEFAULT_LEAF_RADIUS
}

fn default_foliage_depth() -> Option<u32> {
    Some(DEFAULT_FOLIAGE_DEPTH)
}

fn default_max_angle_offset() -> f32 {
    MAX_ANGLE_OFFSET
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::oak()
    }
}

impl TreeParams {
    /// Parameters for an arbitrary grammar, with default thickness and
    /// oak bark / green leaf blocks
    pub fn new(axiom: impl Into<String>, rules: RuleSet, max_depth: u32, angle: f32) -> Self {
        Self {
            axiom: axiom.into(),
            rules,
            max_depth,
            angle,
            thickness: DEFAULT_THICKNESS,
            thickness_decay: DEFAULT_THICKNESS_DECAY,
            segment_length: DEFAULT_SEGMENT_LENGTH,
            leaf_radius: DEFAULT_LEAF_RADIUS,
            foliage_depth: Some(DEFAULT_FOLIAGE_DEPTH),
            max_angle_offset: MAX_ANGLE_OFFSET,
            bark: BlockUri::core("oak_trunk"),
            leaf: BlockUri::core("green_leaf"),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_bark(mut self, bark: BlockUri) -> Self {
        self.bark = bark;
        self
    }

    pub fn with_leaf(mut self, leaf: BlockUri) -> Self {
        self.leaf = leaf;
        self
    }

    pub fn with_foliage_depth(mut self, depth: Option<u32>) -> Self {
        self.foliage_depth = depth;
        self
    }

    /// Disable the per-tree angular jitter
    pub fn without_jitter(mut self) -> Self {
        self.max_angle_offset = 0.0;
        self
    }

    /// Create oak preset: short trunk, wide crown of three-way forks
    pub fn oak() -> Self {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("[&FFBFA]////[&BFFFA]////[&FBFFA]"))
            .with('B', LSystemRule::with_probability("[&FFFA]////[&FFFA]////[&FFFA]", 0.8));
        Self::new("FFFFFFA", rules, 4, 30f32.to_radians())
            .with_thickness(1.5)
    }

    /// Create pine preset: tall trunk with stacked whorls
    pub fn pine() -> Self {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("[&FFFFFA]////[&FFFFFA]////[&FFFFFA]"));
        Self::new("FFFFAFFFFFFFAFFFFA", rules, 4, 35f32.to_radians())
            .with_bark(BlockUri::core("pine_trunk"))
            .with_leaf(BlockUri::core("dark_leaf"))
    }

    /// Create birch preset: slender trunk with many small side branches
    pub fn birch() -> Self {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("[&FFFAFFF]////[&FFAFFFA]////[&FFFAFFFAFF]"))
            .with('B', LSystemRule::with_probability("[&FAF]////[&FAF]////[&FAF]", 0.8));
        Self::new("FFFFAFFFFBFFFFAFFFFBFFFFAFFFFBFF", rules, 4, 35f32.to_radians())
            .with_bark(BlockUri::core("birch_trunk"))
            .with_leaf(BlockUri::core("dark_leaf"))
    }

    /// Create maple preset: oak grammar with a wider angle and red leaves
    pub fn maple() -> Self {
        let mut params = Self::oak();
        params.angle = 40f32.to_radians();
        params.leaf = BlockUri::core("red_leaf");
        params
    }

    /// Create params from style preset
    pub fn from_style(style: TreeStyle) -> Self {
        match style {
            TreeStyle::Oak => Self::oak(),
            TreeStyle::Pine => Self::pine(),
            TreeStyle::Birch => Self::birch(),
            TreeStyle::Maple => Self::maple(),
        }
    }

    /// Grammar described by the axiom and rules
    pub fn grammar(&self) -> Grammar {
        Grammar::new(self.axiom.clone(), self.rules.clone())
    }

    /// Radius of a branch drawn at `depth`
    pub fn thickness_at(&self, depth: u32) -> f32 {
        self.thickness * self.thickness_decay.powi(depth as i32)
    }

    /// Radius of a leaf cluster on a branch of the given radius
    pub fn leaf_radius_for(&self, thickness: f32) -> f32 {
        self.leaf_radius.max(thickness + 1.0)
    }

    /// Reject values the generator cannot work with
    pub fn validate(&self) -> Result<()> {
        fn within(name: &str, value: f32, max: f32) -> Result<()> {
            if value > 0.0 && value <= max {
                Ok(())
            } else {
                Err(Error::InvalidParams(format!("{} must be in (0, {}], got {}", name, max, value)))
            }
        }

        within("thickness", self.thickness, MAX_RADIUS)?;
        within("segment_length", self.segment_length, MAX_SEGMENT_LENGTH)?;
        if !(self.thickness_decay > 0.0 && self.thickness_decay <= 1.0) {
            return Err(Error::InvalidParams(format!(
                "thickness_decay must be in (0, 1], got {}",
                self.thickness_decay
            )));
        }
        if !(0.0..=MAX_RADIUS).contains(&self.leaf_radius) {
            return Err(Error::InvalidParams(format!(
                "leaf_radius must be in [0, {}], got {}",
                MAX_RADIUS, self.leaf_radius
            )));
        }
        if !self.angle.is_finite() {
            return Err(Error::InvalidParams("angle must be finite".to_string()));
        }
        if !(self.max_angle_offset.is_finite() && self.max_angle_offset >= 0.0) {
            return Err(Error::InvalidParams(format!(
                "max_angle_offset must be non-negative, got {}",
                self.max_angle_offset
            )));
        }
        self.rules.validate()
    }

    /// Parse parameters from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save parameters as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }
}
