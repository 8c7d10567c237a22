//! Procedural tree generation from L-system grammars
//!
//! Generates voxel trees by:
//! - Expanding the grammar lazily while the turtle walks it
//! - Sweeping bark balls along forward segments, thinning with depth
//! - Wrapping outer twigs in leaf clusters
//! - Perturbing every rotation by one per-tree angular jitter

use serde::Serialize;

use crate::core::random::RandomSource;
use crate::core::types::{IVec3, Result};
use crate::lsystem::Grammar;
use crate::math::GridAabb;
use crate::voxel::block::BlockRegistry;
use crate::voxel::procgen::params::{TreeParams, TreeStyle};
use crate::voxel::procgen::turtle::Turtle;
use crate::voxel::volume::VoxelVolume;

/// Statistics of a single [`TreeGenerator::generate`] call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// Voxels written inside the volume
    pub writes: u32,
    /// Writes skipped because they fell outside the volume
    pub clipped: u32,
    pub bark_writes: u32,
    pub leaf_writes: u32,
    /// Forward segments drawn
    pub segments: u32,
    /// Productions interpreted, indexed by the depth they ran at
    pub expansions: Vec<u32>,
    pub pushes: u32,
    pub pops: u32,
    /// `]` with nothing to pop in its frame
    pub stray_pops: u32,
    /// Pushes still open when their frame ended
    pub unclosed_branches: u32,
    /// Terminals with no drawing meaning
    pub discarded_symbols: u32,
    pub max_depth_reached: u32,
    /// Jitter (radians) added to every rotation
    pub angle_offset: f32,
    /// Bounds of the written cells, in volume coordinates
    pub bounds: GridAabb,
}

impl GenerationReport {
    pub(crate) fn new(angle_offset: f32) -> Self {
        Self {
            writes: 0,
            clipped: 0,
            bark_writes: 0,
            leaf_writes: 0,
            segments: 0,
            expansions: vec![0],
            pushes: 0,
            pops: 0,
            stray_pops: 0,
            unclosed_branches: 0,
            discarded_symbols: 0,
            max_depth_reached: 0,
            angle_offset,
            bounds: GridAabb::default(),
        }
    }

    pub(crate) fn record_expansion(&mut self, depth: u32) {
        let index = depth as usize;
        if self.expansions.len() <= index {
            self.expansions.resize(index + 1, 0);
        }
        self.expansions[index] += 1;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    /// Total productions interpreted
    pub fn total_expansions(&self) -> u32 {
        self.expansions.iter().sum()
    }
}

/// L-system tree generator.
///
/// Holds only immutable configuration; all per-call state lives in the
/// [`generate`](Self::generate) call, so one generator can serve many
/// threads at once.
#[derive(Debug, Clone)]
pub struct TreeGenerator {
    params: TreeParams,
    grammar: Grammar,
}

impl TreeGenerator {
    /// Create a generator, rejecting invalid parameters
    pub fn new(params: TreeParams) -> Result<Self> {
        params.validate()?;
        let grammar = params.grammar();
        Ok(Self { params, grammar })
    }

    /// Create generator from style preset
    pub fn from_style(style: TreeStyle) -> Self {
        let params = TreeParams::from_style(style);
        let grammar = params.grammar();
        Self { params, grammar }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Grow one tree rooted at `anchor` into `volume`.
    ///
    /// Bark and leaf blocks are resolved before anything is drawn, so a
    /// registry miss leaves the volume untouched. Cells outside the
    /// volume's region are skipped and counted in the report.
    pub fn generate(
        &self,
        volume: &mut dyn VoxelVolume,
        blocks: &dyn BlockRegistry,
        rng: &mut dyn RandomSource,
        anchor: IVec3,
    ) -> Result<GenerationReport> {
        let bark = blocks.get_block(&self.params.bark)?;
        let leaf = blocks.get_block(&self.params.leaf)?;

        let max_offset = self.params.max_angle_offset;
        let angle_offset = rng.range(-max_offset, max_offset);

        let report = Turtle::new(
            &self.grammar,
            &self.params,
            volume,
            rng,
            &bark,
            &leaf,
            anchor,
            angle_offset,
        )
        .run();

        log::debug!(
            "tree at {:?}: {} writes ({} bark, {} leaf), {} clipped, {} expansions, depth {}/{}",
            anchor,
            report.writes,
            report.bark_writes,
            report.leaf_writes,
            report.clipped,
            report.total_expansions(),
            report.max_depth_reached,
            self.params.max_depth,
        );
        if report.stray_pops > 0 || report.unclosed_branches > 0 {
            log::debug!(
                "tree at {:?}: {} stray pops, {} unclosed branches",
                anchor,
                report.stray_pops,
                report.unclosed_branches,
            );
        }

        Ok(report)
    }
}
