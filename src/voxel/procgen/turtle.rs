//! Turtle interpretation of L-system symbols into voxel writes
//!
//! | Symbol      | Action                                             |
//! |-------------|----------------------------------------------------|
//! | `F`, `G`    | draw a bark segment and move forward               |
//! | `+` / `-`   | yaw about the local Z axis                         |
//! | `&` / `^`   | pitch about the local Y axis                       |
//! | `*` / `/`   | roll about the local X (forward) axis              |
//! | `[` / `]`   | push / pop the turtle state                        |
//! | `L`         | leaf cluster at the current position               |
//!
//! Drawing symbols always act directly. Any other symbol is offered to the
//! grammar while the turtle is above the depth cap, and a firing rule is
//! interpreted one level deeper in its place. Symbols with no rule, or
//! reached at the cap, are dropped.

use std::f32::consts::FRAC_PI_2;
use std::str::Chars;

use crate::core::random::RandomSource;
use crate::core::types::{IVec3, Quat, Vec3};
use crate::lsystem::{Grammar, LSystemRule};
use crate::math::GridAabb;
use crate::voxel::block::Block;
use crate::voxel::procgen::params::TreeParams;
use crate::voxel::procgen::tree::GenerationReport;
use crate::voxel::volume::VoxelVolume;

/// Position and heading of the drawing cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    /// Offset from the anchor, in voxels
    pub position: Vec3,
    /// Unit quaternion; local +X is the heading
    pub rotation: Quat,
    /// Expansion depth of the symbols being interpreted
    pub depth: u32,
    /// Current branch radius
    pub thickness: f32,
}

impl TurtleState {
    /// Turtle at the anchor, heading straight up, at depth 0
    pub fn upright(thickness: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_z(FRAC_PI_2),
            depth: 0,
            thickness,
        }
    }

    /// World-space heading
    pub fn heading(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

/// Drawing command a terminal symbol maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurtleCommand {
    Forward,
    /// Rotate about a local axis; `sign` selects the direction of the base angle
    Turn { axis: Vec3, sign: f32 },
    Push,
    Pop,
    Leaf,
}

impl TurtleCommand {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        let command = match symbol {
            'F' | 'G' => Self::Forward,
            '+' => Self::Turn { axis: Vec3::Z, sign: 1.0 },
            '-' => Self::Turn { axis: Vec3::Z, sign: -1.0 },
            '&' => Self::Turn { axis: Vec3::Y, sign: 1.0 },
            '^' => Self::Turn { axis: Vec3::Y, sign: -1.0 },
            '*' => Self::Turn { axis: Vec3::X, sign: 1.0 },
            '/' => Self::Turn { axis: Vec3::X, sign: -1.0 },
            '[' => Self::Push,
            ']' => Self::Pop,
            'L' => Self::Leaf,
            _ => return None,
        };
        Some(command)
    }
}

#[derive(Clone, Copy)]
enum Material {
    Bark,
    Leaf,
}

/// Symbols of one production being interpreted
struct Frame<'a> {
    symbols: Chars<'a>,
    /// Branch stack length when the frame opened
    floor: usize,
    /// Depth and thickness to restore once the frame is exhausted
    resume: (u32, f32),
}

/// One generation pass: interprets the grammar against a target volume
pub(crate) struct Turtle<'a> {
    grammar: &'a Grammar,
    params: &'a TreeParams,
    volume: &'a mut dyn VoxelVolume,
    rng: &'a mut dyn RandomSource,
    bark: &'a Block,
    leaf: &'a Block,
    anchor: IVec3,
    region: GridAabb,
    /// Jitter added to every rotation of this tree
    angle_offset: f32,
    /// Saved states; each expansion frame only sees entries above its floor
    stack: Vec<TurtleState>,
    report: GenerationReport,
}

impl<'a> Turtle<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        grammar: &'a Grammar,
        params: &'a TreeParams,
        volume: &'a mut dyn VoxelVolume,
        rng: &'a mut dyn RandomSource,
        bark: &'a Block,
        leaf: &'a Block,
        anchor: IVec3,
        angle_offset: f32,
    ) -> Self {
        let region = volume.region();
        Self {
            grammar,
            params,
            volume,
            rng,
            bark,
            leaf,
            anchor,
            region,
            angle_offset,
            stack: Vec::new(),
            report: GenerationReport::new(angle_offset),
        }
    }

    /// Interpret the axiom from an upright turtle and return the statistics.
    ///
    /// Expansion frames live on the heap, so the depth cap bounds memory
    /// rather than native stack usage.
    pub(crate) fn run(mut self) -> GenerationReport {
        let mut state = TurtleState::upright(self.params.thickness_at(0));
        let mut frames = vec![Frame {
            symbols: self.grammar.symbols(),
            floor: 0,
            resume: (state.depth, state.thickness),
        }];

        while let Some(frame) = frames.last_mut() {
            let floor = frame.floor;
            let Some(symbol) = frame.symbols.next() else {
                self.close_frame(floor, state.depth);
                if let Some(done) = frames.pop() {
                    (state.depth, state.thickness) = done.resume;
                }
                continue;
            };

            if let Some(command) = TurtleCommand::from_symbol(symbol) {
                self.execute(command, &mut state, floor);
            } else if let Some(rule) = self.production(symbol, state.depth) {
                frames.push(self.open_frame(rule, &mut state));
            } else {
                self.report.discarded_symbols += 1;
            }
        }

        debug_assert!(self.stack.is_empty());
        self.report
    }

    /// Rule for a non-drawing symbol, if the depth cap still allows one
    fn production(&mut self, symbol: char, depth: u32) -> Option<&'a LSystemRule> {
        if depth >= self.params.max_depth {
            return None;
        }
        let grammar = self.grammar;
        grammar.production(symbol, self.params.max_depth - depth, &mut *self.rng)
    }

    fn open_frame(&mut self, rule: &'a LSystemRule, state: &mut TurtleState) -> Frame<'a> {
        let frame = Frame {
            symbols: rule.symbols(),
            floor: self.stack.len(),
            resume: (state.depth, state.thickness),
        };
        state.depth += 1;
        state.thickness = self.params.thickness_at(state.depth);
        self.report.record_expansion(state.depth);
        frame
    }

    fn close_frame(&mut self, floor: usize, depth: u32) {
        let open = self.stack.len() - floor;
        if open > 0 {
            log::trace!("dropping {} unclosed branch(es) at depth {}", open, depth);
            self.report.unclosed_branches += open as u32;
            self.stack.truncate(floor);
        }
    }

    fn execute(&mut self, command: TurtleCommand, state: &mut TurtleState, floor: usize) {
        match command {
            TurtleCommand::Forward => self.segment(state),
            TurtleCommand::Turn { axis, sign } => {
                let angle = sign * self.params.angle + self.angle_offset;
                state.rotation = (state.rotation * Quat::from_axis_angle(axis, angle)).normalize();
            }
            TurtleCommand::Push => {
                self.stack.push(*state);
                self.report.pushes += 1;
            }
            TurtleCommand::Pop => {
                if self.stack.len() > floor {
                    if let Some(saved) = self.stack.pop() {
                        *state = saved;
                        self.report.pops += 1;
                    }
                } else {
                    log::trace!("ignoring stray ']' at depth {}", state.depth);
                    self.report.stray_pops += 1;
                }
            }
            TurtleCommand::Leaf => {
                let radius = self.params.leaf_radius_for(state.thickness);
                self.ball(state.position, radius, Material::Leaf);
            }
        }
    }

    /// Sweep one segment: a bark ball per unit step, then advance
    fn segment(&mut self, state: &mut TurtleState) {
        let heading = state.heading();
        let length = self.params.segment_length;
        let steps = length.round().max(1.0) as u32;
        let step = heading * (length / steps as f32);

        // Foliage first so the branch core stays bark
        if self.params.foliage_depth.is_some_and(|d| state.depth >= d) {
            let radius = self.params.leaf_radius_for(state.thickness);
            self.ball(state.position, radius, Material::Leaf);
        }
        for i in 0..steps {
            self.ball(state.position + step * i as f32, state.thickness, Material::Bark);
        }

        state.position += heading * length;
        self.report.segments += 1;
    }

    /// Write every cell within `radius` of the cell containing `center`
    fn ball(&mut self, center: Vec3, radius: f32, material: Material) {
        let cell = center.round().as_ivec3();
        let reach = radius.max(0.0).floor() as i32;
        let radius_sq = radius * radius;

        for dy in -reach..=reach {
            for dz in -reach..=reach {
                for dx in -reach..=reach {
                    if (dx * dx + dy * dy + dz * dz) as f32 <= radius_sq {
                        self.write(cell, IVec3::new(dx, dy, dz), material);
                    }
                }
            }
        }
    }

    fn write(&mut self, cell: IVec3, offset: IVec3, material: Material) {
        let pos = match checked_sum(cell, offset).and_then(|local| checked_sum(self.anchor, local)) {
            Some(pos) if self.region.contains(pos) => pos,
            _ => {
                self.report.clipped += 1;
                return;
            }
        };
        match material {
            Material::Bark => {
                self.volume.set_block(pos, self.bark);
                self.report.bark_writes += 1;
            }
            Material::Leaf => {
                self.volume.set_block(pos, self.leaf);
                self.report.leaf_writes += 1;
            }
        }
        self.report.writes += 1;
        self.report.bounds.expand(pos);
    }
}

/// Component-wise sum, `None` once any axis leaves the `i32` range
fn checked_sum(a: IVec3, b: IVec3) -> Option<IVec3> {
    Some(IVec3::new(
        a.x.checked_add(b.x)?,
        a.y.checked_add(b.y)?,
        a.z.checked_add(b.z)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::ScriptedRandom;
    use crate::lsystem::RuleSet;
    use crate::voxel::block::{BlockId, BlockUri};
    use crate::voxel::volume::RecordingVolume;

    fn blocks() -> (Block, Block) {
        (
            Block { id: BlockId(1), uri: BlockUri::core("oak_trunk") },
            Block { id: BlockId(2), uri: BlockUri::core("green_leaf") },
        )
    }

    fn run(params: &TreeParams, volume: &mut RecordingVolume, angle_offset: f32) -> GenerationReport {
        run_at(params, volume, angle_offset, IVec3::ZERO)
    }

    fn run_at(
        params: &TreeParams,
        volume: &mut RecordingVolume,
        angle_offset: f32,
        anchor: IVec3,
    ) -> GenerationReport {
        let grammar = params.grammar();
        let (bark, leaf) = blocks();
        let mut rng = ScriptedRandom::constant(0.5);
        Turtle::new(&grammar, params, volume, &mut rng, &bark, &leaf, anchor, angle_offset).run()
    }

    /// Cells written by a terminal-only axiom with quarter turns
    fn trace(axiom: &str) -> Vec<IVec3> {
        let params = TreeParams::new(axiom, RuleSet::new(), 0, FRAC_PI_2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        run(&params, &mut volume, 0.0);
        volume.writes().iter().map(|w| w.pos).collect()
    }

    fn big_volume() -> RecordingVolume {
        RecordingVolume::new(GridAabb::new(IVec3::splat(-32), IVec3::splat(32)))
    }

    #[test]
    fn test_upright_heading() {
        let state = TurtleState::upright(1.0);
        assert!((state.heading() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_command_table() {
        assert_eq!(TurtleCommand::from_symbol('F'), Some(TurtleCommand::Forward));
        assert_eq!(TurtleCommand::from_symbol('G'), Some(TurtleCommand::Forward));
        assert_eq!(TurtleCommand::from_symbol('['), Some(TurtleCommand::Push));
        assert_eq!(TurtleCommand::from_symbol(']'), Some(TurtleCommand::Pop));
        assert_eq!(TurtleCommand::from_symbol('L'), Some(TurtleCommand::Leaf));
        assert_eq!(
            TurtleCommand::from_symbol('/'),
            Some(TurtleCommand::Turn { axis: Vec3::X, sign: -1.0 })
        );
        assert_eq!(TurtleCommand::from_symbol('A'), None);
    }

    #[test]
    fn test_vertical_line() {
        let params = TreeParams::new("FFF", RuleSet::new(), 0, 0.5)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        assert_eq!(cells, vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 2, 0)]);
        assert_eq!(report.segments, 3);
    }

    #[test]
    fn test_yaw_turns_heading() {
        // +90 degrees about local Z turns an upright turtle towards -X
        let params = TreeParams::new("F+FF", RuleSet::new(), 0, FRAC_PI_2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        run(&params, &mut volume, 0.0);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        assert_eq!(cells, vec![IVec3::ZERO, IVec3::Y, IVec3::new(-1, 1, 0)]);
    }

    #[test]
    fn test_push_pop_restores_state() {
        let params = TreeParams::new("F[+FF]F", RuleSet::new(), 0, FRAC_PI_2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        // branch goes sideways from y=1, trunk resumes at y=1
        assert_eq!(
            cells,
            vec![IVec3::ZERO, IVec3::Y, IVec3::Y, IVec3::new(-1, 1, 0), IVec3::Y]
        );
        assert_eq!(report.pushes, 1);
        assert_eq!(report.pops, 1);
    }

    #[test]
    fn test_stray_pop_is_ignored() {
        let params = TreeParams::new("]F]]F", RuleSet::new(), 0, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        assert_eq!(report.stray_pops, 3);
        assert_eq!(report.pops, 0);
        assert_eq!(volume.writes().len(), 2);
    }

    #[test]
    fn test_unclosed_push_dropped_at_frame_end() {
        let rules = RuleSet::new().with('A', crate::lsystem::LSystemRule::new("[F[F"));
        let params = TreeParams::new("A]F", rules, 1, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        assert_eq!(report.pushes, 2);
        assert_eq!(report.unclosed_branches, 2);
        // the ']' in the axiom cannot reach into the child frame's entries
        assert_eq!(report.stray_pops, 1);
        assert_eq!(report.pops, 0);
    }

    #[test]
    fn test_pen_continues_after_expansion() {
        let rules = RuleSet::new().with('A', crate::lsystem::LSystemRule::new("FF"));
        let params = TreeParams::new("AF", rules, 1, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        run(&params, &mut volume, 0.0);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        assert_eq!(cells, vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 2, 0)]);
    }

    #[test]
    fn test_thick_segment_cross_section() {
        let params = TreeParams::new("F", RuleSet::new(), 0, 0.3)
            .with_thickness(1.0)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        // radius 1 ball: the cell plus its six face neighbours
        assert_eq!(report.bark_writes, 7);
        assert_eq!(report.bounds, GridAabb::new(IVec3::splat(-1), IVec3::splat(2)));
    }

    #[test]
    fn test_leaf_symbol_does_not_move() {
        let params = TreeParams::new("LF", RuleSet::new(), 0, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);
        // radius max(1.5, 1.5) covers offsets with squared length <= 2.25
        assert_eq!(report.leaf_writes, 19);
        assert_eq!(report.bark_writes, 1);
        assert_eq!(volume.writes().last().map(|w| w.pos), Some(IVec3::ZERO));
    }

    #[test]
    fn test_angle_offset_applies_to_both_directions() {
        // with offset equal to the base angle, '-' cancels out entirely
        let params = TreeParams::new("-FF", RuleSet::new(), 0, 0.2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        run(&params, &mut volume, 0.2);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        assert_eq!(cells, vec![IVec3::ZERO, IVec3::Y]);
    }

    #[test]
    fn test_pitch_tilts_heading_along_z() {
        // '&' pitches an upright turtle towards -Z, '^' towards +Z
        assert_eq!(trace("F&FF"), vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 1, -1)]);
        assert_eq!(trace("F^FF"), vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 1, 1)]);
    }

    #[test]
    fn test_roll_keeps_heading_but_moves_yaw_plane() {
        // rolling alone does not change the drawn path
        assert_eq!(trace("*FF"), vec![IVec3::ZERO, IVec3::Y]);
        // without roll '+' turns towards -X, after a quarter roll it leaves the XY plane
        assert_eq!(trace("F+FF"), vec![IVec3::ZERO, IVec3::Y, IVec3::new(-1, 1, 0)]);
        assert_eq!(trace("F*+FF"), vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 1, 1)]);
        assert_eq!(trace("F/+FF"), vec![IVec3::ZERO, IVec3::Y, IVec3::new(0, 1, -1)]);
    }

    #[test]
    fn test_rules_on_drawing_symbols_are_ignored() {
        let rules = RuleSet::new()
            .with('F', crate::lsystem::LSystemRule::new("FFFF"))
            .with('[', crate::lsystem::LSystemRule::new("F"));
        let params = TreeParams::new("F[F]", rules, 3, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);

        assert_eq!(report.total_expansions(), 0);
        assert_eq!(report.segments, 2);
        assert_eq!(report.bark_writes, 2);
        assert_eq!(report.pushes, 1);
        assert_eq!(report.pops, 1);
        let cells: Vec<IVec3> = volume.writes().iter().map(|w| w.pos).collect();
        assert_eq!(cells, vec![IVec3::ZERO, IVec3::Y]);
    }

    #[test]
    fn test_anchor_near_i32_limits_is_clipped() {
        let params = TreeParams::new("FFF", RuleSet::new(), 0, FRAC_PI_2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = RecordingVolume::new(GridAabb::new(IVec3::ZERO, IVec3::splat(8)));
        let report = run_at(&params, &mut volume, 0.0, IVec3::new(0, i32::MAX - 1, 0));
        assert_eq!(report.writes, 0);
        assert_eq!(report.clipped, 3);
        assert!(volume.writes().is_empty());

        let params = TreeParams::new("+FF", RuleSet::new(), 0, FRAC_PI_2)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = RecordingVolume::new(GridAabb::new(IVec3::ZERO, IVec3::splat(8)));
        let report = run_at(&params, &mut volume, 0.0, IVec3::new(i32::MIN, 0, 0));
        assert_eq!(report.writes, 0);
        assert_eq!(report.clipped, 2);
    }

    #[test]
    fn test_region_at_top_of_range() {
        let params = TreeParams::new("FFFFFF", RuleSet::new(), 0, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let top = i32::MAX;
        let mut volume = RecordingVolume::new(GridAabb::new(
            IVec3::new(0, top - 4, 0),
            IVec3::new(4, top, 4),
        ));
        let report = run_at(&params, &mut volume, 0.0, IVec3::new(1, top - 4, 1));

        assert_eq!(report.writes, 4);
        assert_eq!(report.clipped, 2);
        let heights: Vec<i32> = volume.writes().iter().map(|w| w.pos.y).collect();
        assert_eq!(heights, vec![top - 4, top - 3, top - 2, top - 1]);
    }

    #[test]
    fn test_deep_linear_grammar() {
        let depth = 100_000;
        let rules = RuleSet::new().with('A', crate::lsystem::LSystemRule::new("FA"));
        let params = TreeParams::new("A", rules, depth, 0.3)
            .with_thickness(0.5)
            .with_foliage_depth(None);
        let mut volume = big_volume();
        let report = run(&params, &mut volume, 0.0);

        assert_eq!(report.max_depth_reached, depth);
        assert_eq!(report.segments, depth);
        assert_eq!(report.total_expansions(), depth);
        assert_eq!(report.discarded_symbols, 1);
        assert_eq!(report.writes + report.clipped, depth);
    }
}
