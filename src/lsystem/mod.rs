//! L-system grammar engine
//!
//! Owns rules and axioms and hands out lazy symbol sequences. No geometry
//! lives here; see [`crate::voxel::procgen`] for the turtle that draws them.

pub mod rule;
pub mod grammar;
pub mod rewrite;

pub use grammar::Grammar;
pub use rewrite::Rewrite;
pub use rule::{LSystemRule, RuleSet};
