//! Random sources consumed by the generator
//!
//! The generator never owns an RNG; callers hand in anything implementing
//! [`RandomSource`]. [`SeededRandom`] is the reproducible default and
//! [`ScriptedRandom`] replays a fixed list of values for tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniformly distributed floats
pub trait RandomSource {
    /// Next value in `[0, 1)`
    fn next_f32(&mut self) -> f32;

    /// Next value in `[min, max)`
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f32(&mut self) -> f32 {
        (**self).next_f32()
    }
}

/// Seeded ChaCha8 stream, identical output for identical seeds
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Create a new source from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f32(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }
}

/// Replays a fixed sequence of values, wrapping around at the end
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
    draws: usize,
}

impl ScriptedRandom {
    /// Create a source that cycles through `values`.
    ///
    /// Values are clamped into `[0, 1)`; an empty list always yields 0.5.
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f32::EPSILON))
            .collect();
        Self {
            values,
            cursor: 0,
            draws: 0,
        }
    }

    /// Source that always returns the same value
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        self.draws += 1;
        if self.values.is_empty() {
            return 0.5;
        }
        let value = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }
}
