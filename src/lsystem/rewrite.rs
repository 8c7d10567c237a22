//! Lazy single-pass rewriting

use std::str::Chars;

use crate::core::random::RandomSource;
use crate::lsystem::rule::RuleSet;

/// Iterator performing one rewriting pass over `symbols`.
///
/// Symbols with a firing rule are replaced by their successor, all others
/// pass through unchanged. Nothing is buffered beyond the successor of the
/// symbol currently being emitted, so a consumer may stop at any point.
pub struct Rewrite<'a, I> {
    symbols: I,
    rules: &'a RuleSet,
    remaining_depth: u32,
    rng: &'a mut dyn RandomSource,
    current: Option<Chars<'a>>,
}

impl<'a, I: Iterator<Item = char>> Rewrite<'a, I> {
    pub fn new(
        symbols: I,
        rules: &'a RuleSet,
        remaining_depth: u32,
        rng: &'a mut dyn RandomSource,
    ) -> Self {
        Self {
            symbols,
            rules,
            remaining_depth,
            rng,
            current: None,
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Rewrite<'_, I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.current.as_mut().and_then(Iterator::next) {
                return Some(c);
            }
            self.current = None;

            let symbol = self.symbols.next()?;
            match self.rules.select(symbol, self.remaining_depth, &mut *self.rng) {
                Some(rule) => self.current = Some(rule.symbols()),
                None => return Some(symbol),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::ScriptedRandom;
    use crate::lsystem::rule::LSystemRule;

    #[test]
    fn test_single_pass() {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("AB"))
            .with('B', LSystemRule::new("A"));
        let mut rng = ScriptedRandom::constant(0.0);
        let out: String = Rewrite::new("ABA".chars(), &rules, 1, &mut rng).collect();
        assert_eq!(out, "ABAAB");
    }

    #[test]
    fn test_terminals_pass_through() {
        let rules = RuleSet::new().with('X', LSystemRule::new("F[+X]"));
        let mut rng = ScriptedRandom::constant(0.0);
        let out: String = Rewrite::new("F-X]".chars(), &rules, 1, &mut rng).collect();
        assert_eq!(out, "F-F[+X]]");
    }

    #[test]
    fn test_empty_successor_deletes() {
        let rules = RuleSet::new().with('D', LSystemRule::new(""));
        let mut rng = ScriptedRandom::constant(0.0);
        let out: String = Rewrite::new("FDDF".chars(), &rules, 1, &mut rng).collect();
        assert_eq!(out, "FF");
    }

    #[test]
    fn test_lazy_prefix_of_cyclic_grammar() {
        // A -> AA doubles forever; taking a prefix must not expand everything
        let rules = RuleSet::new().with('A', LSystemRule::new("AAAAAAAA"));
        let mut rng = ScriptedRandom::constant(0.0);
        let prefix: String = Rewrite::new(std::iter::repeat('A'), &rules, 1, &mut rng)
            .take(20)
            .collect();
        assert_eq!(prefix.len(), 20);
    }
}
