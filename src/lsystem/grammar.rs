//! Axiom plus rule set

use std::str::Chars;

use crate::core::error::Error;
use crate::core::random::RandomSource;
use crate::core::types::Result;
use crate::lsystem::rewrite::Rewrite;
use crate::lsystem::rule::{LSystemRule, RuleSet};

/// An L-system: initial axiom and its production rules
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    axiom: String,
    rules: RuleSet,
}

impl Grammar {
    pub fn new(axiom: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            axiom: axiom.into(),
            rules,
        }
    }

    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Generation zero as a lazy symbol sequence
    pub fn symbols(&self) -> Chars<'_> {
        self.axiom.chars()
    }

    /// Production for `symbol` when `remaining_depth` expansions are left
    pub fn production(
        &self,
        symbol: char,
        remaining_depth: u32,
        rng: &mut dyn RandomSource,
    ) -> Option<&LSystemRule> {
        self.rules.select(symbol, remaining_depth, rng)
    }

    /// One lazy rewriting pass over an arbitrary symbol sequence
    pub fn rewrite<'a, I: Iterator<Item = char>>(
        &'a self,
        symbols: I,
        remaining_depth: u32,
        rng: &'a mut dyn RandomSource,
    ) -> Rewrite<'a, I> {
        Rewrite::new(symbols, &self.rules, remaining_depth, rng)
    }

    /// Materialize generation `n` of the axiom.
    ///
    /// Each pass is lazy, but the result of a pass is collected before the
    /// next one starts. Fails once a generation would exceed `limit` symbols.
    pub fn generation(&self, n: u32, rng: &mut dyn RandomSource, limit: usize) -> Result<String> {
        let mut current = self.axiom.clone();
        for generation in 1..=n {
            let remaining = n - generation + 1;
            let mut next = String::with_capacity(current.len().min(limit));
            for (count, symbol) in self.rewrite(current.chars(), remaining, &mut *rng).enumerate() {
                if count >= limit {
                    return Err(Error::ExpansionLimit { generation, limit });
                }
                next.push(symbol);
            }
            current = next;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::{ScriptedRandom, SeededRandom};

    fn algae() -> Grammar {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("AB"))
            .with('B', LSystemRule::new("A"));
        Grammar::new("A", rules)
    }

    #[test]
    fn test_generations() {
        let grammar = algae();
        let mut rng = ScriptedRandom::constant(0.0);
        let expected = ["A", "AB", "ABA", "ABAAB", "ABAABABA"];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(&grammar.generation(n as u32, &mut rng, 1024).unwrap(), want);
        }
    }

    #[test]
    fn test_generation_limit() {
        let grammar = Grammar::new("A", RuleSet::new().with('A', LSystemRule::new("AA")));
        let mut rng = ScriptedRandom::constant(0.0);
        assert!(grammar.generation(4, &mut rng, 16).is_ok());
        match grammar.generation(5, &mut rng, 16) {
            Err(Error::ExpansionLimit { generation, limit }) => {
                assert_eq!(generation, 5);
                assert_eq!(limit, 16);
            }
            other => panic!("expected ExpansionLimit, got {:?}", other),
        }
    }

    #[test]
    fn test_stochastic_generation_reproducible() {
        let rules = RuleSet::new()
            .with('A', LSystemRule::new("F[+A]").weighted(1.0))
            .with('A', LSystemRule::new("F[-A]A").weighted(1.0))
            .with('F', LSystemRule::with_probability("FF", 0.5));
        let grammar = Grammar::new("A", rules);
        let a = grammar.generation(4, &mut SeededRandom::new(9), 10_000).unwrap();
        let b = grammar.generation(4, &mut SeededRandom::new(9), 10_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_axiom_symbols() {
        let grammar = Grammar::new("F[+F]", RuleSet::new());
        assert_eq!(grammar.symbols().collect::<String>(), "F[+F]");
        assert!(grammar.rules().is_empty());
    }
}
