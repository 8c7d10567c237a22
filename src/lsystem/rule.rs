//! Production rules and rule sets
//!
//! A symbol may own several alternative productions. Selection between
//! them and the per-rule firing chance both draw from the caller's
//! [`RandomSource`], so a fixed seed gives a fixed expansion.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::random::RandomSource;
use crate::core::types::Result;

/// A single production: `symbol -> successor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LSystemRule {
    /// Replacement symbols, in order
    pub successor: String,
    /// Chance that the rule fires at all (0.0 - 1.0)
    #[serde(default = "default_one")]
    pub probability: f32,
    /// Relative weight among alternatives for the same symbol
    #[serde(default = "default_one")]
    pub weight: f32,
}

fn default_one() -> f32 {
    1.0
}

impl LSystemRule {
    /// Rule that always fires
    pub fn new(successor: impl Into<String>) -> Self {
        Self {
            successor: successor.into(),
            probability: 1.0,
            weight: 1.0,
        }
    }

    /// Rule that fires with the given probability
    pub fn with_probability(successor: impl Into<String>, probability: f32) -> Self {
        Self {
            probability,
            ..Self::new(successor)
        }
    }

    /// Set the alternative weight
    pub fn weighted(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Successor as a lazy symbol sequence
    pub fn symbols(&self) -> std::str::Chars<'_> {
        self.successor.chars()
    }

    /// Whether the rule fires when `remaining_depth` expansions are left.
    ///
    /// The failure chance compounds with the remaining depth,
    /// `(1 - p)^remaining`, so rules close to the root nearly always fire
    /// while rules near the depth cap thin out. Certain rules draw nothing.
    fn fires(&self, remaining_depth: u32, rng: &mut dyn RandomSource) -> bool {
        if self.probability >= 1.0 {
            return true;
        }
        let failure = (1.0 - self.probability.max(0.0)).powi(remaining_depth.max(1) as i32);
        rng.next_f32() >= failure
    }

    fn validate(&self, symbol: char) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(Error::InvalidParams(format!(
                "rule {:?}: probability {} outside [0, 1]",
                symbol, self.probability
            )));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(Error::InvalidParams(format!(
                "rule {:?}: weight must be positive, got {}",
                symbol, self.weight
            )));
        }
        Ok(())
    }
}

/// Serialized form of the productions for one symbol.
///
/// A bare string is a certain rule, an object is a single rule with
/// probability/weight, and an array lists weighted alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Successor(String),
    Rule(LSystemRule),
    Alternatives(Vec<LSystemRule>),
}

/// Mapping from symbol to its alternative productions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, RuleSpec>", into = "BTreeMap<String, RuleSpec>")]
pub struct RuleSet {
    rules: BTreeMap<char, Vec<LSystemRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a production for `symbol`. Repeated calls add alternatives.
    pub fn insert(&mut self, symbol: char, rule: LSystemRule) -> &mut Self {
        self.rules.entry(symbol).or_default().push(rule);
        self
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, symbol: char, rule: LSystemRule) -> Self {
        self.insert(symbol, rule);
        self
    }

    /// Alternatives registered for `symbol`
    pub fn get(&self, symbol: char) -> Option<&[LSystemRule]> {
        self.rules.get(&symbol).map(Vec::as_slice)
    }

    /// Whether `symbol` is rewritable
    pub fn contains(&self, symbol: char) -> bool {
        self.rules.contains_key(&symbol)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over symbols and their alternatives in symbol order
    pub fn iter(&self) -> impl Iterator<Item = (char, &[LSystemRule])> {
        self.rules.iter().map(|(c, r)| (*c, r.as_slice()))
    }

    /// Pick the production for `symbol`, or `None` if it stays terminal.
    ///
    /// A lone certain rule consumes no random values; otherwise one draw
    /// chooses among alternatives and one decides whether the chosen rule
    /// fires.
    pub fn select(
        &self,
        symbol: char,
        remaining_depth: u32,
        rng: &mut dyn RandomSource,
    ) -> Option<&LSystemRule> {
        let alternatives = self.rules.get(&symbol)?;
        let rule = match alternatives.as_slice() {
            [] => return None,
            [only] => only,
            many => {
                let total: f32 = many.iter().map(|r| r.weight).sum();
                let mut pick = rng.range(0.0, total);
                let mut chosen = &many[many.len() - 1];
                for rule in many {
                    if pick < rule.weight {
                        chosen = rule;
                        break;
                    }
                    pick -= rule.weight;
                }
                chosen
            }
        };
        rule.fires(remaining_depth, rng).then_some(rule)
    }

    /// Check probabilities and weights of every rule
    pub fn validate(&self) -> Result<()> {
        for (symbol, alternatives) in &self.rules {
            for rule in alternatives {
                rule.validate(*symbol)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, RuleSpec>> for RuleSet {
    type Error = Error;

    fn try_from(specs: BTreeMap<String, RuleSpec>) -> Result<Self> {
        let mut set = Self::new();
        for (key, spec) in specs {
            let mut chars = key.chars();
            let symbol = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(Error::InvalidParams(format!(
                        "rule key {:?} must be exactly one symbol",
                        key
                    )));
                }
            };
            let alternatives = match spec {
                RuleSpec::Successor(successor) => vec![LSystemRule::new(successor)],
                RuleSpec::Rule(rule) => vec![rule],
                RuleSpec::Alternatives(rules) => rules,
            };
            for rule in alternatives {
                set.insert(symbol, rule);
            }
        }
        set.validate()?;
        Ok(set)
    }
}

impl From<RuleSet> for BTreeMap<String, RuleSpec> {
    fn from(set: RuleSet) -> Self {
        set.rules
            .into_iter()
            .map(|(symbol, mut alternatives)| {
                let spec = if alternatives.len() == 1 {
                    let rule = alternatives.remove(0);
                    if rule.probability == 1.0 && rule.weight == 1.0 {
                        RuleSpec::Successor(rule.successor)
                    } else {
                        RuleSpec::Rule(rule)
                    }
                } else {
                    RuleSpec::Alternatives(alternatives)
                };
                (symbol.to_string(), spec)
            })
            .collect()
    }
}

impl FromIterator<(char, LSystemRule)> for RuleSet {
    fn from_iter<T: IntoIterator<Item = (char, LSystemRule)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (symbol, rule) in iter {
            set.insert(symbol, rule);
        }
        set
    }
}
