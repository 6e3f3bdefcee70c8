//! Non-commutative axiom pairs
//!
//! Records the score difference when a pair of axioms is evaluated in
//! reversed order. Pairs whose difference stays consistently above the
//! threshold are flagged: their evaluation order carries information.
//! Advisory only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Axiom;

/// Mean |Δ| above which a pair is flagged
const FLAG_THRESHOLD: f64 = 2.0;

/// Minimum samples before a pair can be flagged
const MIN_SAMPLES: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PairStats {
    delta_sum: f64,
    abs_delta_sum: f64,
    samples: u64,
}

/// A flagged order-dependent axiom pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDependentPair {
    pub first: Axiom,
    pub second: Axiom,
    pub mean_delta: f64,
    pub samples: u64,
}

/// Tracks order-dependence between axiom evaluations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonCommutativeTracker {
    pairs: HashMap<String, PairStats>,
}

fn pair_key(a: Axiom, b: Axiom) -> String {
    format!("{}*{}", a.as_str(), b.as_str())
}

impl NonCommutativeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the score difference between evaluating `(a then b)` and
    /// `(b then a)` for the same item
    pub fn record(&mut self, a: Axiom, b: Axiom, forward_score: f64, reversed_score: f64) {
        let delta = forward_score - reversed_score;
        let stats = self.pairs.entry(pair_key(a, b)).or_default();
        stats.delta_sum += delta;
        stats.abs_delta_sum += delta.abs();
        stats.samples += 1;
    }

    /// Pairs whose mean |Δ| exceeds the threshold with enough evidence
    pub fn flagged_pairs(&self) -> Vec<OrderDependentPair> {
        let mut flagged = Vec::new();
        for (key, stats) in &self.pairs {
            if stats.samples < MIN_SAMPLES {
                continue;
            }
            let mean_abs = stats.abs_delta_sum / stats.samples as f64;
            if mean_abs <= FLAG_THRESHOLD {
                continue;
            }
            if let Some((first, second)) = parse_key(key) {
                flagged.push(OrderDependentPair {
                    first,
                    second,
                    mean_delta: stats.delta_sum / stats.samples as f64,
                    samples: stats.samples,
                });
            }
        }
        flagged.sort_by(|a, b| b.mean_delta.abs().total_cmp(&a.mean_delta.abs()));
        flagged
    }
}

fn parse_key(key: &str) -> Option<(Axiom, Axiom)> {
    let (first, second) = key.split_once('*')?;
    let lookup = |name: &str| {
        Axiom::ALL
            .into_iter()
            .find(|axiom| axiom.as_str() == name)
    };
    Some((lookup(first)?, lookup(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commuting_pair_not_flagged() {
        let mut tracker = NonCommutativeTracker::new();
        for _ in 0..10 {
            tracker.record(Axiom::Phi, Axiom::Burn, 60.0, 60.0);
        }
        assert!(tracker.flagged_pairs().is_empty());
    }

    #[test]
    fn test_consistent_delta_flagged() {
        let mut tracker = NonCommutativeTracker::new();
        for _ in 0..10 {
            tracker.record(Axiom::Verify, Axiom::Culture, 65.0, 58.0);
        }
        let flagged = tracker.flagged_pairs();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].first, Axiom::Verify);
        assert!((flagged[0].mean_delta - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_needs_minimum_samples() {
        let mut tracker = NonCommutativeTracker::new();
        tracker.record(Axiom::Phi, Axiom::Verify, 90.0, 10.0);
        assert!(tracker.flagged_pairs().is_empty());
    }
}
