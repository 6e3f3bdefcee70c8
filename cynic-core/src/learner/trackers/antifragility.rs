//! Antifragility index
//!
//! Tracks exponential-moving mean and variance of reward, split by whether
//! the observation happened under controlled stress. A system whose rewards
//! improve under stress is antifragile; one that merely holds is robust;
//! one that degrades is fragile. Advisory only.

use serde::{Deserialize, Serialize};

/// Exponential decay factor for the moving statistics
const EMA_LAMBDA: f64 = 0.1;

/// Minimum samples on both sides before labeling
const MIN_SAMPLES: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragilityLabel {
    Fragile,
    Robust,
    Antifragile,
    /// Not enough evidence yet
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EwStats {
    mean: f64,
    variance: f64,
    samples: u64,
}

impl EwStats {
    fn record(&mut self, value: f64) {
        self.samples += 1;
        if self.samples == 1 {
            self.mean = value;
            return;
        }
        let delta = value - self.mean;
        self.mean += EMA_LAMBDA * delta;
        self.variance = (1.0 - EMA_LAMBDA) * (self.variance + EMA_LAMBDA * delta * delta);
    }
}

/// Reward statistics under calm and stressed conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AntifragilityIndex {
    calm: EwStats,
    stressed: EwStats,
}

impl AntifragilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reward observation
    pub fn record(&mut self, reward: f64, under_stress: bool) {
        if under_stress {
            self.stressed.record(reward);
        } else {
            self.calm.record(reward);
        }
    }

    /// Current label
    pub fn label(&self) -> FragilityLabel {
        if self.calm.samples < MIN_SAMPLES || self.stressed.samples < MIN_SAMPLES {
            return FragilityLabel::Unknown;
        }
        let gain = self.stressed.mean - self.calm.mean;
        if gain > 0.05 {
            FragilityLabel::Antifragile
        } else if gain < -0.15 || self.stressed.variance > self.calm.variance * 3.0 {
            FragilityLabel::Fragile
        } else {
            FragilityLabel::Robust
        }
    }

    /// Mean reward under stress minus mean reward when calm
    pub fn stress_gain(&self) -> f64 {
        self.stressed.mean - self.calm.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(index: &mut AntifragilityIndex, calm: f64, stressed: f64, n: usize) {
        for _ in 0..n {
            index.record(calm, false);
            index.record(stressed, true);
        }
    }

    #[test]
    fn test_unknown_until_sampled() {
        let mut index = AntifragilityIndex::new();
        index.record(0.5, false);
        assert_eq!(index.label(), FragilityLabel::Unknown);
    }

    #[test]
    fn test_antifragile_when_stress_improves_reward() {
        let mut index = AntifragilityIndex::new();
        feed(&mut index, 0.2, 0.6, 20);
        assert_eq!(index.label(), FragilityLabel::Antifragile);
        assert!(index.stress_gain() > 0.0);
    }

    #[test]
    fn test_fragile_when_stress_collapses_reward() {
        let mut index = AntifragilityIndex::new();
        feed(&mut index, 0.6, 0.1, 20);
        assert_eq!(index.label(), FragilityLabel::Fragile);
    }

    #[test]
    fn test_robust_when_reward_holds() {
        let mut index = AntifragilityIndex::new();
        feed(&mut index, 0.5, 0.5, 20);
        assert_eq!(index.label(), FragilityLabel::Robust);
    }
}
