//! Thompson sampling over named arms
//!
//! Every pattern, heuristic, and dog choice is an arm holding a Beta(α, β)
//! posterior with (1, 1) priors. Selection draws one sample per arm and
//! takes the argmax; updates add one to α on positive outcomes and one to β
//! on negative ones, so both parameters are non-decreasing.

use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};

use crate::learner::sharded::ShardedMap;

/// One arm's Beta posterior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arm {
    pub name: String,
    /// Successes + 1
    pub alpha: f64,
    /// Failures + 1
    pub beta: f64,
    pub pulls: u64,
}

impl Arm {
    /// Uninformative prior
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alpha: 1.0,
            beta: 1.0,
            pulls: 0,
        }
    }

    /// Posterior mean α/(α+β)
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// `√(αβ / ((α+β)²(α+β+1)))`
    pub fn uncertainty(&self) -> f64 {
        let n = self.alpha + self.beta;
        ((self.alpha * self.beta) / (n * n * (n + 1.0))).sqrt()
    }

    /// One posterior draw via inverse-CDF sampling
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        let u: f64 = rng.random();
        match Beta::new(self.alpha, self.beta) {
            Ok(dist) => dist.inverse_cdf(u),
            Err(_) => self.mean(),
        }
    }

    /// Record a binary outcome
    pub fn record(&mut self, positive: bool) {
        self.pulls += 1;
        if positive {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }

    /// Record a fractional outcome in [0, 1]
    pub fn record_partial(&mut self, success_fraction: f64) {
        let fraction = success_fraction.clamp(0.0, 1.0);
        self.pulls += 1;
        self.alpha += fraction;
        self.beta += 1.0 - fraction;
    }
}

/// Posterior store over all named arms
pub struct ThompsonSampler {
    arms: ShardedMap<String, Arm>,
}

impl Default for ThompsonSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThompsonSampler {
    pub fn new() -> Self {
        Self {
            arms: ShardedMap::new(),
        }
    }

    /// Current posterior for an arm, if it has ever been touched
    pub fn arm(&self, name: &str) -> Option<Arm> {
        self.arms.get(&name.to_string())
    }

    /// Record a binary outcome for an arm, creating it on first touch
    pub fn record(&self, name: &str, positive: bool) -> Arm {
        self.arms.with_entry(
            &name.to_string(),
            || Arm::new(name),
            |arm| {
                arm.record(positive);
                arm.clone()
            },
        )
    }

    /// Record a fractional outcome in [0, 1]
    pub fn record_partial(&self, name: &str, success_fraction: f64) -> Arm {
        self.arms.with_entry(
            &name.to_string(),
            || Arm::new(name),
            |arm| {
                arm.record_partial(success_fraction);
                arm.clone()
            },
        )
    }

    /// Select among candidates: one draw per arm, argmax wins.
    ///
    /// Unseen candidates sample from the uninformative prior, which keeps
    /// natural exploration pressure on cold arms.
    pub fn select(&self, candidates: &[&str], rng: &mut impl Rng) -> Option<String> {
        let mut best: Option<(String, f64)> = None;
        for &name in candidates {
            let arm = self
                .arms
                .get(&name.to_string())
                .unwrap_or_else(|| Arm::new(name));
            let draw = arm.sample(rng);
            match &best {
                Some((_, best_draw)) if *best_draw >= draw => {}
                _ => best = Some((name.to_string(), draw)),
            }
        }
        best.map(|(name, _)| name)
    }

    /// Posterior mean for an arm; prior mean 0.5 when unseen
    pub fn expected_value(&self, name: &str) -> f64 {
        self.arm(name).map_or(0.5, |arm| arm.mean())
    }

    /// All arms, for stats surfaces and persistence
    pub fn snapshot(&self) -> Vec<Arm> {
        self.arms.snapshot().into_iter().map(|(_, arm)| arm).collect()
    }

    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_prior_mean_is_half() {
        let arm = Arm::new("a");
        assert!((arm.mean() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_posterior_monotonicity() {
        let sampler = ThompsonSampler::new();
        let before = sampler.expected_value("x");
        let after_positive = sampler.record("x", true);
        assert!(after_positive.mean() > before, "mean moves toward 1 after correct");
        let alpha_before = after_positive.alpha;
        let beta_before = after_positive.beta;
        let after_negative = sampler.record("x", false);
        assert!(after_negative.mean() < after_positive.mean(), "mean moves toward 0 after incorrect");
        assert!(after_negative.alpha >= alpha_before, "alpha never decreases");
        assert!(after_negative.beta >= beta_before, "beta never decreases");
    }

    #[test]
    fn test_uncertainty_shrinks_with_evidence() {
        let mut arm = Arm::new("a");
        let wide = arm.uncertainty();
        for i in 0..50 {
            arm.record(i % 2 == 0);
        }
        assert!(arm.uncertainty() < wide);
    }

    #[test]
    fn test_partial_outcome_splits_mass() {
        let mut arm = Arm::new("a");
        arm.record_partial(0.75);
        assert!((arm.alpha - 1.75).abs() < 1e-9);
        assert!((arm.beta - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_thompson_convergence() {
        // S3: arms with true means 0.8 and 0.3; after 1000 simulated
        // outcomes the better arm dominates selection.
        let sampler = ThompsonSampler::new();
        let mut rng = StdRng::seed_from_u64(618);
        for _ in 0..1000 {
            if let Some(choice) = sampler.select(&["a", "b"], &mut rng) {
                let true_mean = if choice == "a" { 0.8 } else { 0.3 };
                let outcome = rng.random::<f64>() < true_mean;
                sampler.record(&choice, outcome);
            }
        }
        let pulls_a = sampler.arm("a").map_or(0, |arm| arm.pulls);
        let pulls_b = sampler.arm("b").map_or(0, |arm| arm.pulls);
        let total = (pulls_a + pulls_b) as f64;
        assert!(
            pulls_a as f64 / total >= 0.8,
            "better arm selected {:.2} of the time",
            pulls_a as f64 / total
        );
    }

    #[test]
    fn test_select_covers_unseen_arms() {
        let sampler = ThompsonSampler::new();
        let mut rng = StdRng::seed_from_u64(42);
        let choice = sampler.select(&["cold"], &mut rng);
        assert_eq!(choice.as_deref(), Some("cold"));
        assert!(sampler.select(&[], &mut rng).is_none());
    }
}
