//! Property tests for the kernel's hard invariants

use cynic_core::constants::phi;
use cynic_core::learner::{Arm, ThompsonSampler};
use cynic_core::types::{Pattern, UserLearningProfile, Verdict};
use proptest::prelude::*;

proptest! {
    /// Verdict is a total function of Q: every finite score maps to exactly
    /// one verdict and the mapping is monotone in severity.
    #[test]
    fn verdict_total_and_monotone(q in 0.0f64..=100.0, delta in 0.0f64..=100.0) {
        let lower = Verdict::from_q_score(q);
        let higher = Verdict::from_q_score((q + delta).min(100.0));
        // Higher Q never yields a harsher verdict (Ord: Howl < ... < Bark)
        prop_assert!(higher <= lower);
    }

    /// Confidence is capped at φ⁻¹ for any raw input
    #[test]
    fn confidence_cap_holds(raw in -10.0f64..10.0) {
        let capped = cynic_core::types::Judgment::cap_confidence(raw);
        prop_assert!(capped >= 0.0);
        prop_assert!(capped <= phi::MAX_CONFIDENCE);
    }

    /// Learning rates are clamped into [0.1, 0.382] from any input
    #[test]
    fn learning_rate_bounds(raw in -5.0f64..5.0) {
        let clamped = UserLearningProfile::clamp_learning_rate(raw);
        prop_assert!((0.1..=phi::INV_PHI_SQ).contains(&clamped));
    }

    /// Pattern confidence merge is monotone and capped for any sequence
    #[test]
    fn pattern_confidence_monotone(observations in proptest::collection::vec(0.0f64..1.5, 1..20)) {
        let mut pattern = Pattern::new("t", "k");
        let mut previous = pattern.confidence;
        for observed in observations {
            pattern.merge_confidence(observed);
            prop_assert!(pattern.confidence >= previous, "never decreases");
            prop_assert!(pattern.confidence <= phi::MAX_CONFIDENCE, "capped");
            previous = pattern.confidence;
        }
    }

    /// Thompson arm parameters never decrease under any outcome sequence
    #[test]
    fn thompson_parameters_nondecreasing(outcomes in proptest::collection::vec(any::<bool>(), 1..50)) {
        let mut arm = Arm::new("arm");
        let (mut last_alpha, mut last_beta) = (arm.alpha, arm.beta);
        for outcome in outcomes {
            arm.record(outcome);
            prop_assert!(arm.alpha >= last_alpha);
            prop_assert!(arm.beta >= last_beta);
            last_alpha = arm.alpha;
            last_beta = arm.beta;
        }
    }

    /// Posterior mean stays a probability
    #[test]
    fn thompson_mean_is_probability(positives in 0u32..100, negatives in 0u32..100) {
        let sampler = ThompsonSampler::new();
        for _ in 0..positives {
            sampler.record("p", true);
        }
        for _ in 0..negatives {
            sampler.record("p", false);
        }
        let mean = sampler.expected_value("p");
        prop_assert!((0.0..=1.0).contains(&mean));
    }
}
