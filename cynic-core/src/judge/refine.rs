//! Self-refinement: narrowly-scoped rescoring of the weakest axiom
//!
//! Runs when Q < 60 or the verdict is GROWL/BARK. Each iteration re-reads
//! the item under an alternative rubric for the currently weakest axiom and
//! keeps the rescore only if total Q strictly improves.

use std::collections::BTreeMap;

use tracing::debug;

use crate::judge::axioms::{score_axiom, AxiomWeights};
use crate::judge::metrics::{analyze, ContentMetrics};
use crate::types::{Axiom, Observation, Refinement};

/// Maximum refinement iterations
pub const MAX_ITERATIONS: u32 = 2;

/// Q-score below which refinement is attempted
pub const REFINE_BELOW_Q: f64 = 60.0;

/// Weighted Q over axiom scores
pub fn weighted_q(scores: &BTreeMap<Axiom, f64>, weights: &AxiomWeights) -> f64 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (&axiom, &score) in scores {
        let w = weights.get(axiom);
        total += score * w;
        weight_sum += w;
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        (total / weight_sum).clamp(0.0, 100.0)
    }
}

/// Attempt refinement in place; returns the record when any iteration ran.
pub fn refine(
    obs: &Observation,
    scores: &mut BTreeMap<Axiom, f64>,
    weights: &AxiomWeights,
) -> Option<Refinement> {
    let original_q = weighted_q(scores, weights);
    let mut current_q = original_q;
    let mut iterations = 0;

    for _ in 0..MAX_ITERATIONS {
        let Some((&weakest, _)) = scores
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
        else {
            break;
        };

        iterations += 1;
        let Some(rescored) = rescore_alternative(weakest, obs) else {
            continue;
        };

        let mut candidate = scores.clone();
        candidate.insert(weakest, rescored);
        let candidate_q = weighted_q(&candidate, weights);

        // Accept only strict improvement of total Q
        if candidate_q > current_q {
            debug!(
                axiom = weakest.as_str(),
                from = current_q,
                to = candidate_q,
                "refinement accepted"
            );
            *scores = candidate;
            current_q = candidate_q;
        }
    }

    if iterations == 0 {
        return None;
    }
    Some(Refinement {
        original_q,
        final_q: current_q,
        improvement: current_q - original_q,
        iterations,
    })
}

/// Rescore one axiom under an alternative rubric: the item is re-read with
/// comments and blank lines stripped, which separates structural sprawl
/// from annotation weight. VERIFY additionally gets credit for the
/// observation's surrounding context.
fn rescore_alternative(axiom: Axiom, obs: &Observation) -> Option<f64> {
    let content = obs.content();
    let stripped: String = content
        .lines()
        .filter(|line| {
            let t = line.trim();
            !t.is_empty() && !t.starts_with("//") && !t.starts_with('#') && !t.starts_with('*')
        })
        .collect::<Vec<_>>()
        .join("\n");
    if stripped.is_empty() {
        return None;
    }

    let mut metrics: ContentMetrics = analyze(&stripped);
    if axiom == Axiom::Verify && !obs.context.is_empty() {
        // Context mentioning verification counts toward falsifiability
        let context_metrics = analyze(&obs.context);
        metrics.test_signals += context_metrics.test_signals;
        metrics.error_handling_signals += context_metrics.error_handling_signals;
    }

    score_axiom(axiom, obs, &metrics).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HookEventKind, JudgmentLevel, Reality};
    use serde_json::json;

    fn observation(content: &str, context: &str) -> Observation {
        Observation {
            source: HookEventKind::PostToolUse,
            reality: Reality::Code,
            data: json!({"content": content}),
            context: context.to_string(),
            run_judgment: true,
            level: JudgmentLevel::Reflect,
            session_id: None,
            user_id: None,
            received_at: chrono::Utc::now(),
        }
    }

    fn scores(phi: f64, verify: f64, culture: f64, burn: f64) -> BTreeMap<Axiom, f64> {
        [
            (Axiom::Phi, phi),
            (Axiom::Verify, verify),
            (Axiom::Culture, culture),
            (Axiom::Burn, burn),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_weighted_q_equal_weights_is_mean() {
        let q = weighted_q(&scores(70.0, 70.0, 70.0, 70.0), &AxiomWeights::default());
        assert!((q - 70.0).abs() < 1e-9);
        let q = weighted_q(&scores(70.0, 20.0, 70.0, 70.0), &AxiomWeights::default());
        assert!((q - 57.5).abs() < 1e-9);
    }

    #[test]
    fn test_refine_never_worsens_q() {
        let obs = observation("// a comment\nlet tested = assert_works();\n", "cargo test passed");
        let mut axiom_scores = scores(40.0, 10.0, 40.0, 40.0);
        let weights = AxiomWeights::default();
        let before = weighted_q(&axiom_scores, &weights);
        let record = refine(&obs, &mut axiom_scores, &weights);
        let after = weighted_q(&axiom_scores, &weights);
        assert!(after >= before);
        if let Some(r) = record {
            assert!(r.improvement >= 0.0);
            assert!(r.iterations <= MAX_ITERATIONS);
            assert!((r.final_q - after).abs() < 1e-9);
        }
    }

    #[test]
    fn test_refine_reports_original_q() {
        let obs = observation("let x = 1;", "");
        let mut axiom_scores = scores(30.0, 30.0, 30.0, 30.0);
        let weights = AxiomWeights::default();
        if let Some(record) = refine(&obs, &mut axiom_scores, &weights) {
            assert!((record.original_q - 30.0).abs() < 1e-9);
        }
    }
}
