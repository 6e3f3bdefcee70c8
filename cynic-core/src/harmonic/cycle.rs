//! The learning cycle
//!
//! Drains unapplied feedback in `(created_at, id)` order, recomputes the
//! per-axiom weight modifiers and the verdict threshold delta, sweeps
//! promotions, and writes one immutable `LearningCycle` audit row.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::constants::defaults;
use crate::error::Result;
use crate::judge::AxiomWeights;
use crate::learner::ThompsonSampler;
use crate::storage::Store;
use crate::types::{Axiom, Feedback, FeedbackOutcome, Judgment, LearningCycle, Verdict};

use super::promotion;

/// Feedback rows drained per cycle
const CYCLE_FEEDBACK_LIMIT: usize = 256;

/// Step applied to a weight when feedback contradicts a verdict
const WEIGHT_STEP: f64 = 0.05;

/// Relaxation of weights toward 1.0 on confirming feedback
const WEIGHT_RELAXATION: f64 = 0.01;

/// What one cycle computed, for the caller to apply
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub cycle: LearningCycle,
    pub weights: AxiomWeights,
    /// Bounded verdict threshold shift, positive = stricter
    pub threshold_delta: f64,
}

/// Run one learning cycle against the store.
///
/// The immediate per-feedback Thompson and Q-table updates already happened
/// when each feedback arrived; the cycle owns the aggregate recomputation
/// (weights, threshold delta, promotions) and marks the feedback applied.
#[instrument(skip_all)]
pub async fn run_cycle(
    store: &Arc<dyn Store>,
    thompson: &ThompsonSampler,
    mut weights: AxiomWeights,
    mut threshold_delta: f64,
) -> Result<CycleOutcome> {
    let started = std::time::Instant::now();
    let mut cycle = LearningCycle::new();

    let feedback = store.unapplied_feedback(CYCLE_FEEDBACK_LIMIT).await?;
    let mut weight_deltas: Vec<f64> = Vec::new();
    let mut sentiment_sum = 0.0;
    let mut applied_ids = Vec::with_capacity(feedback.len());

    for fb in &feedback {
        sentiment_sum += fb.outcome.sentiment() * fb.confidence;

        if let Some(judgment_id) = &fb.judgment_id {
            if let Some(judgment) = store.get_judgment(judgment_id).await? {
                if let Some(delta) = adjust_weights(&mut weights, &judgment, fb) {
                    weight_deltas.push(delta);
                }
            }
        }
        applied_ids.push(fb.feedback_id.clone());
    }

    cycle.feedback_processed = feedback.len() as u64;

    // Negative sentiment tightens the thresholds, positive relaxes them
    if !feedback.is_empty() {
        let mean_sentiment = sentiment_sum / feedback.len() as f64;
        let shift = -mean_sentiment * 2.0;
        let before = threshold_delta;
        threshold_delta = (threshold_delta + shift)
            .clamp(-defaults::THRESHOLD_DELTA_MAX, defaults::THRESHOLD_DELTA_MAX);
        if (threshold_delta - before).abs() > f64::EPSILON {
            cycle.thresholds_adjusted = 1;
            cycle.avg_threshold_delta = threshold_delta - before;
        }
    }

    cycle.weights_adjusted = weight_deltas.len() as u64;
    if !weight_deltas.is_empty() {
        cycle.avg_weight_delta =
            weight_deltas.iter().sum::<f64>() / weight_deltas.len() as f64;
    }

    let sweep = promotion::sweep(store, thompson).await?;
    cycle.patterns_updated = sweep.promoted + sweep.demoted;

    if !applied_ids.is_empty() {
        store.mark_feedback_applied(&applied_ids).await?;
    }

    cycle.duration_ms = started.elapsed().as_millis() as u64;
    store.record_cycle(&cycle).await?;
    info!(
        cycle_id = %cycle.cycle_id,
        feedback = cycle.feedback_processed,
        weights_adjusted = cycle.weights_adjusted,
        promoted = sweep.promoted,
        demoted = sweep.demoted,
        duration_ms = cycle.duration_ms,
        "learning cycle complete"
    );

    Ok(CycleOutcome {
        cycle,
        weights,
        threshold_delta,
    })
}

/// Nudge the axiom weights from one feedback/judgment pair.
///
/// Feedback contradicting an approving verdict raises the weight of the
/// judgment's weakest axiom (it saw the problem and was outvoted); feedback
/// contradicting a harsh verdict lowers it. Confirming feedback relaxes all
/// weights toward 1.0. Returns the absolute delta applied, if any.
fn adjust_weights(
    weights: &mut AxiomWeights,
    judgment: &Judgment,
    feedback: &Feedback,
) -> Option<f64> {
    let weakest = judgment
        .axiom_scores
        .iter()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(&axiom, _)| axiom)?;

    let approving = matches!(judgment.verdict, Verdict::Howl | Verdict::Wag);
    match feedback.outcome {
        FeedbackOutcome::Incorrect if approving => {
            let before = weights.get(weakest);
            weights.set(weakest, before + WEIGHT_STEP);
            Some((weights.get(weakest) - before).abs())
        }
        FeedbackOutcome::Incorrect => {
            let before = weights.get(weakest);
            weights.set(weakest, before - WEIGHT_STEP);
            Some((weights.get(weakest) - before).abs())
        }
        FeedbackOutcome::Correct => {
            let mut total_delta = 0.0;
            for axiom in Axiom::ALL {
                let before = weights.get(axiom);
                let relaxed = before + (1.0 - before) * WEIGHT_RELAXATION;
                weights.set(axiom, relaxed);
                total_delta += (relaxed - before).abs();
            }
            Some(total_delta / Axiom::ALL.len() as f64)
        }
        FeedbackOutcome::Partial => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn judgment_with(verdict: Verdict, weakest: Axiom) -> Judgment {
        let mut axiom_scores: BTreeMap<Axiom, f64> =
            Axiom::ALL.iter().map(|&a| (a, 70.0)).collect();
        axiom_scores.insert(weakest, 20.0);
        Judgment {
            judgment_id: "jdg_t".into(),
            user_id: None,
            session_id: None,
            item_type: "Bash".into(),
            item_content: "x".into(),
            item_hash: "h".into(),
            q_score: 57.5,
            confidence: 0.5,
            verdict,
            axiom_scores,
            dimension_scores: BTreeMap::new(),
            weaknesses: vec![],
            context: serde_json::Value::Null,
            block_hash: None,
            block_number: None,
            prev_hash: None,
            refinement: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_false_positive_raises_weakest_axiom() {
        let mut weights = AxiomWeights::default();
        let judgment = judgment_with(Verdict::Wag, Axiom::Verify);
        let feedback = Feedback::explicit(Some("jdg_t".into()), FeedbackOutcome::Incorrect);
        let delta = adjust_weights(&mut weights, &judgment, &feedback);
        assert!(delta.is_some());
        assert!(weights.get(Axiom::Verify) > 1.0);
    }

    #[test]
    fn test_false_negative_lowers_weakest_axiom() {
        let mut weights = AxiomWeights::default();
        let judgment = judgment_with(Verdict::Bark, Axiom::Burn);
        let feedback = Feedback::explicit(Some("jdg_t".into()), FeedbackOutcome::Incorrect);
        adjust_weights(&mut weights, &judgment, &feedback);
        assert!(weights.get(Axiom::Burn) < 1.0);
    }

    #[test]
    fn test_weights_stay_bounded() {
        let mut weights = AxiomWeights::default();
        let judgment = judgment_with(Verdict::Wag, Axiom::Phi);
        let feedback = Feedback::explicit(Some("jdg_t".into()), FeedbackOutcome::Incorrect);
        for _ in 0..50 {
            adjust_weights(&mut weights, &judgment, &feedback);
        }
        assert!(weights.get(Axiom::Phi) <= 1.5);
    }

    #[test]
    fn test_partial_feedback_leaves_weights() {
        let mut weights = AxiomWeights::default();
        let judgment = judgment_with(Verdict::Wag, Axiom::Phi);
        let feedback = Feedback::explicit(Some("jdg_t".into()), FeedbackOutcome::Partial);
        assert!(adjust_weights(&mut weights, &judgment, &feedback).is_none());
        assert_eq!(weights, AxiomWeights::default());
    }
}
