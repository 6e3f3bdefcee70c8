//! # Multi-axiom Judge
//!
//! Scores observations through the four axioms (PHI, VERIFY, CULTURE,
//! BURN), optionally the 25-dimension pass, and emits an immutable
//! [`Judgment`] with Q-score, verdict and capped confidence.
//!
//! The Judge is total: it never surfaces an error to its caller. Failed
//! axiom scorers become `failed_axiom:<name>` weaknesses with reduced
//! confidence; the judgment is always produced.

pub mod axioms;
pub mod dimensions;
pub mod metrics;
pub mod refine;
pub mod self_judgment;

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::ids::{item_hash, prefix, short_id};
use crate::types::{Axiom, Judgment, JudgmentLevel, Observation, Verdict};

pub use axioms::AxiomWeights;

/// Confidence multiplier applied once per failed axiom
const FAILED_AXIOM_CONFIDENCE_PENALTY: f64 = 0.5;

/// Neutral stand-in score for an axiom that failed to score
const FAILED_AXIOM_SCORE: f64 = 50.0;

/// Dimension score below which a dimension is listed as a weakness
const WEAKNESS_CUTOFF: f64 = 40.0;

/// Maximum dimension weaknesses reported per judgment
const MAX_WEAKNESSES: usize = 5;

/// The judgment engine. Weight modifiers are updated by the Harmonic Loop
/// between judgments; scoring itself is pure and never suspends.
pub struct Judge {
    weights: RwLock<AxiomWeights>,
    refinement_enabled: bool,
}

impl Default for Judge {
    fn default() -> Self {
        Self::new()
    }
}

impl Judge {
    pub fn new() -> Self {
        Self {
            weights: RwLock::new(AxiomWeights::default()),
            refinement_enabled: true,
        }
    }

    /// Current per-axiom weight modifiers
    pub fn weights(&self) -> AxiomWeights {
        self.weights.read().clone()
    }

    /// Replace the weight modifiers (harmonic cycle output)
    pub fn set_weights(&self, weights: AxiomWeights) {
        *self.weights.write() = weights;
    }

    /// Judge one observation. Never fails.
    pub fn judge(&self, obs: &Observation) -> Judgment {
        let content = obs.content();
        let m = metrics::analyze(&content);
        let weights = self.weights();

        let mut weaknesses = Vec::new();
        let mut failed_axioms = 0u32;
        let mut axiom_scores: BTreeMap<Axiom, f64> = BTreeMap::new();
        for axiom in Axiom::ALL {
            match axioms::score_axiom(axiom, obs, &m) {
                Ok(score) => {
                    axiom_scores.insert(axiom, score);
                }
                Err(err) => {
                    warn!(axiom = axiom.as_str(), %err, "axiom scorer failed");
                    weaknesses.push(format!("failed_axiom:{}", axiom.as_str()));
                    axiom_scores.insert(axiom, FAILED_AXIOM_SCORE);
                    failed_axioms += 1;
                }
            }
        }

        let is_self_mod = self_judgment::is_self_modification(obs);
        let run_dimensions =
            is_self_mod || !matches!(obs.level, JudgmentLevel::Reflex);

        let mut refinement = None;
        let mut q = refine::weighted_q(&axiom_scores, &weights);
        if self.refinement_enabled
            && !matches!(obs.level, JudgmentLevel::Reflex)
            && (q < refine::REFINE_BELOW_Q || Verdict::from_q_score(q) >= Verdict::Growl)
        {
            refinement = refine::refine(obs, &mut axiom_scores, &weights);
            q = refine::weighted_q(&axiom_scores, &weights);
        }

        let dimension_scores = if run_dimensions {
            let scores = dimensions::score_dimensions(&m, &axiom_scores);
            weaknesses.extend(dimensions::weakest_dimensions(
                &scores,
                WEAKNESS_CUTOFF,
                MAX_WEAKNESSES,
            ));
            scores
        } else {
            BTreeMap::new()
        };

        let mut verdict = Verdict::from_q_score(q);
        let mut context = serde_json::Map::new();
        if is_self_mod {
            let risks = self_judgment::scan_risks(obs);
            let critical = risks.iter().any(|r| r.critical);
            for risk in &risks {
                weaknesses.push(format!("risk:{:?}", risk.kind));
            }
            if let Ok(value) = serde_json::to_value(&risks) {
                context.insert("self_risks".to_string(), value);
            }
            context.insert("self_judgment".to_string(), serde_json::Value::Bool(true));
            if critical {
                verdict = verdict.harden();
            }
        }

        let mean_axiom = axiom_scores.values().sum::<f64>() / axiom_scores.len() as f64;
        let mut confidence = Judgment::cap_confidence(mean_axiom / 100.0);
        for _ in 0..failed_axioms {
            confidence *= FAILED_AXIOM_CONFIDENCE_PENALTY;
        }

        debug!(
            q_score = q,
            verdict = verdict.as_str(),
            confidence,
            failed_axioms,
            self_modification = is_self_mod,
            "judgment complete"
        );

        Judgment {
            judgment_id: short_id(prefix::JUDGMENT),
            user_id: obs.user_id.clone(),
            session_id: obs.session_id.clone(),
            item_type: item_type_of(obs),
            item_hash: item_hash(&content),
            item_content: content,
            q_score: q,
            confidence,
            verdict,
            axiom_scores,
            dimension_scores,
            weaknesses,
            context: serde_json::Value::Object(context),
            block_hash: None,
            block_number: None,
            prev_hash: None,
            refinement,
            created_at: chrono::Utc::now(),
        }
    }

    /// Low-confidence judgment produced when scoring was cancelled mid-way
    /// (per-call timeout). Tagged `partial`; never persisted.
    pub fn partial_judgment(&self, obs: &Observation) -> Judgment {
        let content = obs.content();
        let mut judgment = Judgment {
            judgment_id: short_id(prefix::JUDGMENT),
            user_id: obs.user_id.clone(),
            session_id: obs.session_id.clone(),
            item_type: item_type_of(obs),
            item_hash: item_hash(&content),
            item_content: content,
            q_score: 50.0,
            confidence: 0.05,
            verdict: Verdict::Wag,
            axiom_scores: BTreeMap::new(),
            dimension_scores: BTreeMap::new(),
            weaknesses: vec!["partial".to_string()],
            context: serde_json::json!({"partial": true}),
            block_hash: None,
            block_number: None,
            prev_hash: None,
            refinement: None,
            created_at: chrono::Utc::now(),
        };
        judgment.confidence = Judgment::cap_confidence(judgment.confidence);
        judgment
    }
}

fn item_type_of(obs: &Observation) -> String {
    let tool = obs.tool_name();
    if tool.is_empty() {
        format!("{:?}", obs.source)
    } else {
        tool.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::phi;
    use crate::types::{HookEventKind, Reality};
    use serde_json::json;

    fn obs(level: JudgmentLevel, data: serde_json::Value) -> Observation {
        Observation {
            source: HookEventKind::PostToolUse,
            reality: Reality::Code,
            data,
            context: String::new(),
            run_judgment: true,
            level,
            session_id: Some("ses_test".to_string()),
            user_id: None,
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_judge_never_fails_on_empty_content() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(JudgmentLevel::Reflex, json!({"content": ""})));
        assert_eq!(judgment.weaknesses.iter().filter(|w| w.starts_with("failed_axiom:")).count(), 4);
        assert!(judgment.confidence < 0.1, "confidence collapsed after 4 failures");
    }

    #[test]
    fn test_confidence_always_capped() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({"tool_name": "Edit", "content": "#[test]\nfn test_ok() { assert!(true); }"}),
        ));
        assert!(judgment.confidence <= phi::MAX_CONFIDENCE);
        assert!(judgment.q_score >= 0.0 && judgment.q_score <= 100.0);
    }

    #[test]
    fn test_reflex_skips_dimensions() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({"tool_name": "Bash", "content": "ls"}),
        ));
        assert!(judgment.dimension_scores.is_empty());
    }

    #[test]
    fn test_reflect_runs_dimensions() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(
            JudgmentLevel::Reflect,
            json!({"tool_name": "Bash", "content": "ls"}),
        ));
        assert_eq!(judgment.dimension_scores.len(), 25);
    }

    #[test]
    fn test_self_modification_always_runs_dimensions() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({
                "tool_name": "Edit",
                "file_path": "cynic-core/src/chain/mod.rs",
                "content": "let block_hash = sha256(prev_hash);",
            }),
        ));
        assert_eq!(judgment.dimension_scores.len(), 25);
        assert!(judgment.context["self_judgment"].as_bool().unwrap_or(false));
        assert!(judgment.weaknesses.iter().any(|w| w.starts_with("risk:")));
    }

    #[test]
    fn test_critical_risk_hardens_verdict() {
        let judge = Judge::new();
        let content = "fn seal() { let block_hash = h(prev_hash); } // merkle update";
        let plain = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({"tool_name": "Edit", "content": content}),
        ));
        let self_mod = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({
                "tool_name": "Edit",
                "file_path": "cynic-core/src/chain/mod.rs",
                "content": content,
            }),
        ));
        assert_eq!(self_mod.verdict, plain.verdict.harden());
    }

    #[test]
    fn test_item_hash_matches_content() {
        let judge = Judge::new();
        let judgment = judge.judge(&obs(
            JudgmentLevel::Reflex,
            json!({"tool_name": "Bash", "content": "echo hi"}),
        ));
        assert_eq!(judgment.item_hash, crate::ids::item_hash("echo hi"));
    }

    #[test]
    fn test_partial_judgment_is_tagged() {
        let judge = Judge::new();
        let judgment = judge.partial_judgment(&obs(JudgmentLevel::Reflex, json!({"content": "x"})));
        assert!(judgment.weaknesses.contains(&"partial".to_string()));
        assert!(judgment.confidence <= 0.05);
    }
}
