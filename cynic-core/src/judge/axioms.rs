//! The four axiom scorers
//!
//! Each axiom maps content metrics into a score in [0, 100]. Scorers are
//! fallible: an axiom that cannot score a given item returns an error, which
//! the Judge converts into a `failed_axiom:<name>` weakness with reduced
//! confidence rather than surfacing it to the caller.

use std::collections::BTreeMap;

use crate::constants::phi;
use crate::error::{Error, Result};
use crate::judge::metrics::ContentMetrics;
use crate::types::{Axiom, Observation, Reality};

/// Per-axiom weight modifiers supplied by the Learner, bounded [0.5, 1.5]
#[derive(Debug, Clone, PartialEq)]
pub struct AxiomWeights(pub BTreeMap<Axiom, f64>);

impl Default for AxiomWeights {
    fn default() -> Self {
        Self(Axiom::ALL.iter().map(|&a| (a, 1.0)).collect())
    }
}

impl AxiomWeights {
    pub fn get(&self, axiom: Axiom) -> f64 {
        self.0.get(&axiom).copied().unwrap_or(1.0)
    }

    /// Replace one axiom's modifier, clamped to [0.5, 1.5]
    pub fn set(&mut self, axiom: Axiom, modifier: f64) {
        self.0.insert(axiom, modifier.clamp(0.5, 1.5));
    }
}

/// Score one axiom for an observation
pub fn score_axiom(axiom: Axiom, obs: &Observation, m: &ContentMetrics) -> Result<f64> {
    if m.char_count == 0 {
        return Err(Error::Validation(format!(
            "empty content, {} cannot score",
            axiom.as_str()
        )));
    }
    let score = match axiom {
        Axiom::Phi => score_phi(m),
        Axiom::Verify => score_verify(obs, m),
        Axiom::Culture => score_culture(m),
        Axiom::Burn => score_burn(m),
    };
    Ok(score.clamp(0.0, 100.0))
}

/// PHI: ratio and harmony. Rewards balanced line lengths, moderate
/// comment ratio near φ⁻², and restrained shape variance.
fn score_phi(m: &ContentMetrics) -> f64 {
    let mut score = 55.0;

    // Line length balance: stddev relative to mean, lower is more harmonic
    if m.avg_line_len > 0.0 {
        let cv = m.line_len_stddev / m.avg_line_len;
        score += (1.0 - cv.min(1.5) / 1.5) * 20.0;
    }

    // Comment ratio closest to phi^-2 reads as well-proportioned
    let comment_distance = (m.comment_ratio() - phi::INV_PHI_SQ).abs();
    score += (1.0 - comment_distance.min(0.5) / 0.5) * 15.0;

    // Overlong lines break the proportions
    if m.max_line_len > 120 {
        score -= ((m.max_line_len - 120) as f64 / 10.0).min(15.0);
    }

    score
}

/// VERIFY: falsifiability and testing. Rewards test and error-handling
/// signals; code realities are held to a higher bar than human chatter.
fn score_verify(obs: &Observation, m: &ContentMetrics) -> f64 {
    let mut score = match obs.reality {
        Reality::Code => 35.0,
        Reality::Human | Reality::Cynic => 50.0,
    };

    score += m.test_signal_density() * 40.0;
    score += (m.error_handling_signals as f64 * 5.0).min(20.0);

    // Unverifiable danger: destructive commands with no test signal at all
    if m.danger_signals > 0 && m.test_signals == 0 {
        score -= 25.0;
    }

    score
}

/// CULTURE: pattern and consistency. Rewards uniform naming and
/// indentation; penalizes trailing whitespace and style mixing.
fn score_culture(m: &ContentMetrics) -> f64 {
    let mut score = 40.0;

    score += m.naming_consistency() * 30.0;

    if !m.mixed_indentation {
        score += 15.0;
    }

    if m.line_count > 0 {
        let trailing_ratio = m.trailing_whitespace_lines as f64 / m.line_count as f64;
        score += (1.0 - trailing_ratio) * 15.0;
    } else {
        score += 15.0;
    }

    score
}

/// BURN: simplicity, the inverse of sprawl. Short, flat, deduplicated
/// content burns clean.
fn score_burn(m: &ContentMetrics) -> f64 {
    let mut score: f64 = 100.0;

    // Size penalty ramps from 200 chars up
    if m.char_count > 200 {
        score -= ((m.char_count - 200) as f64 / 60.0).min(30.0);
    }

    // Nesting penalty beyond depth 3
    if m.max_nesting > 3 {
        score -= ((m.max_nesting - 3) as f64 * 7.0).min(28.0);
    }

    // Duplication penalty
    if m.line_count > 0 {
        let dup_ratio = m.duplicate_lines as f64 / m.line_count as f64;
        score -= (dup_ratio * 60.0).min(25.0);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::metrics::analyze;
    use crate::types::{HookEventKind, JudgmentLevel};
    use serde_json::json;

    fn obs(reality: Reality, content: &str) -> (Observation, ContentMetrics) {
        let observation = Observation {
            source: HookEventKind::PostToolUse,
            reality,
            data: json!({"content": content}),
            context: String::new(),
            run_judgment: true,
            level: JudgmentLevel::Reflex,
            session_id: None,
            user_id: None,
            received_at: chrono::Utc::now(),
        };
        let metrics = analyze(content);
        (observation, metrics)
    }

    #[test]
    fn test_all_axioms_bounded() {
        let (observation, m) = obs(Reality::Code, "fn add(a: u32, b: u32) -> u32 { a + b }");
        for axiom in Axiom::ALL {
            let score = score_axiom(axiom, &observation, &m).unwrap();
            assert!((0.0..=100.0).contains(&score), "{axiom:?} out of range: {score}");
        }
    }

    #[test]
    fn test_empty_content_fails_scoring() {
        let (observation, m) = obs(Reality::Code, "");
        assert!(score_axiom(Axiom::Phi, &observation, &m).is_err());
    }

    #[test]
    fn test_verify_rewards_tests() {
        let (plain_obs, plain_m) = obs(Reality::Code, "fn f() { g(); }");
        let (tested_obs, tested_m) =
            obs(Reality::Code, "#[test]\nfn test_f() { assert_eq!(f(), 1); }");
        let plain = score_axiom(Axiom::Verify, &plain_obs, &plain_m).unwrap();
        let tested = score_axiom(Axiom::Verify, &tested_obs, &tested_m).unwrap();
        assert!(tested > plain);
    }

    #[test]
    fn test_verify_penalizes_untested_danger() {
        let (safe_obs, safe_m) = obs(Reality::Code, "ls -la");
        let (danger_obs, danger_m) = obs(Reality::Code, "sudo rm -rf ./build");
        let safe = score_axiom(Axiom::Verify, &safe_obs, &safe_m).unwrap();
        let danger = score_axiom(Axiom::Verify, &danger_obs, &danger_m).unwrap();
        assert!(danger < safe);
    }

    #[test]
    fn test_burn_penalizes_sprawl() {
        let small = "let x = 1;";
        let sprawl = format!("{}\n", "if a { if b { if c { if d { x(); } } } }".repeat(40));
        let (small_obs, small_m) = obs(Reality::Code, small);
        let (sprawl_obs, sprawl_m) = obs(Reality::Code, &sprawl);
        let small_score = score_axiom(Axiom::Burn, &small_obs, &small_m).unwrap();
        let sprawl_score = score_axiom(Axiom::Burn, &sprawl_obs, &sprawl_m).unwrap();
        assert!(small_score > sprawl_score);
    }

    #[test]
    fn test_weights_clamped() {
        let mut weights = AxiomWeights::default();
        weights.set(Axiom::Phi, 3.0);
        assert!((weights.get(Axiom::Phi) - 1.5).abs() < f64::EPSILON);
        weights.set(Axiom::Burn, 0.1);
        assert!((weights.get(Axiom::Burn) - 0.5).abs() < f64::EPSILON);
    }
}
