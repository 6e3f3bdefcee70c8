//! Judgments, verdicts, and the four axioms

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{phi, verdicts};

/// The four scoring lenses composing the Q-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axiom {
    /// Ratio and harmony; caps confidence at φ⁻¹
    Phi,
    /// Falsifiability and testing
    Verify,
    /// Pattern and consistency
    Culture,
    /// Simplicity, the inverse of sprawl
    Burn,
}

impl Axiom {
    /// All axioms in canonical order
    pub const ALL: [Axiom; 4] = [Axiom::Phi, Axiom::Verify, Axiom::Culture, Axiom::Burn];

    pub fn as_str(self) -> &'static str {
        match self {
            Axiom::Phi => "PHI",
            Axiom::Verify => "VERIFY",
            Axiom::Culture => "CULTURE",
            Axiom::Burn => "BURN",
        }
    }
}

/// Categorical judgment outcome, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Approve
    Howl,
    /// Accept with advice
    Wag,
    /// Warn
    Growl,
    /// Block, if the host honors it
    Bark,
}

impl Verdict {
    /// Verdict is a total function of the Q-score. Boundary values take the
    /// better band (equal Q prefers the lower-severity verdict).
    pub fn from_q_score(q: f64) -> Self {
        if q >= verdicts::HOWL_THRESHOLD {
            Verdict::Howl
        } else if q >= verdicts::WAG_THRESHOLD {
            Verdict::Wag
        } else if q >= verdicts::GROWL_THRESHOLD {
            Verdict::Growl
        } else {
            Verdict::Bark
        }
    }

    /// One step harsher (used when self-judgment finds a critical risk)
    pub fn harden(self) -> Self {
        match self {
            Verdict::Howl => Verdict::Wag,
            Verdict::Wag => Verdict::Growl,
            Verdict::Growl | Verdict::Bark => Verdict::Bark,
        }
    }

    /// Whether this verdict asks the host to block the tool call
    pub fn is_blocking(self) -> bool {
        matches!(self, Verdict::Bark)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Howl => "HOWL",
            Verdict::Wag => "WAG",
            Verdict::Growl => "GROWL",
            Verdict::Bark => "BARK",
        }
    }
}

/// Record of a self-refinement pass over a judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    /// Q-score before refinement
    pub original_q: f64,
    /// Q-score after refinement
    pub final_q: f64,
    /// `final_q - original_q`, strictly positive when a rescore was accepted
    pub improvement: f64,
    /// Iterations actually run (≤ 2)
    pub iterations: u32,
}

/// An immutable judgment over one observation.
///
/// Created by the Judge; the Chain later fills `block_hash`, `block_number`
/// and `prev_hash` when the judgment is sealed into a block. No other field
/// changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    /// Short prefixed id (`jdg_…`)
    pub judgment_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// What kind of item was judged (tool name or event kind)
    pub item_type: String,
    /// Canonical content text the scores were computed over
    pub item_content: String,
    /// SHA-256 of `item_content`; dedup equivalence class
    pub item_hash: String,
    /// Quality score in [0, 100]
    pub q_score: f64,
    /// Confidence in [0, φ⁻¹]
    pub confidence: f64,
    pub verdict: Verdict,
    /// Per-axiom scores in [0, 100]
    pub axiom_scores: BTreeMap<Axiom, f64>,
    /// Per-dimension scores in [0, 100]; empty for REFLEX judgments
    #[serde(default)]
    pub dimension_scores: BTreeMap<String, f64>,
    /// Ordered list of detected weaknesses, worst first
    #[serde(default)]
    pub weaknesses: Vec<String>,
    /// Free mapping of contextual details
    #[serde(default)]
    pub context: serde_json::Value,
    /// Set by the Chain when sealed
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<i64>,
    #[serde(default)]
    pub prev_hash: Option<String>,
    /// Present when a self-refinement pass ran
    #[serde(default)]
    pub refinement: Option<Refinement>,
    pub created_at: DateTime<Utc>,
}

impl Judgment {
    /// Clamp confidence to the global cap. Every constructor path goes
    /// through this; the invariant `confidence ≤ 0.618` holds everywhere.
    pub fn cap_confidence(raw: f64) -> f64 {
        raw.clamp(0.0, phi::MAX_CONFIDENCE)
    }

    /// Whether this judgment is an orphan (accepted but not yet sealed)
    pub fn is_orphan(&self) -> bool {
        self.block_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_boundaries() {
        // S1 seed values
        assert_eq!(Verdict::from_q_score(70.0), Verdict::Howl);
        assert_eq!(Verdict::from_q_score(57.5), Verdict::Wag);
        assert_eq!(Verdict::from_q_score(25.0), Verdict::Bark);
        // Exact thresholds take the better band
        assert_eq!(Verdict::from_q_score(verdicts::HOWL_THRESHOLD), Verdict::Howl);
        assert_eq!(Verdict::from_q_score(45.0), Verdict::Wag);
        assert_eq!(Verdict::from_q_score(30.0), Verdict::Growl);
        assert_eq!(Verdict::from_q_score(29.999), Verdict::Bark);
    }

    #[test]
    fn test_harden_saturates_at_bark() {
        assert_eq!(Verdict::Howl.harden(), Verdict::Wag);
        assert_eq!(Verdict::Bark.harden(), Verdict::Bark);
    }

    #[test]
    fn test_confidence_cap() {
        assert_eq!(Judgment::cap_confidence(0.9), phi::MAX_CONFIDENCE);
        assert_eq!(Judgment::cap_confidence(-0.1), 0.0);
        assert!((Judgment::cap_confidence(0.5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_axiom_scores_serialize_as_string_keys() {
        let mut scores = BTreeMap::new();
        scores.insert(Axiom::Phi, 70.0);
        scores.insert(Axiom::Burn, 55.0);
        let json = serde_json::to_value(&scores).expect("serializes");
        assert_eq!(json["PHI"], 70.0);
        assert_eq!(json["BURN"], 55.0);
    }
}
