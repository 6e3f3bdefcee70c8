//! Learned patterns and their promotion to heuristics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, phi};
use crate::ids::{prefix, short_id};

/// Direction of a pattern's confidence trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

impl TrendDirection {
    /// Classify a confidence velocity (Δconfidence per hour)
    pub fn from_velocity(velocity: f64) -> Self {
        if velocity > 0.001 {
            TrendDirection::Up
        } else if velocity < -0.001 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}

/// A recurring observation, upserted on every match.
///
/// `(pattern_type, pattern_key)` is unique. Confidence merges monotonically
/// as max, capped at φ⁻¹. A pattern with `merged_at` set has been absorbed
/// into another pattern and is excluded from active queries. A pattern with
/// `promoted_at` set is a heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Short prefixed id (`pat_…`)
    pub pattern_id: String,
    pub pattern_type: String,
    pub pattern_key: String,
    pub occurrence_count: i64,
    /// Confidence in [0, φ⁻¹]
    pub confidence: f64,
    /// Strength in [0, 100]
    pub strength: f64,
    /// Per-axiom weight modulation carried into the Judge, bounded [0.5, 1.5]
    pub weight_modifier: f64,
    /// Verdict threshold shift, bounded ±10
    pub threshold_delta: f64,
    pub trend_direction: TrendDirection,
    /// Δconfidence per hour at last update
    pub trend_velocity: f64,
    /// Set when absorbed into another pattern
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Patterns absorbed into this one
    #[serde(default)]
    pub parent_ids: Option<Vec<String>>,
    /// Set when promoted to a heuristic
    #[serde(default)]
    pub promoted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    /// A fresh pattern from its first observation
    pub fn new(pattern_type: impl Into<String>, pattern_key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            pattern_id: short_id(prefix::PATTERN),
            pattern_type: pattern_type.into(),
            pattern_key: pattern_key.into(),
            occurrence_count: 1,
            confidence: 0.1,
            strength: 10.0,
            weight_modifier: 1.0,
            threshold_delta: 0.0,
            trend_direction: TrendDirection::Stable,
            trend_velocity: 0.0,
            merged_at: None,
            parent_ids: None,
            promoted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a new confidence observation: monotonic max, capped at φ⁻¹
    pub fn merge_confidence(&mut self, observed: f64) {
        self.confidence = self
            .confidence
            .max(observed)
            .clamp(0.0, phi::MAX_CONFIDENCE);
    }

    /// Whether this pattern is visible to active queries
    pub fn is_active(&self) -> bool {
        self.merged_at.is_none()
    }

    /// Whether this pattern has been promoted to a heuristic
    pub fn is_heuristic(&self) -> bool {
        self.promoted_at.is_some()
    }

    /// Promotion gate: confident, frequent, and its arm performs at φ⁻¹
    pub fn meets_promotion_bar(&self, arm_outcome_ratio: f64) -> bool {
        self.confidence >= defaults::PROMOTION_MIN_CONFIDENCE
            && self.occurrence_count >= defaults::PROMOTION_MIN_OCCURRENCES
            && arm_outcome_ratio >= phi::INV_PHI
    }

    /// Demotion gate: the arm fell below φ⁻²
    pub fn meets_demotion_bar(&self, arm_outcome_ratio: f64) -> bool {
        self.is_heuristic() && arm_outcome_ratio < phi::INV_PHI_SQ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_merges_as_max_capped() {
        let mut p = Pattern::new("tool_sequence", "bash>edit");
        p.confidence = 0.4;
        p.merge_confidence(0.3);
        assert!((p.confidence - 0.4).abs() < f64::EPSILON, "never lowers");
        p.merge_confidence(0.9);
        assert!((p.confidence - phi::MAX_CONFIDENCE).abs() < f64::EPSILON, "capped at phi^-1");
    }

    #[test]
    fn test_promotion_bar() {
        let mut p = Pattern::new("heuristic", "prefer-small-diffs");
        p.confidence = 0.55;
        p.occurrence_count = 13;
        assert!(p.meets_promotion_bar(0.7));
        assert!(!p.meets_promotion_bar(0.5), "arm ratio below phi^-1");
        p.occurrence_count = 12;
        assert!(!p.meets_promotion_bar(0.7), "too few occurrences");
    }

    #[test]
    fn test_demotion_requires_heuristic() {
        let mut p = Pattern::new("heuristic", "x");
        assert!(!p.meets_demotion_bar(0.1), "unpromoted patterns cannot demote");
        p.promoted_at = Some(Utc::now());
        assert!(p.meets_demotion_bar(0.1));
        assert!(!p.meets_demotion_bar(0.5));
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(TrendDirection::from_velocity(0.01), TrendDirection::Up);
        assert_eq!(TrendDirection::from_velocity(-0.01), TrendDirection::Down);
        assert_eq!(TrendDirection::from_velocity(0.0), TrendDirection::Stable);
    }
}
