//! Per-user learning profiles and experience levels

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// How seasoned a user's kernel is, by accumulated sessions.
///
/// Higher levels compress injected context: identity and axiom banner
/// blocks are omitted and fact/reflection injection limits shrink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    New,
    Learning,
    Experienced,
    Expert,
}

impl ExperienceLevel {
    /// `new < learning (≥1) < experienced (≥10) < expert (≥50)`
    pub fn from_session_count(sessions: i64) -> Self {
        if sessions >= 50 {
            ExperienceLevel::Expert
        } else if sessions >= 10 {
            ExperienceLevel::Experienced
        } else if sessions >= 1 {
            ExperienceLevel::Learning
        } else {
            ExperienceLevel::New
        }
    }

    fn index(self) -> usize {
        match self {
            ExperienceLevel::New => 0,
            ExperienceLevel::Learning => 1,
            ExperienceLevel::Experienced => 2,
            ExperienceLevel::Expert => 3,
        }
    }

    /// Max facts injected into the session banner at this level
    pub fn fact_limit(self) -> usize {
        defaults::FACT_LIMITS[self.index()]
    }

    /// Max reflections injected at this level
    pub fn reflection_limit(self) -> usize {
        defaults::REFLECTION_LIMITS[self.index()]
    }

    /// Whether identity and axiom blocks still appear in the banner
    pub fn injects_identity(self) -> bool {
        matches!(self, ExperienceLevel::New | ExperienceLevel::Learning)
    }
}

/// Hour-of-day and item-type histograms of a user's judgments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JudgmentHistograms {
    /// Judgments per hour of day (0–23)
    pub by_hour: Vec<u32>,
    /// Judgments per item type
    pub by_type: BTreeMap<String, u32>,
}

impl JudgmentHistograms {
    pub fn record(&mut self, hour: u32, item_type: &str) {
        if self.by_hour.len() != 24 {
            self.by_hour = vec![0; 24];
        }
        if let Some(slot) = self.by_hour.get_mut(hour as usize % 24) {
            *slot += 1;
        }
        *self.by_type.entry(item_type.to_string()).or_insert(0) += 1;
    }
}

/// Durable per-user learning state.
///
/// Counters are monotonic; `learning_rate` is clamped to [0.1, 0.382] on
/// every write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLearningProfile {
    pub user_id: String,
    /// TD(0) step size α, clamped to [0.1, φ⁻²]
    pub learning_rate: f64,
    pub session_count: i64,
    pub judgment_count: i64,
    pub feedback_count: i64,
    /// Dimensions the user's feedback weights most
    #[serde(default)]
    pub preferred_dimensions: Vec<String>,
    #[serde(default)]
    pub judgment_patterns: JudgmentHistograms,
    /// Mean signed sentiment of this user's explicit feedback
    pub feedback_bias: f64,
    /// Correlation between e-score moves and feedback sentiment
    pub escore_feedback_correlation: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserLearningProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            learning_rate: 0.2,
            session_count: 0,
            judgment_count: 0,
            feedback_count: 0,
            preferred_dimensions: Vec::new(),
            judgment_patterns: JudgmentHistograms::default(),
            feedback_bias: 0.0,
            escore_feedback_correlation: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clamp a learning rate into the legal band
    pub fn clamp_learning_rate(raw: f64) -> f64 {
        raw.clamp(defaults::LEARNING_RATE_MIN, defaults::LEARNING_RATE_MAX)
    }

    pub fn experience_level(&self) -> ExperienceLevel {
        ExperienceLevel::from_session_count(self.session_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_thresholds() {
        assert_eq!(ExperienceLevel::from_session_count(0), ExperienceLevel::New);
        assert_eq!(ExperienceLevel::from_session_count(1), ExperienceLevel::Learning);
        assert_eq!(ExperienceLevel::from_session_count(9), ExperienceLevel::Learning);
        assert_eq!(ExperienceLevel::from_session_count(10), ExperienceLevel::Experienced);
        assert_eq!(ExperienceLevel::from_session_count(12), ExperienceLevel::Experienced);
        assert_eq!(ExperienceLevel::from_session_count(50), ExperienceLevel::Expert);
    }

    #[test]
    fn test_injection_limits_shrink() {
        assert_eq!(ExperienceLevel::New.fact_limit(), 50);
        assert_eq!(ExperienceLevel::Learning.fact_limit(), 30);
        assert_eq!(ExperienceLevel::Experienced.fact_limit(), 15);
        assert_eq!(ExperienceLevel::Expert.fact_limit(), 5);
        assert_eq!(ExperienceLevel::Expert.reflection_limit(), 1);
        assert!(ExperienceLevel::New.injects_identity());
        assert!(!ExperienceLevel::Experienced.injects_identity());
    }

    #[test]
    fn test_learning_rate_clamp() {
        assert_eq!(UserLearningProfile::clamp_learning_rate(0.05), 0.1);
        assert!(UserLearningProfile::clamp_learning_rate(0.9) <= 0.382);
        let mid = UserLearningProfile::clamp_learning_rate(0.25);
        assert!((mid - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_records() {
        let mut hist = JudgmentHistograms::default();
        hist.record(14, "Bash");
        hist.record(14, "Bash");
        hist.record(3, "Edit");
        assert_eq!(hist.by_hour[14], 2);
        assert_eq!(hist.by_hour[3], 1);
        assert_eq!(hist.by_type["Bash"], 2);
    }
}
