//! Durable facts injected into session context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{prefix, short_id};

/// A remembered fact about the user or their projects.
///
/// Retrieval score is `relevance × confidence`; access bumps relevance,
/// lack of access lets it age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Short prefixed id (`fct_…`)
    pub fact_id: String,
    pub user_id: String,
    /// Category (preference, project, environment, habit, ...)
    pub fact_type: String,
    /// What the fact is about
    pub subject: String,
    pub content: String,
    /// Extractor confidence in [0, 1]
    pub confidence: f64,
    /// Current retrieval relevance in [0, 1]
    pub relevance: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub access_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Fact {
    pub fn new(
        user_id: impl Into<String>,
        fact_type: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            fact_id: short_id(prefix::FACT),
            user_id: user_id.into(),
            fact_type: fact_type.into(),
            subject: subject.into(),
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            relevance: 1.0,
            tags: Vec::new(),
            access_count: 0,
            created_at: Utc::now(),
            last_accessed_at: None,
        }
    }

    /// Ranking score for injection and search
    pub fn retrieval_score(&self) -> f64 {
        self.relevance * self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_score() {
        let mut fact = Fact::new("usr_1", "preference", "editor", "prefers rebase over merge", 0.8);
        assert!((fact.retrieval_score() - 0.8).abs() < 1e-9);
        fact.relevance = 0.5;
        assert!((fact.retrieval_score() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_clamped_on_construction() {
        let fact = Fact::new("usr_1", "habit", "tests", "runs tests before commit", 1.4);
        assert!((fact.confidence - 1.0).abs() < f64::EPSILON);
    }
}
