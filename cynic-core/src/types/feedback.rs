//! Unified feedback schema
//!
//! The single Feedback shape covers explicit ratings, implicit
//! observations, and self-judge signals. `judgment_id` is optional so
//! orphan feedback (no judgment to attach to) is representable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::{prefix, short_id};

/// Outcome of a judged suggestion as reported by feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Correct,
    Incorrect,
    Partial,
}

impl FeedbackOutcome {
    /// Map a 1–5 star rating onto an outcome
    pub fn from_rating(rating: u8) -> Result<Self> {
        match rating {
            1 | 2 => Ok(FeedbackOutcome::Incorrect),
            3 => Ok(FeedbackOutcome::Partial),
            4 | 5 => Ok(FeedbackOutcome::Correct),
            other => Err(Error::Validation(format!(
                "rating must be 1-5, got {other}"
            ))),
        }
    }

    /// Signed unit sentiment: +1 correct, −1 incorrect, 0 partial
    pub fn sentiment(self) -> f64 {
        match self {
            FeedbackOutcome::Correct => 1.0,
            FeedbackOutcome::Incorrect => -1.0,
            FeedbackOutcome::Partial => 0.0,
        }
    }
}

/// Where a feedback signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    /// User-provided rating or correction
    Explicit,
    /// Inferred from the user's next action (followed/opposite/ignored)
    Implicit,
    /// The kernel scoring its own output
    SelfJudge,
}

/// One feedback event, queued unapplied until a learning cycle consumes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Short prefixed id (`fbk_…`)
    pub feedback_id: String,
    /// Judgment this feedback refers to; orphan feedback allowed
    #[serde(default)]
    pub judgment_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub outcome: FeedbackOutcome,
    /// Original 1–5 rating when the feedback arrived as one
    #[serde(default)]
    pub rating: Option<u8>,
    /// Corrected Q-score the user believes is right
    #[serde(default)]
    pub actual_score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    pub source_type: FeedbackSource,
    /// Detector context for implicit feedback (matched suggestion, action)
    #[serde(default)]
    pub source_context: Option<serde_json::Value>,
    /// Detector confidence in [0, 1]; explicit feedback is 1.0
    pub confidence: f64,
    /// Consumed by a learning cycle yet
    #[serde(default)]
    pub applied: bool,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    /// Explicit feedback from a 1–5 rating
    pub fn from_rating(rating: u8) -> Result<Self> {
        let outcome = FeedbackOutcome::from_rating(rating)?;
        Ok(Self {
            feedback_id: short_id(prefix::FEEDBACK),
            judgment_id: None,
            user_id: None,
            session_id: None,
            outcome,
            rating: Some(rating),
            actual_score: None,
            reason: None,
            source_type: FeedbackSource::Explicit,
            source_context: None,
            confidence: 1.0,
            applied: false,
            created_at: Utc::now(),
        })
    }

    /// Explicit feedback from an outcome report
    pub fn explicit(judgment_id: Option<String>, outcome: FeedbackOutcome) -> Self {
        Self {
            feedback_id: short_id(prefix::FEEDBACK),
            judgment_id,
            user_id: None,
            session_id: None,
            outcome,
            rating: None,
            actual_score: None,
            reason: None,
            source_type: FeedbackSource::Explicit,
            source_context: None,
            confidence: 1.0,
            applied: false,
            created_at: Utc::now(),
        }
    }

    /// Implicit feedback from the follow/oppose/ignore detector
    pub fn implicit(
        judgment_id: Option<String>,
        outcome: FeedbackOutcome,
        confidence: f64,
        source_context: serde_json::Value,
    ) -> Self {
        Self {
            feedback_id: short_id(prefix::FEEDBACK),
            judgment_id,
            user_id: None,
            session_id: None,
            outcome,
            rating: None,
            actual_score: None,
            reason: None,
            source_type: FeedbackSource::Implicit,
            source_context: Some(source_context),
            confidence: confidence.clamp(0.0, 1.0),
            applied: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_to_outcome() {
        assert_eq!(FeedbackOutcome::from_rating(1).unwrap(), FeedbackOutcome::Incorrect);
        assert_eq!(FeedbackOutcome::from_rating(3).unwrap(), FeedbackOutcome::Partial);
        assert_eq!(FeedbackOutcome::from_rating(5).unwrap(), FeedbackOutcome::Correct);
        assert!(FeedbackOutcome::from_rating(0).is_err());
        assert!(FeedbackOutcome::from_rating(6).is_err());
    }

    #[test]
    fn test_orphan_feedback_allowed() {
        let fb = Feedback::from_rating(4).unwrap();
        assert!(fb.judgment_id.is_none());
        assert!(!fb.applied);
        assert_eq!(fb.confidence, 1.0);
    }

    #[test]
    fn test_implicit_confidence_clamped() {
        let fb = Feedback::implicit(None, FeedbackOutcome::Correct, 1.7, serde_json::json!({}));
        assert_eq!(fb.confidence, 1.0);
    }
}
