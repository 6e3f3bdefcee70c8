//! Reward composition
//!
//! The scalar reward mixes the self-judge score, explicit and implicit
//! feedback, an execution-time penalty, and a small bonus for honored guard
//! blocks. The components and their ranges come from the judgment loop;
//! the exact coefficients are fixed here and documented in DESIGN.md.

use serde::{Deserialize, Serialize};

use crate::types::FeedbackOutcome;

/// Execution time at which the penalty saturates
const TIME_PENALTY_SATURATION_MS: f64 = 10_000.0;

/// Maximum execution-time penalty
const TIME_PENALTY_MAX: f64 = 0.3;

/// Bonus for a BARK the host actually honored
const GUARD_BLOCK_BONUS: f64 = 0.2;

/// Weight of implicit feedback relative to explicit
const IMPLICIT_WEIGHT: f64 = 0.5;

/// Bounds of the composed reward
const REWARD_MIN: f64 = -2.0;
const REWARD_MAX: f64 = 2.0;

/// Everything that can contribute to one reward scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RewardComponents {
    /// Self-judge Q-score in [0, 100]; normalized to [−1, 1]
    pub q_score: Option<f64>,
    /// Explicit feedback outcome (±1, partial = 0)
    pub explicit: Option<FeedbackOutcome>,
    /// Implicit feedback outcome with detector confidence
    pub implicit: Option<(FeedbackOutcome, f64)>,
    /// Tool execution time reported by the host
    pub execution_ms: Option<u64>,
    /// A BARK verdict the guard actually enforced
    pub guard_blocked: bool,
}

impl RewardComponents {
    /// Compose into one scalar, clamped to [−2, 2]
    pub fn compose(&self) -> f64 {
        let mut reward = 0.0;

        if let Some(q) = self.q_score {
            // [0,100] → [−1,1]
            reward += (q.clamp(0.0, 100.0) / 50.0) - 1.0;
        }

        if let Some(outcome) = self.explicit {
            reward += outcome.sentiment();
        }

        if let Some((outcome, confidence)) = self.implicit {
            reward += outcome.sentiment() * IMPLICIT_WEIGHT * confidence.clamp(0.0, 1.0);
        }

        if let Some(ms) = self.execution_ms {
            reward -= (ms as f64 / TIME_PENALTY_SATURATION_MS).min(1.0) * TIME_PENALTY_MAX;
        }

        if self.guard_blocked {
            reward += GUARD_BLOCK_BONUS;
        }

        reward.clamp(REWARD_MIN, REWARD_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_judge_normalization() {
        let perfect = RewardComponents {
            q_score: Some(100.0),
            ..Default::default()
        };
        assert!((perfect.compose() - 1.0).abs() < 1e-9);

        let neutral = RewardComponents {
            q_score: Some(50.0),
            ..Default::default()
        };
        assert!(neutral.compose().abs() < 1e-9);

        let worst = RewardComponents {
            q_score: Some(0.0),
            ..Default::default()
        };
        assert!((worst.compose() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_feedback_sign() {
        let positive = RewardComponents {
            explicit: Some(FeedbackOutcome::Correct),
            ..Default::default()
        };
        assert!((positive.compose() - 1.0).abs() < 1e-9);

        let negative = RewardComponents {
            explicit: Some(FeedbackOutcome::Incorrect),
            ..Default::default()
        };
        assert!((negative.compose() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_implicit_scaled_by_confidence() {
        let r = RewardComponents {
            implicit: Some((FeedbackOutcome::Correct, 0.7)),
            ..Default::default()
        };
        assert!((r.compose() - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_time_penalty_saturates() {
        let slow = RewardComponents {
            execution_ms: Some(60_000),
            ..Default::default()
        };
        assert!((slow.compose() + TIME_PENALTY_MAX).abs() < 1e-9);
    }

    #[test]
    fn test_guard_bonus() {
        let r = RewardComponents {
            guard_blocked: true,
            ..Default::default()
        };
        assert!((r.compose() - GUARD_BLOCK_BONUS).abs() < 1e-9);
    }

    #[test]
    fn test_reward_clamped() {
        let max_everything = RewardComponents {
            q_score: Some(100.0),
            explicit: Some(FeedbackOutcome::Correct),
            implicit: Some((FeedbackOutcome::Correct, 1.0)),
            guard_blocked: true,
            ..Default::default()
        };
        assert!(max_everything.compose() <= REWARD_MAX);
        assert!((max_everything.compose() - REWARD_MAX).abs() < 1.0);
    }
}
