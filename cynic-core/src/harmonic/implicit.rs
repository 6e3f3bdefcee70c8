//! Implicit feedback detection
//!
//! The kernel remembers its last N suggestions. When the user's next action
//! arrives, the observer classifies it against the open suggestions:
//! `followed` (acted on the advice), `opposite` (did the thing a block
//! warned against), or `ignored` (the window expired untouched). Each
//! classification maps to a sentiment with a detector confidence.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::defaults;
use crate::types::{Feedback, FeedbackOutcome};

/// Token overlap at or above which an action matches a suggestion
const MATCH_OVERLAP: f64 = 0.5;

/// Detector confidences per classification
const FOLLOWED_CONFIDENCE: f64 = 0.7;
const OPPOSITE_CONFIDENCE: f64 = 0.6;
const IGNORED_CONFIDENCE: f64 = 0.3;

/// One remembered suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub judgment_id: Option<String>,
    /// The advice text shown to the user
    pub advice: String,
    /// Dog that issued it
    pub dog: String,
    /// Whether the suggestion was a block (BARK) rather than advice
    pub blocking: bool,
    pub created_at: DateTime<Utc>,
}

/// How an observed action relates to a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionRelation {
    Followed,
    Opposite,
    Ignored,
}

/// A classified implicit signal, ready to become Feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplicitSignal {
    pub relation: ActionRelation,
    pub outcome: FeedbackOutcome,
    pub confidence: f64,
    pub judgment_id: Option<String>,
    pub dog: String,
    pub matched_advice: String,
}

impl ImplicitSignal {
    /// Convert into the unified feedback shape
    pub fn into_feedback(self) -> Feedback {
        let context = serde_json::json!({
            "relation": self.relation,
            "dog": self.dog,
            "matched_advice": self.matched_advice,
        });
        Feedback::implicit(self.judgment_id, self.outcome, self.confidence, context)
    }
}

/// Sliding window of recent suggestions
pub struct ImplicitObserver {
    window: Mutex<LruCache<u64, Suggestion>>,
    next_key: Mutex<u64>,
    follow_window: chrono::Duration,
}

impl Default for ImplicitObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ImplicitObserver {
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(defaults::SUGGESTION_WINDOW_SIZE)
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            window: Mutex::new(LruCache::new(capacity)),
            next_key: Mutex::new(0),
            follow_window: chrono::Duration::from_std(defaults::IMPLICIT_FOLLOW_WINDOW)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        }
    }

    /// Remember a suggestion the kernel just made
    pub fn record_suggestion(&self, suggestion: Suggestion) {
        let mut key = self.next_key.lock();
        let mut window = self.window.lock();
        window.put(*key, suggestion);
        *key += 1;
    }

    /// Classify an observed user action against the open suggestions.
    ///
    /// A match consumes the suggestion. Expired suggestions found during
    /// the scan are emitted as `ignored` signals.
    pub fn observe_action(&self, action: &str, at: DateTime<Utc>) -> Vec<ImplicitSignal> {
        let mut window = self.window.lock();
        let mut signals = Vec::new();
        let mut consumed = Vec::new();

        for (&key, suggestion) in window.iter() {
            let age = at - suggestion.created_at;
            if age > self.follow_window {
                signals.push(ImplicitSignal {
                    relation: ActionRelation::Ignored,
                    outcome: FeedbackOutcome::Partial,
                    confidence: IGNORED_CONFIDENCE,
                    judgment_id: suggestion.judgment_id.clone(),
                    dog: suggestion.dog.clone(),
                    matched_advice: suggestion.advice.clone(),
                });
                consumed.push(key);
                continue;
            }

            let overlap = token_overlap(&suggestion.advice, action);
            if overlap < MATCH_OVERLAP {
                continue;
            }

            let (relation, outcome, confidence) = if suggestion.blocking {
                // The user did the thing the kernel blocked
                (ActionRelation::Opposite, FeedbackOutcome::Incorrect, OPPOSITE_CONFIDENCE)
            } else {
                (ActionRelation::Followed, FeedbackOutcome::Correct, FOLLOWED_CONFIDENCE)
            };
            debug!(relation = ?relation, overlap, advice = %suggestion.advice, "implicit signal");
            signals.push(ImplicitSignal {
                relation,
                outcome,
                confidence,
                judgment_id: suggestion.judgment_id.clone(),
                dog: suggestion.dog.clone(),
                matched_advice: suggestion.advice.clone(),
            });
            consumed.push(key);
        }

        for key in consumed {
            window.pop(&key);
        }
        signals
    }

    /// Open suggestions still in the window
    pub fn open_suggestions(&self) -> usize {
        self.window.lock().len()
    }
}

/// Fraction of the suggestion's tokens found in the action.
///
/// Tokens are lowercased and singularized; a token matches when equal or
/// when one contains the other (length ≥ 3), so "run tests" matches
/// "Bash: pytest -x".
fn token_overlap(advice: &str, action: &str) -> f64 {
    let advice_tokens = tokens(advice);
    if advice_tokens.is_empty() {
        return 0.0;
    }
    let action_tokens = tokens(action);
    let matched = advice_tokens
        .iter()
        .filter(|advice_token| {
            action_tokens.iter().any(|action_token| {
                advice_token == &action_token
                    || (advice_token.len() >= 3 && action_token.contains(advice_token.as_str()))
                    || (action_token.len() >= 3 && advice_token.contains(action_token.as_str()))
            })
        })
        .count();
    matched as f64 / advice_tokens.len() as f64
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| {
            let lower = t.to_lowercase();
            lower.strip_suffix('s').map_or(lower.clone(), str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(advice: &str, blocking: bool, age_secs: i64) -> Suggestion {
        Suggestion {
            judgment_id: Some("jdg_x".to_string()),
            advice: advice.to_string(),
            dog: "scout".to_string(),
            blocking,
            created_at: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_followed_within_window() {
        // S4: "run tests" followed by `Bash: pytest` within 60 s
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("run tests", false, 10));
        let signals = observer.observe_action("Bash: pytest -x", Utc::now());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].relation, ActionRelation::Followed);
        assert_eq!(signals[0].outcome, FeedbackOutcome::Correct);
        assert!((signals[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_when_block_is_defied() {
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("rm -rf build", true, 5));
        let signals = observer.observe_action("Bash: rm -rf build", Utc::now());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].relation, ActionRelation::Opposite);
        assert_eq!(signals[0].outcome, FeedbackOutcome::Incorrect);
    }

    #[test]
    fn test_expired_suggestion_reads_ignored() {
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("refactor the parser", false, 120));
        let signals = observer.observe_action("Bash: ls", Utc::now());
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].relation, ActionRelation::Ignored);
        assert!((signals[0].confidence - 0.3).abs() < 1e-9);
        assert_eq!(observer.open_suggestions(), 0);
    }

    #[test]
    fn test_unrelated_action_leaves_window_open() {
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("run tests", false, 5));
        let signals = observer.observe_action("Read: src/main.rs", Utc::now());
        assert!(signals.is_empty());
        assert_eq!(observer.open_suggestions(), 1);
    }

    #[test]
    fn test_match_consumes_suggestion() {
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("run tests", false, 5));
        observer.observe_action("pytest", Utc::now());
        // Second identical action finds nothing
        let signals = observer.observe_action("pytest", Utc::now());
        assert!(signals.is_empty());
    }

    #[test]
    fn test_signal_converts_to_feedback() {
        let observer = ImplicitObserver::new();
        observer.record_suggestion(suggestion("run tests", false, 5));
        let signal = observer
            .observe_action("cargo test", Utc::now())
            .pop()
            .unwrap();
        let feedback = signal.into_feedback();
        assert_eq!(feedback.outcome, FeedbackOutcome::Correct);
        assert_eq!(feedback.judgment_id.as_deref(), Some("jdg_x"));
        assert!(!feedback.applied);
    }
}
