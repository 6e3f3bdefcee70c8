//! # Harmonic feedback loop
//!
//! Routes explicit and implicit feedback into the Learner the moment it
//! arrives, and periodically fires a learning cycle that recomputes axiom
//! weights, shifts verdict thresholds, and promotes stable patterns to
//! heuristics. Cycles fire every 20 post-tool events or at session end.

pub mod cycle;
pub mod implicit;
pub mod promotion;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::constants::defaults;
use crate::error::Result;
use crate::judge::Judge;
use crate::learner::{Learner, RewardComponents, StateKey};
use crate::storage::Store;
use crate::types::{dogs, Feedback, FeedbackSource, Reality, TaskType};

pub use cycle::CycleOutcome;
pub use implicit::{ActionRelation, ImplicitObserver, ImplicitSignal, Suggestion};
pub use promotion::PromotionSweep;

/// Default α when no profile is available
const DEFAULT_LEARNING_RATE: f64 = 0.2;

/// Drives feedback into learning state
pub struct HarmonicLoop {
    store: Option<Arc<dyn Store>>,
    learner: Arc<Learner>,
    judge: Arc<Judge>,
    observer: ImplicitObserver,
    post_tool_events: AtomicU64,
    threshold_delta: Mutex<f64>,
    cycle_guard: tokio::sync::Mutex<()>,
}

impl HarmonicLoop {
    pub fn new(store: Option<Arc<dyn Store>>, learner: Arc<Learner>, judge: Arc<Judge>) -> Self {
        Self {
            store,
            learner,
            judge,
            observer: ImplicitObserver::new(),
            post_tool_events: AtomicU64::new(0),
            threshold_delta: Mutex::new(0.0),
            cycle_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Current bounded verdict threshold shift
    pub fn threshold_delta(&self) -> f64 {
        *self.threshold_delta.lock()
    }

    /// Route one feedback event: persist it unapplied, then apply the
    /// immediate Thompson and Q-table updates for the judgment's state.
    #[instrument(skip(self, feedback), fields(source = ?feedback.source_type))]
    pub async fn handle_feedback(&self, feedback: Feedback) -> Result<()> {
        let state = self.state_for(&feedback).await;

        if let Some(store) = &self.store {
            store.create_feedback(&feedback).await?;
        }

        let components = match feedback.source_type {
            FeedbackSource::Implicit => RewardComponents {
                implicit: Some((feedback.outcome, feedback.confidence)),
                ..Default::default()
            },
            FeedbackSource::Explicit | FeedbackSource::SelfJudge => RewardComponents {
                explicit: Some(feedback.outcome),
                ..Default::default()
            },
        };

        let alpha = self.learning_rate_for(feedback.user_id.as_deref()).await;
        let action = state.dog.clone();
        self.learner
            .record_outcome(&state, &action, &components, &state, alpha);
        Ok(())
    }

    /// Remember a suggestion for implicit follow-up detection
    pub fn record_suggestion(&self, suggestion: Suggestion) {
        self.observer.record_suggestion(suggestion);
    }

    /// Classify an observed action against open suggestions and feed the
    /// resulting implicit signals back into the loop
    pub async fn observe_action(&self, action: &str) -> Result<usize> {
        let signals = self.observer.observe_action(action, chrono::Utc::now());
        let count = signals.len();
        for signal in signals {
            self.handle_feedback(signal.into_feedback()).await?;
        }
        Ok(count)
    }

    /// Count a post-tool event; every 20th fires a learning cycle
    pub async fn note_post_tool_event(&self) -> Result<Option<CycleOutcome>> {
        let count = self.post_tool_events.fetch_add(1, Ordering::Relaxed) + 1;
        if count % defaults::CYCLE_EVERY_POST_TOOL_EVENTS == 0 {
            return self.run_cycle().await.map(Some);
        }
        Ok(None)
    }

    /// Fire one learning cycle now (also called at session end).
    ///
    /// Cycles are serialized; a second caller waits rather than
    /// interleaving.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let _guard = self.cycle_guard.lock().await;
        let Some(store) = &self.store else {
            // SAFE mode: nothing durable to drain
            debug!("cycle skipped, no store");
            return Ok(CycleOutcome {
                cycle: crate::types::LearningCycle::new(),
                weights: self.judge.weights(),
                threshold_delta: self.threshold_delta(),
            });
        };

        let outcome = cycle::run_cycle(
            store,
            self.learner.thompson(),
            self.judge.weights(),
            self.threshold_delta(),
        )
        .await?;

        self.judge.set_weights(outcome.weights.clone());
        *self.threshold_delta.lock() = outcome.threshold_delta;
        Ok(outcome)
    }

    /// Resolve the state key a feedback belongs to.
    ///
    /// The perceive path stamps `state_key` into the judgment context;
    /// orphan feedback falls back to a neutral human-reality state.
    async fn state_for(&self, feedback: &Feedback) -> StateKey {
        if let (Some(store), Some(judgment_id)) = (&self.store, &feedback.judgment_id) {
            match store.get_judgment(judgment_id).await {
                Ok(Some(judgment)) => {
                    if let Some(key) = judgment
                        .context
                        .get("state_key")
                        .and_then(|v| v.as_str())
                        .and_then(StateKey::parse)
                    {
                        return key;
                    }
                }
                Ok(None) => {}
                Err(err) => warn!(%err, "judgment lookup failed for feedback"),
            }
        }
        StateKey::new(TaskType::Analysis, Reality::Human, dogs::GUARDIAN)
    }

    async fn learning_rate_for(&self, user_id: Option<&str>) -> f64 {
        if let (Some(store), Some(user)) = (&self.store, user_id) {
            if let Ok(Some(profile)) = store.get_profile(user).await {
                return profile.learning_rate;
            }
        }
        DEFAULT_LEARNING_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedbackOutcome;

    fn safe_mode_loop() -> HarmonicLoop {
        let learner = Arc::new(Learner::new(None));
        let judge = Arc::new(Judge::new());
        HarmonicLoop::new(None, learner, judge)
    }

    #[tokio::test]
    async fn test_feedback_updates_learner_in_safe_mode() {
        let harmonic = safe_mode_loop();
        let feedback = Feedback::from_rating(5).unwrap();
        harmonic.handle_feedback(feedback).await.unwrap();
        assert_eq!(harmonic.learner.qtable().episodes(), 1);
    }

    #[tokio::test]
    async fn test_cycle_cadence() {
        let harmonic = safe_mode_loop();
        for i in 1..defaults::CYCLE_EVERY_POST_TOOL_EVENTS {
            let fired = harmonic.note_post_tool_event().await.unwrap();
            assert!(fired.is_none(), "no cycle at event {i}");
        }
        let fired = harmonic.note_post_tool_event().await.unwrap();
        assert!(fired.is_some(), "cycle fires on the 20th event");
    }

    #[tokio::test]
    async fn test_implicit_follow_increments_arm() {
        // S4 tail: the matched arm's alpha moves on a followed suggestion
        let harmonic = safe_mode_loop();
        harmonic.record_suggestion(Suggestion {
            judgment_id: None,
            advice: "run tests".to_string(),
            dog: dogs::GUARDIAN.to_string(),
            blocking: false,
            created_at: chrono::Utc::now(),
        });
        let signals = harmonic.observe_action("Bash: pytest").await.unwrap();
        assert_eq!(signals, 1);
        let arm = harmonic.learner.thompson().arm(dogs::GUARDIAN).unwrap();
        assert!((arm.alpha - 2.0).abs() < 1e-9, "alpha incremented by one");
    }

    #[tokio::test]
    async fn test_safe_mode_cycle_is_noop() {
        let harmonic = safe_mode_loop();
        let outcome = harmonic.run_cycle().await.unwrap();
        assert_eq!(outcome.cycle.feedback_processed, 0);
    }

    #[tokio::test]
    async fn test_orphan_feedback_uses_fallback_state() {
        let harmonic = safe_mode_loop();
        let feedback = Feedback::explicit(None, FeedbackOutcome::Incorrect);
        harmonic.handle_feedback(feedback).await.unwrap();
        let stats = harmonic.learner.stats();
        assert_eq!(stats.states, 1);
    }
}
