//! # Reinforcement learner
//!
//! Combines a TD(0) Q-table over discrete states with Thompson sampling
//! over named arms (patterns, heuristics, dog choices), plus durable
//! pattern evolution and the optional analytic trackers.
//!
//! The Q-table and posteriors are process-local; the Store owns their
//! persisted snapshots. Updates for a single state or arm are serialized by
//! per-key locks; distinct keys proceed in parallel.

pub mod evolution;
pub mod qtable;
pub mod reward;
mod sharded;
pub mod thompson;
#[cfg(feature = "analytics")]
pub mod trackers;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::storage::Store;
use crate::types::dogs;

pub use evolution::PatternEvolution;
pub use qtable::{QTable, StateKey};
pub use reward::RewardComponents;
pub use thompson::{Arm, ThompsonSampler};

/// Rewards within this band of zero update neither α nor β
const NEUTRAL_REWARD_BAND: f64 = 0.05;

/// Execution time past which an observation counts as stress
const STRESS_EXECUTION_MS: u64 = 5_000;

/// Aggregate learner state for the stats surface
#[derive(Debug, Clone, Serialize)]
pub struct LearnerStats {
    pub states: usize,
    pub episodes: u64,
    pub epsilon: f64,
    pub arms: usize,
    pub top_arms: Vec<Arm>,
}

/// The learning engine bundle
pub struct Learner {
    qtable: QTable,
    thompson: ThompsonSampler,
    evolution: Option<PatternEvolution>,
    #[cfg(feature = "analytics")]
    trackers: trackers::Trackers,
}

impl Learner {
    /// `store` is `None` in SAFE mode: pattern evolution is disabled but
    /// the in-memory tables keep learning for the life of the process.
    pub fn new(store: Option<Arc<dyn Store>>) -> Self {
        Self {
            qtable: QTable::new(),
            thompson: ThompsonSampler::new(),
            evolution: store.map(PatternEvolution::new),
            #[cfg(feature = "analytics")]
            trackers: trackers::Trackers::new(),
        }
    }

    pub fn qtable(&self) -> &QTable {
        &self.qtable
    }

    pub fn thompson(&self) -> &ThompsonSampler {
        &self.thompson
    }

    pub fn evolution(&self) -> Option<&PatternEvolution> {
        self.evolution.as_ref()
    }

    /// Select the active dog for a state via one Thompson draw per roster
    /// arm, returning the winner and every arm's posterior mean (the
    /// `dog_votes` carried into guidance).
    pub fn select_dog(&self, _state: &StateKey) -> (String, BTreeMap<String, f64>) {
        let mut rng = rand::rng();
        let chosen = self
            .thompson
            .select(&dogs::ROSTER, &mut rng)
            .unwrap_or_else(|| dogs::GUARDIAN.to_string());
        (chosen, self.dog_votes())
    }

    /// Posterior mean per roster dog
    pub fn dog_votes(&self) -> BTreeMap<String, f64> {
        dogs::ROSTER
            .iter()
            .map(|&dog| (dog.to_string(), self.thompson.expected_value(dog)))
            .collect()
    }

    /// Apply one composed reward to the Q-table, the action's arm, and the
    /// trackers. Returns the scalar reward used.
    pub fn record_outcome(
        &self,
        state: &StateKey,
        action: &str,
        components: &RewardComponents,
        next_state: &StateKey,
        alpha: f64,
    ) -> f64 {
        let reward = components.compose();
        let q = self.qtable.update(state, action, reward, next_state, alpha);

        if reward > NEUTRAL_REWARD_BAND {
            self.thompson.record(action, true);
        } else if reward < -NEUTRAL_REWARD_BAND {
            self.thompson.record(action, false);
        }

        #[cfg(feature = "analytics")]
        {
            use chrono::Timelike;
            let under_stress = components.guard_blocked
                || components
                    .execution_ms
                    .is_some_and(|ms| ms > STRESS_EXECUTION_MS);
            let hour = chrono::Utc::now().hour();
            self.trackers.record_reward(reward, hour, under_stress);
        }
        #[cfg(not(feature = "analytics"))]
        let _ = STRESS_EXECUTION_MS;

        debug!(state = %state, action, reward, q, "recorded outcome");
        reward
    }

    /// Snapshot for `/stats/learner`
    pub fn stats(&self) -> LearnerStats {
        let mut top_arms = self.thompson.snapshot();
        top_arms.sort_by(|a, b| b.mean().total_cmp(&a.mean()));
        top_arms.truncate(10);
        LearnerStats {
            states: self.qtable.state_count(),
            episodes: self.qtable.episodes(),
            epsilon: self.qtable.epsilon(),
            arms: self.thompson.arm_count(),
            top_arms,
        }
    }

    /// Advisory tracker report, when compiled in
    #[cfg(feature = "analytics")]
    pub fn tracker_report(&self) -> trackers::TrackerReport {
        self.trackers.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Reality, TaskType};

    fn state() -> StateKey {
        StateKey::new(TaskType::CodeChange, Reality::Code, dogs::GUARDIAN)
    }

    #[test]
    fn test_record_outcome_updates_both_tables() {
        let learner = Learner::new(None);
        let components = RewardComponents {
            q_score: Some(90.0),
            ..Default::default()
        };
        let reward = learner.record_outcome(&state(), dogs::SCOUT, &components, &state(), 0.2);
        assert!(reward > 0.0);
        assert_eq!(learner.qtable().episodes(), 1);
        let arm = learner.thompson().arm(dogs::SCOUT).unwrap();
        assert!(arm.alpha > 1.0, "positive reward increments alpha");
    }

    #[test]
    fn test_neutral_reward_skips_thompson() {
        let learner = Learner::new(None);
        let components = RewardComponents {
            q_score: Some(50.0),
            ..Default::default()
        };
        learner.record_outcome(&state(), dogs::SCOUT, &components, &state(), 0.2);
        assert!(learner.thompson().arm(dogs::SCOUT).is_none());
    }

    #[test]
    fn test_select_dog_returns_roster_member_and_votes() {
        let learner = Learner::new(None);
        let (dog, votes) = learner.select_dog(&state());
        assert!(dogs::ROSTER.contains(&dog.as_str()));
        assert_eq!(votes.len(), dogs::ROSTER.len());
        for vote in votes.values() {
            assert!((0.0..=1.0).contains(vote));
        }
    }

    #[test]
    fn test_stats_shape() {
        let learner = Learner::new(None);
        let components = RewardComponents {
            explicit: Some(crate::types::FeedbackOutcome::Correct),
            ..Default::default()
        };
        learner.record_outcome(&state(), dogs::HEALER, &components, &state(), 0.2);
        let stats = learner.stats();
        assert_eq!(stats.states, 1);
        assert_eq!(stats.arms, 1);
        assert!(stats.epsilon > 0.0);
    }
}
