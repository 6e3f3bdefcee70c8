//! Tabular TD(0) learning over discrete states
//!
//! State keys are `(task_type, reality, active_dog)`; actions are dog or
//! heuristic names. γ is fixed at φ⁻¹; α comes from the user's learning
//! rate. Exploration is ε-greedy with ε decaying by 1/√episodes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::constants::{defaults, phi};
use crate::learner::sharded::ShardedMap;
use crate::types::{Reality, TaskType};

/// Discrete learner state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub task_type: TaskType,
    pub reality: Reality,
    /// Dog active when the state was observed
    pub dog: String,
}

impl StateKey {
    pub fn new(task_type: TaskType, reality: Reality, dog: impl Into<String>) -> Self {
        Self {
            task_type,
            reality,
            dog: dog.into(),
        }
    }
}

impl StateKey {
    /// Parse the `task_type|reality|dog` form produced by `Display`
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, '|');
        let task_type = TaskType::parse(parts.next()?)?;
        let reality: Reality = parts.next()?.parse().ok()?;
        let dog = parts.next()?;
        if dog.is_empty() {
            return None;
        }
        Some(Self::new(task_type, reality, dog))
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.task_type.as_str(),
            self.reality.as_str(),
            self.dog
        )
    }
}

/// TD(0) Q-table with sharded per-state locking
pub struct QTable {
    values: ShardedMap<StateKey, HashMap<String, f64>>,
    gamma: f64,
    episodes: AtomicU64,
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

impl QTable {
    pub fn new() -> Self {
        Self {
            values: ShardedMap::new(),
            gamma: phi::INV_PHI,
            episodes: AtomicU64::new(0),
        }
    }

    /// `Q(s,a) ← Q(s,a) + α·(r + γ·max_a' Q(s',a') − Q(s,a))`
    ///
    /// The next state's max is read before the current state's shard is
    /// locked, so two shards are never held at once.
    pub fn update(
        &self,
        state: &StateKey,
        action: &str,
        reward: f64,
        next_state: &StateKey,
        alpha: f64,
    ) -> f64 {
        let max_next = self.max_value(next_state);
        self.episodes.fetch_add(1, Ordering::Relaxed);
        self.values.with_entry(state, HashMap::new, |actions| {
            let q = actions.entry(action.to_string()).or_insert(0.0);
            *q += alpha * (reward + self.gamma * max_next - *q);
            *q
        })
    }

    /// Highest Q over the state's known actions (0.0 when unseen)
    pub fn max_value(&self, state: &StateKey) -> f64 {
        self.values
            .get(state)
            .and_then(|actions| actions.values().copied().max_by(f64::total_cmp))
            .unwrap_or(0.0)
    }

    /// Best known action for a state
    pub fn best_action(&self, state: &StateKey) -> Option<(String, f64)> {
        self.values.get(state).and_then(|actions| {
            actions
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
        })
    }

    /// ε-greedy selection among the candidate actions.
    ///
    /// With probability ε a uniformly random candidate is explored;
    /// otherwise the greedy argmax over known values (unseen actions count
    /// as 0.0) is exploited.
    pub fn select_action(&self, state: &StateKey, candidates: &[&str]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        if rand::random::<f64>() < self.epsilon() {
            let index = (rand::random::<f64>() * candidates.len() as f64) as usize;
            return Some(candidates[index.min(candidates.len() - 1)].to_string());
        }
        let known = self.values.get(state).unwrap_or_default();
        let best = candidates
            .iter()
            .max_by(|a, b| {
                let qa = known.get(**a).copied().unwrap_or(0.0);
                let qb = known.get(**b).copied().unwrap_or(0.0);
                qa.total_cmp(&qb)
            })?;
        Some((*best).to_string())
    }

    /// Current exploration rate: ε₀/√episodes, floored at 0.01
    pub fn epsilon(&self) -> f64 {
        let episodes = self.episodes.load(Ordering::Relaxed).max(1);
        (defaults::EPSILON_START / (episodes as f64).sqrt()).max(defaults::EPSILON_FLOOR)
    }

    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::Relaxed)
    }

    /// Number of distinct states seen
    pub fn state_count(&self) -> usize {
        self.values.len()
    }

    /// Clone out the whole table for stats and persistence
    pub fn snapshot(&self) -> Vec<(StateKey, HashMap<String, f64>)> {
        self.values.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::dogs;

    fn state(dog: &str) -> StateKey {
        StateKey::new(TaskType::Debug, Reality::Code, dog)
    }

    #[test]
    fn test_td0_moves_toward_reward() {
        let table = QTable::new();
        let s = state(dogs::GUARDIAN);
        let next = state(dogs::SCOUT);
        let q1 = table.update(&s, dogs::GUARDIAN, 1.0, &next, 0.2);
        assert!((q1 - 0.2).abs() < 1e-9, "first update from zero: α·r");
        let q2 = table.update(&s, dogs::GUARDIAN, 1.0, &next, 0.2);
        assert!(q2 > q1, "repeated reward grows Q");
    }

    #[test]
    fn test_bootstraps_from_next_state() {
        let table = QTable::new();
        let s = state(dogs::GUARDIAN);
        let next = state(dogs::SCOUT);
        // Give the next state value first
        table.update(&next, dogs::SCOUT, 1.0, &state(dogs::HERALD), 0.5);
        let max_next = table.max_value(&next);
        assert!(max_next > 0.0);
        let q = table.update(&s, dogs::GUARDIAN, 0.0, &next, 1.0);
        assert!((q - phi::INV_PHI * max_next).abs() < 1e-9, "pure bootstrap with α=1, r=0");
    }

    #[test]
    fn test_epsilon_decays_with_floor() {
        let table = QTable::new();
        assert!((table.epsilon() - defaults::EPSILON_START).abs() < 1e-9);
        let s = state(dogs::GUARDIAN);
        for _ in 0..400 {
            table.update(&s, dogs::GUARDIAN, 0.1, &s, 0.2);
        }
        // 0.10 / sqrt(400) = 0.005 → floored to 0.01
        assert!((table.epsilon() - defaults::EPSILON_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn test_best_action() {
        let table = QTable::new();
        let s = state(dogs::GUARDIAN);
        table.update(&s, dogs::SCOUT, 1.0, &s, 0.3);
        table.update(&s, dogs::HEALER, -1.0, &s, 0.3);
        let (best, q) = table.best_action(&s).unwrap();
        assert_eq!(best, dogs::SCOUT);
        assert!(q > 0.0);
    }

    #[test]
    fn test_select_action_returns_candidate() {
        let table = QTable::new();
        let s = state(dogs::GUARDIAN);
        let candidates = [dogs::GUARDIAN, dogs::SCOUT];
        for _ in 0..50 {
            let choice = table.select_action(&s, &candidates).unwrap();
            assert!(candidates.contains(&choice.as_str()));
        }
    }

    #[test]
    fn test_state_key_display() {
        let s = StateKey::new(TaskType::CodeChange, Reality::Code, dogs::SAGE);
        assert_eq!(s.to_string(), "code_change|code|sage");
        assert_eq!(StateKey::parse(&s.to_string()), Some(s));
        assert_eq!(StateKey::parse("nonsense"), None);
    }
}
