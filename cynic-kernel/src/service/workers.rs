//! Bounded persistence worker pool
//!
//! `/perceive` must answer inside the REFLEX budget, so Store writes and
//! learning updates run on a small worker pool behind a bounded queue.
//! Overflow is explicit back-pressure: the judgment is still returned to
//! the hook, persistence is skipped, and `dropped_persistence_total`
//! counts the loss.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use cynic_core::constants::defaults;
use cynic_core::harmonic::Suggestion;
use cynic_core::learner::{RewardComponents, StateKey};
use cynic_core::storage::Store;
use cynic_core::types::Judgment;
use cynic_core::{Error, HarmonicLoop, Learner, Result};

/// One unit of deferred work from the perceive path
#[derive(Debug)]
pub struct PersistTask {
    pub judgment: Box<Judgment>,
    pub state: StateKey,
    pub execution_ms: Option<u64>,
    pub is_post_tool: bool,
    /// Action text to run implicit-feedback detection against
    pub action_text: String,
    /// Suggestion to remember after detection, when the verdict advises
    pub suggestion: Option<Suggestion>,
}

/// Shared counters surfaced by `/health`
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub dropped_persistence_total: AtomicU64,
    pub persisted_total: AtomicU64,
    pub integrity_errors_total: AtomicU64,
}

/// Handle to the worker pool
#[derive(Clone)]
pub struct WorkerPool {
    tx: mpsc::Sender<PersistTask>,
    pub counters: Arc<WorkerCounters>,
}

impl WorkerPool {
    /// Spawn the pool. With no store (SAFE mode) workers still run the
    /// learning updates; only persistence is skipped.
    pub fn spawn(
        store: Option<Arc<dyn Store>>,
        learner: Arc<Learner>,
        harmonic: Arc<HarmonicLoop>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<PersistTask>(defaults::WORKER_QUEUE_CAPACITY);
        let counters = Arc::new(WorkerCounters::default());
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for worker_id in 0..defaults::WORKER_COUNT {
            let rx = Arc::clone(&rx);
            let store = store.clone();
            let learner = Arc::clone(&learner);
            let harmonic = Arc::clone(&harmonic);
            let counters = Arc::clone(&counters);
            tokio::spawn(async move {
                info!(worker_id, "persistence worker started");
                loop {
                    let task = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(task) = task else {
                        debug!(worker_id, "queue closed, worker exiting");
                        break;
                    };
                    if let Err(err) =
                        process_task(task, store.as_ref(), &learner, &harmonic).await
                    {
                        error!(worker_id, %err, "persistence task failed");
                    } else {
                        counters.persisted_total.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }

        Self { tx, counters }
    }

    /// Enqueue without waiting. A full queue is `Overloaded`: the caller
    /// returns the judgment with `persistence: skipped`.
    pub fn enqueue(&self, task: PersistTask) -> Result<()> {
        match self.tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters
                    .dropped_persistence_total
                    .fetch_add(1, Ordering::Relaxed);
                warn!("worker queue full, skipping persistence");
                Err(Error::Overloaded)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(Error::Storage("worker queue closed".to_string()))
            }
        }
    }

    pub fn dropped_total(&self) -> u64 {
        self.counters
            .dropped_persistence_total
            .load(Ordering::Relaxed)
    }
}

/// One task end to end: implicit detection, persistence, pattern
/// evolution, self-judge reward, suggestion recording, cycle cadence.
async fn process_task(
    task: PersistTask,
    store: Option<&Arc<dyn Store>>,
    learner: &Arc<Learner>,
    harmonic: &Arc<HarmonicLoop>,
) -> Result<()> {
    // The incoming action may answer an earlier suggestion
    if !task.action_text.is_empty() {
        harmonic.observe_action(&task.action_text).await?;
    }

    if let Some(store) = store {
        let stored = store.create_judgment(&task.judgment).await?;
        // Pattern evolution keys on what kind of item drew which verdict
        if let Some(evolution) = learner.evolution() {
            let key = format!(
                "{}:{}",
                stored.item_type.to_lowercase(),
                stored.verdict.as_str().to_lowercase()
            );
            evolution
                .observe("tool_outcome", &key, stored.confidence)
                .await?;
            evolution.merge_similar("tool_outcome", &key).await?;
        }
    }

    // Self-judge reward for the active dog, at the user's learning rate
    let mut alpha = 0.2;
    if let (Some(store), Some(user_id)) = (store, &task.judgment.user_id) {
        if let Ok(Some(profile)) = store.get_profile(user_id).await {
            alpha = profile.learning_rate;
        }
    }
    // The guard only honors blocks on the guarded tool set
    let guard_blocked = task.judgment.verdict.is_blocking()
        && cynic_core::constants::guard::GUARDED_TOOLS
            .contains(&task.judgment.item_type.as_str());
    let components = RewardComponents {
        q_score: Some(task.judgment.q_score),
        execution_ms: task.execution_ms,
        guard_blocked,
        ..Default::default()
    };
    let action = task.state.dog.clone();
    learner.record_outcome(&task.state, &action, &components, &task.state, alpha);

    if let Some(suggestion) = task.suggestion {
        harmonic.record_suggestion(suggestion);
    }

    if task.is_post_tool {
        harmonic.note_post_tool_event().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cynic_core::types::{Reality, TaskType};
    use cynic_core::Judge;

    fn pool_without_store() -> (WorkerPool, Arc<Learner>) {
        let learner = Arc::new(Learner::new(None));
        let judge = Arc::new(Judge::new());
        let harmonic = Arc::new(HarmonicLoop::new(None, Arc::clone(&learner), judge));
        (
            WorkerPool::spawn(None, Arc::clone(&learner), harmonic),
            learner,
        )
    }

    fn task(content: &str) -> PersistTask {
        PersistTask {
            judgment: Box::new(test_utils::test_judgment("jdg_w", content)),
            state: StateKey::new(TaskType::CodeChange, Reality::Code, "guardian"),
            execution_ms: Some(120),
            is_post_tool: true,
            action_text: content.to_string(),
            suggestion: None,
        }
    }

    #[tokio::test]
    async fn test_enqueued_task_reaches_learner() {
        let (pool, learner) = pool_without_store();
        pool.enqueue(task("echo one")).unwrap();
        // Give the worker a moment to drain
        for _ in 0..50 {
            if learner.qtable().episodes() > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(learner.qtable().episodes(), 1);
        assert_eq!(pool.dropped_total(), 0);
    }
}
