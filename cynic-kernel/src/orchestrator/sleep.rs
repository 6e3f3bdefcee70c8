//! Session end ("sleep"): aggregate, persist, hand off

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

use cynic_core::storage::Store;
use cynic_core::types::{
    EScoreDimensions, EScoreSnapshot, Handoff, JudgmentHistograms, PsychologySnapshot,
    SessionSnapshot, TrendDirection, UserLearningProfile,
};
use cynic_core::{HarmonicLoop, Result};

use crate::config::KernelConfig;

/// Counters the service accumulates over a session
#[derive(Debug, Default)]
pub struct SessionCounters {
    pub prompt_count: AtomicU64,
    pub judgment_count: AtomicU64,
    pub error_count: AtomicU64,
    /// Sum of Q-scores, for the session average
    pub q_sum: Mutex<f64>,
    /// Q of the first and last thirds, for the trend
    pub early_q: Mutex<(f64, u64)>,
    pub late_q: Mutex<(f64, u64)>,
    pub files_modified: Mutex<Vec<String>>,
    pub unresolved_errors: Mutex<Vec<String>>,
    /// Hour-of-day and item-type histograms, merged into the profile at sleep
    pub histograms: Mutex<JudgmentHistograms>,
}

impl SessionCounters {
    pub fn record_judgment(&self, q_score: f64, item_type: &str) {
        use chrono::Timelike;
        self.histograms
            .lock()
            .record(Utc::now().hour(), item_type);
        let count = self.judgment_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.q_sum.lock() += q_score;
        if count <= 10 {
            let mut early = self.early_q.lock();
            early.0 += q_score;
            early.1 += 1;
        } else {
            let mut late = self.late_q.lock();
            late.0 += q_score;
            late.1 += 1;
            if late.1 > 10 {
                // Keep only a sliding tail by decaying the accumulator
                late.0 *= 0.9;
                late.1 = (late.1 as f64 * 0.9) as u64;
            }
        }
    }

    pub fn record_file_modified(&self, path: String) {
        let mut files = self.files_modified.lock();
        if !files.contains(&path) && files.len() < 100 {
            files.push(path);
        }
    }

    pub fn record_error(&self, message: String) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        let mut errors = self.unresolved_errors.lock();
        if errors.len() < 20 {
            errors.push(message);
        }
    }

    fn trend(&self) -> TrendDirection {
        let early = self.early_q.lock();
        let late = self.late_q.lock();
        if early.1 == 0 || late.1 == 0 {
            return TrendDirection::Stable;
        }
        let early_avg = early.0 / early.1 as f64;
        let late_avg = late.0 / late.1 as f64;
        TrendDirection::from_velocity((late_avg - early_avg) / 100.0)
    }
}

/// Session end: run a final learning cycle, merge counters into the
/// profile, append a psychology snapshot, persist the session row, and
/// write the handoff JSON for the next awakening.
#[instrument(skip_all)]
pub async fn sleep(
    config: &KernelConfig,
    store: Option<&Arc<dyn Store>>,
    harmonic: &Arc<HarmonicLoop>,
    counters: &SessionCounters,
    session_duration_ms: u64,
) -> Result<SessionSnapshot> {
    if let Err(err) = harmonic.run_cycle().await {
        warn!(%err, "final learning cycle failed");
    }

    let judgment_count = counters.judgment_count.load(Ordering::Relaxed);
    let prompt_count = counters.prompt_count.load(Ordering::Relaxed);
    let error_count = counters.error_count.load(Ordering::Relaxed);
    let avg_q = if judgment_count > 0 {
        *counters.q_sum.lock() / judgment_count as f64
    } else {
        0.0
    };

    let mut snapshot = SessionSnapshot::new(config.session_id.clone());
    snapshot.user_id = Some(config.user_id.clone());
    snapshot.duration = session_duration_ms;
    snapshot.prompt_count = prompt_count;
    snapshot.judgment_count = judgment_count;
    snapshot.avg_q_score = avg_q;
    snapshot.trend = counters.trend();
    snapshot.handoff = Handoff {
        summary: format!(
            "{judgment_count} judgments at avg Q {avg_q:.1}, {error_count} errors"
        ),
        files_modified: counters.files_modified.lock().clone(),
        unresolved_errors: counters.unresolved_errors.lock().clone(),
        reflections: reflections_from(avg_q, error_count, judgment_count),
    };

    if let Some(store) = store {
        merge_into_profile(config, store, &snapshot, counters).await?;

        let work_done = (judgment_count as f64 / 50.0).min(1.0);
        let frustration = if judgment_count > 0 {
            (error_count as f64 / judgment_count as f64).min(1.0)
        } else {
            0.0
        };
        let hours = session_duration_ms as f64 / 3_600_000.0;
        let psychology = PsychologySnapshot::derive(
            (1.0 - hours / 8.0).clamp(0.0, 1.0),
            (avg_q / 100.0).clamp(0.0, 1.0),
            0.5,
            frustration,
            work_done,
            error_count,
        );
        store.record_psychology(&config.user_id, &psychology).await?;
        store.record_session(&snapshot).await?;

        // Engagement snapshot for the retention-managed history
        let escore = EScoreSnapshot {
            user_id: config.user_id.clone(),
            e_score: (avg_q / 100.0).clamp(0.0, 1.0),
            dimensions: EScoreDimensions {
                focus: psychology.focus,
                momentum: work_done,
                resilience: 1.0 - psychology.burnout,
                curiosity: 0.5,
                rigor: (avg_q / 100.0).clamp(0.0, 1.0),
                craft: (avg_q / 100.0).clamp(0.0, 1.0),
                harmony: psychology.flow,
            },
            trigger_event: "session_end".to_string(),
            delta: 0.0,
            created_at: Utc::now(),
        };
        store.record_escore(&escore).await?;
        store.cleanup_escore_history().await?;
    }

    write_handoff(config, &snapshot)?;
    info!(
        session = %snapshot.session_id,
        judgments = judgment_count,
        avg_q,
        "session asleep, handoff written"
    );
    Ok(snapshot)
}

async fn merge_into_profile(
    config: &KernelConfig,
    store: &Arc<dyn Store>,
    snapshot: &SessionSnapshot,
    counters: &SessionCounters,
) -> Result<()> {
    let mut profile = store
        .get_profile(&config.user_id)
        .await?
        .unwrap_or_else(|| UserLearningProfile::new(&config.user_id));
    profile.session_count += 1;
    profile.judgment_count += snapshot.judgment_count as i64;

    let session_histograms = counters.histograms.lock().clone();
    if profile.judgment_patterns.by_hour.len() != 24 {
        profile.judgment_patterns.by_hour = vec![0; 24];
    }
    for (hour, count) in session_histograms.by_hour.iter().enumerate() {
        if let Some(slot) = profile.judgment_patterns.by_hour.get_mut(hour) {
            *slot += count;
        }
    }
    for (item_type, count) in session_histograms.by_type {
        *profile
            .judgment_patterns
            .by_type
            .entry(item_type)
            .or_insert(0) += count;
    }

    profile.updated_at = Utc::now();
    store.upsert_profile(&profile).await
}

fn reflections_from(avg_q: f64, error_count: u64, judgment_count: u64) -> Vec<String> {
    let mut reflections = Vec::new();
    if judgment_count == 0 {
        return reflections;
    }
    if avg_q >= 62.0 {
        reflections.push("quality held above the approval line".to_string());
    } else if avg_q < 45.0 {
        reflections.push("quality trended low; tighten verification first".to_string());
    }
    if error_count * 5 > judgment_count {
        reflections.push("error rate was high this session".to_string());
    }
    reflections
}

fn write_handoff(config: &KernelConfig, snapshot: &SessionSnapshot) -> Result<()> {
    let path = config.handoff_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, serde_json::to_vec_pretty(snapshot)?)?;
    std::fs::rename(&temp, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_detection() {
        let counters = SessionCounters::default();
        for _ in 0..10 {
            counters.record_judgment(40.0, "Bash");
        }
        for _ in 0..10 {
            counters.record_judgment(80.0, "Bash");
        }
        assert_eq!(counters.trend(), TrendDirection::Up);
    }

    #[test]
    fn test_counters_accumulate() {
        let counters = SessionCounters::default();
        counters.record_judgment(60.0, "Bash");
        counters.record_judgment(70.0, "Bash");
        counters.record_file_modified("src/lib.rs".to_string());
        counters.record_file_modified("src/lib.rs".to_string());
        counters.record_error("boom".to_string());
        assert_eq!(counters.judgment_count.load(Ordering::Relaxed), 2);
        assert_eq!(counters.files_modified.lock().len(), 1);
        assert_eq!(counters.error_count.load(Ordering::Relaxed), 1);
    }
}
