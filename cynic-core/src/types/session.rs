//! Learning cycles, e-score history, psychology snapshots, session handoff

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{prefix, short_id};
use crate::types::pattern::TrendDirection;

/// Immutable audit record of one harmonic learning cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCycle {
    /// Short prefixed id (`cyc_…`)
    pub cycle_id: String,
    pub feedback_processed: u64,
    pub patterns_updated: u64,
    pub patterns_merged: u64,
    pub weights_adjusted: u64,
    pub thresholds_adjusted: u64,
    pub avg_weight_delta: f64,
    pub avg_threshold_delta: f64,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl LearningCycle {
    pub fn new() -> Self {
        Self {
            cycle_id: short_id(prefix::CYCLE),
            feedback_processed: 0,
            patterns_updated: 0,
            patterns_merged: 0,
            weights_adjusted: 0,
            thresholds_adjusted: 0,
            avg_weight_delta: 0.0,
            avg_threshold_delta: 0.0,
            duration_ms: 0,
            created_at: Utc::now(),
        }
    }
}

impl Default for LearningCycle {
    fn default() -> Self {
        Self::new()
    }
}

/// The seven e-score sub-dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EScoreDimensions {
    pub focus: f64,
    pub momentum: f64,
    pub resilience: f64,
    pub curiosity: f64,
    pub rigor: f64,
    pub craft: f64,
    pub harmony: f64,
}

/// Point-in-time engagement score snapshot.
///
/// Retention: hourly for 24 h, daily (midnight) for 7 d, weekly (Sunday
/// midnight) for 365 d, then deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EScoreSnapshot {
    pub user_id: String,
    pub e_score: f64,
    pub dimensions: EScoreDimensions,
    /// What state change produced this snapshot
    pub trigger_event: String,
    /// Change from the previous snapshot
    pub delta: f64,
    pub created_at: DateTime<Utc>,
}

/// Psychological state snapshot, appended for trend analysis.
///
/// Dimensions and composites are all in [0, 1]; composites are derived
/// from the dimensions, never stored independently inconsistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychologySnapshot {
    pub energy: f64,
    pub focus: f64,
    pub creativity: f64,
    pub frustration: f64,
    pub burnout: f64,
    pub flow: f64,
    pub work_done: f64,
    pub error_count: u64,
    pub created_at: DateTime<Utc>,
}

impl PsychologySnapshot {
    /// Derive composites from the four dimensions
    pub fn derive(
        energy: f64,
        focus: f64,
        creativity: f64,
        frustration: f64,
        work_done: f64,
        error_count: u64,
    ) -> Self {
        let energy = energy.clamp(0.0, 1.0);
        let focus = focus.clamp(0.0, 1.0);
        let creativity = creativity.clamp(0.0, 1.0);
        let frustration = frustration.clamp(0.0, 1.0);
        // Burnout rises with frustration against depleted energy; flow is
        // focused energy undisturbed by frustration.
        let burnout = (frustration * (1.0 - energy)).clamp(0.0, 1.0);
        let flow = (energy * focus * (1.0 - frustration)).clamp(0.0, 1.0);
        Self {
            energy,
            focus,
            creativity,
            frustration,
            burnout,
            flow,
            work_done: work_done.max(0.0),
            error_count,
            created_at: Utc::now(),
        }
    }
}

/// Handoff payload written for the next awakening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Handoff {
    pub summary: String,
    #[serde(default)]
    pub files_modified: Vec<String>,
    #[serde(default)]
    pub unresolved_errors: Vec<String>,
    #[serde(default)]
    pub reflections: Vec<String>,
}

/// End-of-session snapshot persisted at sleep and serialized to
/// `~/.cynic/last-session.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Short prefixed id (`ses_…`)
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_end_time: DateTime<Utc>,
    /// Session length in milliseconds
    pub duration: u64,
    pub prompt_count: u64,
    pub judgment_count: u64,
    pub avg_q_score: f64,
    pub trend: TrendDirection,
    pub handoff: Handoff,
}

impl SessionSnapshot {
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            session_id: session_id.unwrap_or_else(|| short_id(prefix::SESSION)),
            user_id: None,
            session_end_time: Utc::now(),
            duration: 0,
            prompt_count: 0,
            judgment_count: 0,
            avg_q_score: 0.0,
            trend: TrendDirection::Stable,
            handoff: Handoff::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_psychology_composites_bounded() {
        let snap = PsychologySnapshot::derive(0.2, 0.9, 0.5, 0.9, 3.0, 7);
        assert!(snap.burnout > 0.5, "high frustration, low energy");
        assert!(snap.flow < 0.1, "no flow under frustration");
        for v in [snap.energy, snap.focus, snap.creativity, snap.frustration, snap.burnout, snap.flow] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_handoff_round_trips_camel_case() {
        let snap = SessionSnapshot::new(Some("ses_abc".into()));
        let json = serde_json::to_value(&snap).expect("serializes");
        assert!(json.get("sessionEndTime").is_some());
        assert!(json.get("promptCount").is_some());
        assert!(json["handoff"].get("filesModified").is_some());
    }
}
