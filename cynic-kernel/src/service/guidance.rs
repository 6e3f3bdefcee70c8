//! The guidance side channel
//!
//! `guidance.json` carries the last judgment summary to the next hook
//! invocation. Writes are atomic (temp file + rename); readers ignore
//! records older than the 24 h staleness TTL.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cynic_core::constants::defaults;
use cynic_core::types::{Reality, Verdict};
use cynic_core::{Error, Result};

/// One guidance record, the whole file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub state_key: String,
    pub verdict: Verdict,
    pub q_score: f64,
    pub confidence: f64,
    pub reality: Reality,
    pub dog_votes: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

/// Write guidance atomically: temp file in the same directory, then rename
pub fn write_guidance(path: &Path, guidance: &Guidance) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Validation("guidance path has no parent".to_string()))?;
    std::fs::create_dir_all(parent)?;

    let temp_path = path.with_extension("json.tmp");
    let payload = serde_json::to_vec_pretty(guidance)?;
    std::fs::write(&temp_path, payload)?;
    std::fs::rename(&temp_path, path)?;
    debug!(path = %path.display(), "guidance written");
    Ok(())
}

/// Read guidance, treating stale or unparseable files as absent
pub fn read_guidance(path: &Path) -> Option<Guidance> {
    let raw = std::fs::read_to_string(path).ok()?;
    let guidance: Guidance = match serde_json::from_str(&raw) {
        Ok(g) => g,
        Err(err) => {
            warn!(%err, "unparseable guidance file ignored");
            return None;
        }
    };
    let age = Utc::now().signed_duration_since(guidance.timestamp);
    let ttl = chrono::Duration::from_std(defaults::GUIDANCE_STALENESS)
        .unwrap_or_else(|_| chrono::Duration::hours(24));
    if age > ttl {
        debug!(age_hours = age.num_hours(), "stale guidance ignored");
        return None;
    }
    Some(guidance)
}
