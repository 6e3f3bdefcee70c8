//! # Session orchestrator
//!
//! Picks the boot mode (COLD / WARM / SAFE), assembles the session banner
//! with experience-based compression, and handles session end: counters
//! merged into the profile, psychology snapshot appended, handoff JSON
//! written for the next awakening.

mod sleep;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use cynic_core::storage::Store;
use cynic_core::types::{
    ExperienceLevel, Fact, Pattern, SessionSnapshot, UserLearningProfile,
};
use cynic_core::Result;

use crate::config::KernelConfig;

pub use sleep::{sleep, SessionCounters};

/// How the kernel came up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BootMode {
    /// First boot ever: full initialization, everything injected
    Cold,
    /// Prior sessions exist: profile-driven, compressed injection
    Warm,
    /// Store unreachable: local-only, no persistence, degraded
    Safe,
}

/// Context injected into the host at session start
#[derive(Debug, Clone, Serialize, Default)]
pub struct SessionBanner {
    /// Identity block; omitted at experienced+ levels
    pub identity: Option<String>,
    /// Axiom descriptions; omitted at experienced+ levels
    pub axioms: Option<Vec<String>>,
    pub facts: Vec<Fact>,
    pub patterns: Vec<Pattern>,
    pub reflections: Vec<String>,
    /// Previous session's handoff, when one exists
    pub previous_session: Option<SessionSnapshot>,
}

/// The boot outcome the service carries for its lifetime
#[derive(Debug, Clone, Serialize)]
pub struct BootReport {
    pub mode: BootMode,
    pub experience: ExperienceLevel,
    pub degraded: bool,
    pub banner: SessionBanner,
}

const IDENTITY_BLOCK: &str = "CYNIC judges every tool call through four axioms \
    (PHI, VERIFY, CULTURE, BURN) and learns from what follows.";

const AXIOM_BLOCKS: [&str; 4] = [
    "PHI: ratio and harmony; confidence is capped at 0.618",
    "VERIFY: falsifiability; untested claims score low",
    "CULTURE: pattern and consistency with what came before",
    "BURN: simplicity; sprawl is the enemy",
];

/// Patterns loaded into the banner on a warm boot
const WARM_PATTERN_LIMIT: usize = 100;

/// Select the boot mode and assemble the banner.
///
/// `store` is `None` when connection attempts were exhausted: SAFE mode,
/// no persistence, no cross-session context, `degraded = true`.
#[instrument(skip(config, store))]
pub async fn awaken(config: &KernelConfig, store: Option<&Arc<dyn Store>>) -> Result<BootReport> {
    let Some(store) = store else {
        warn!("store unavailable, awakening in SAFE mode");
        return Ok(BootReport {
            mode: BootMode::Safe,
            experience: ExperienceLevel::New,
            degraded: true,
            banner: SessionBanner::default(),
        });
    };

    let profile = store.get_profile(&config.user_id).await?;
    match profile {
        None => {
            info!(user = %config.user_id, "first boot, awakening COLD");
            let mut profile = UserLearningProfile::new(&config.user_id);
            profile.updated_at = chrono::Utc::now();
            store.upsert_profile(&profile).await?;

            let facts = store
                .facts_by_user(
                    &config.user_id,
                    config.fact_min_confidence,
                    config.fact_injection_limit,
                )
                .await?;
            Ok(BootReport {
                mode: BootMode::Cold,
                experience: ExperienceLevel::New,
                degraded: false,
                banner: SessionBanner {
                    identity: Some(IDENTITY_BLOCK.to_string()),
                    axioms: Some(AXIOM_BLOCKS.iter().map(|s| (*s).to_string()).collect()),
                    facts,
                    patterns: Vec::new(),
                    reflections: Vec::new(),
                    previous_session: None,
                },
            })
        }
        Some(profile) => {
            let experience = profile.experience_level();
            info!(
                user = %config.user_id,
                sessions = profile.session_count,
                ?experience,
                "awakening WARM"
            );

            let fact_limit = experience
                .fact_limit()
                .min(config.fact_injection_limit);
            let facts = store
                .facts_by_user(&config.user_id, config.fact_min_confidence, fact_limit)
                .await?;
            let patterns = store.top_patterns(WARM_PATTERN_LIMIT).await?;
            let previous_session = read_handoff(config);
            let reflections = previous_session
                .as_ref()
                .map(|s| {
                    s.handoff
                        .reflections
                        .iter()
                        .take(experience.reflection_limit())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            let (identity, axioms) = if experience.injects_identity() {
                (
                    Some(IDENTITY_BLOCK.to_string()),
                    Some(AXIOM_BLOCKS.iter().map(|s| (*s).to_string()).collect()),
                )
            } else {
                (None, None)
            };

            Ok(BootReport {
                mode: BootMode::Warm,
                experience,
                degraded: false,
                banner: SessionBanner {
                    identity,
                    axioms,
                    facts,
                    patterns,
                    reflections,
                    previous_session,
                },
            })
        }
    }
}

/// Previous session's handoff, if one was written
fn read_handoff(config: &KernelConfig) -> Option<SessionSnapshot> {
    let raw = std::fs::read_to_string(config.handoff_path()).ok()?;
    serde_json::from_str(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_safe_mode_without_store() {
        let config = KernelConfig::from_env(Some(9001), Some(":memory:".into()), false)
            .expect("config");
        let report = awaken(&config, None).await.expect("awaken");
        assert_eq!(report.mode, BootMode::Safe);
        assert!(report.degraded);
        assert!(report.banner.facts.is_empty());
    }
}
