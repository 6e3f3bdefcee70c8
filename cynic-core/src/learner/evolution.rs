//! Pattern evolution: upsert, trend tracking, and merge
//!
//! Every observation upserts its matched pattern: occurrence count rises,
//! confidence merges monotonically (max, capped at φ⁻¹), and the trend is
//! recomputed from the confidence velocity. Merge candidates are found by
//! trigram similarity over same-type keys.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::constants::defaults;
use crate::error::Result;
use crate::storage::Store;
use crate::types::{Pattern, TrendDirection};

/// Evolves the durable pattern table on behalf of the Learner
#[derive(Clone)]
pub struct PatternEvolution {
    store: Arc<dyn Store>,
}

impl PatternEvolution {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Upsert one observed pattern occurrence.
    ///
    /// Confidence never decreases and never exceeds φ⁻¹; the trend velocity
    /// is Δconfidence per hour since the previous update.
    #[instrument(skip(self))]
    pub async fn observe(
        &self,
        pattern_type: &str,
        pattern_key: &str,
        observed_confidence: f64,
    ) -> Result<Pattern> {
        let existing = self.store.find_pattern(pattern_type, pattern_key).await?;
        let pattern = match existing {
            Some(mut pattern) => {
                let previous_confidence = pattern.confidence;
                let now = Utc::now();
                pattern.occurrence_count += 1;
                pattern.merge_confidence(observed_confidence);
                pattern.strength = (pattern.strength + 2.0).min(100.0);

                let elapsed_hours =
                    (now - pattern.updated_at).num_seconds().max(1) as f64 / 3600.0;
                pattern.trend_velocity =
                    (pattern.confidence - previous_confidence) / elapsed_hours;
                pattern.trend_direction = TrendDirection::from_velocity(pattern.trend_velocity);
                pattern.updated_at = now;
                pattern
            }
            None => {
                let mut pattern = Pattern::new(pattern_type, pattern_key);
                pattern.merge_confidence(observed_confidence);
                pattern
            }
        };
        debug!(
            occurrences = pattern.occurrence_count,
            confidence = pattern.confidence,
            trend = ?pattern.trend_direction,
            "pattern observed"
        );
        self.store.upsert_pattern(&pattern).await
    }

    /// Find and absorb near-duplicate patterns of the same type.
    ///
    /// The pattern with the highest occurrence count becomes the target;
    /// the rest get `merged_at` set and are recorded as the target's
    /// parents. Merging an already-merged pattern is a no-op. Returns the
    /// number of patterns absorbed.
    #[instrument(skip(self))]
    pub async fn merge_similar(&self, pattern_type: &str, pattern_key: &str) -> Result<u64> {
        let Some(anchor) = self.store.find_pattern(pattern_type, pattern_key).await? else {
            return Ok(0);
        };
        if !anchor.is_active() {
            return Ok(0);
        }

        let candidates = self
            .store
            .similar_patterns(
                pattern_type,
                pattern_key,
                defaults::MERGE_SIMILARITY_THRESHOLD,
            )
            .await?;
        if candidates.is_empty() {
            return Ok(0);
        }

        // Highest occurrence wins; the anchor competes like any candidate
        let mut family: Vec<Pattern> = candidates;
        family.push(anchor);
        family.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
        let target = family.remove(0);
        let source_ids: Vec<String> = family
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.pattern_id.clone())
            .collect();
        if source_ids.is_empty() {
            return Ok(0);
        }

        self.store
            .merge_patterns(&source_ids, &target.pattern_id)
            .await?;
        info!(
            target = %target.pattern_id,
            absorbed = source_ids.len(),
            "merged similar patterns"
        );
        Ok(source_ids.len() as u64)
    }
}
