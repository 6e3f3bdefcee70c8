//! Heuristic promotion and demotion
//!
//! A pattern becomes a heuristic when it is confident (≥ 0.5), frequent
//! (≥ 13 occurrences), and its arm performs at φ⁻¹ or better. It is demoted
//! back when the arm falls below φ⁻².

use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::Result;
use crate::learner::ThompsonSampler;
use crate::storage::Store;

/// Patterns examined per promotion sweep
const SWEEP_LIMIT: usize = 100;

/// Outcome counts of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromotionSweep {
    pub promoted: u64,
    pub demoted: u64,
}

/// Sweep the active patterns, promoting and demoting against their arms.
///
/// The arm for a pattern is named by its `pattern_key`; a pattern whose arm
/// has never been pulled sits at the prior mean 0.5 and cannot clear the
/// φ⁻¹ bar.
#[instrument(skip(store, thompson))]
pub async fn sweep(store: &Arc<dyn Store>, thompson: &ThompsonSampler) -> Result<PromotionSweep> {
    let patterns = store.top_patterns(SWEEP_LIMIT).await?;
    let mut outcome = PromotionSweep::default();

    for pattern in patterns {
        let ratio = thompson.expected_value(&pattern.pattern_key);
        if !pattern.is_heuristic() && pattern.meets_promotion_bar(ratio) {
            store
                .set_pattern_promotion(&pattern.pattern_id, true)
                .await?;
            info!(pattern = %pattern.pattern_key, ratio, "promoted to heuristic");
            outcome.promoted += 1;
        } else if pattern.meets_demotion_bar(ratio) {
            store
                .set_pattern_promotion(&pattern.pattern_id, false)
                .await?;
            info!(pattern = %pattern.pattern_key, ratio, "demoted from heuristic");
            outcome.demoted += 1;
        }
    }
    Ok(outcome)
}
