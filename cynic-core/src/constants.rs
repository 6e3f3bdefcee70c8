//! Global constants for the kernel
//!
//! Centralizes the golden-ratio bounds, verdict thresholds, and default
//! tuning values used throughout the judgment and learning engine.

/// Golden-ratio derived bounds
pub mod phi {
    /// The golden ratio itself
    pub const PHI: f64 = 1.618_033_988_749_895;

    /// φ⁻¹, the global confidence cap and the HOWL threshold (×100)
    pub const INV_PHI: f64 = 0.618_033_988_749_895;

    /// φ⁻², the lower threshold for fact injection and demotion
    pub const INV_PHI_SQ: f64 = 0.381_966_011_250_105;

    /// Hard cap on judgment and pattern confidence
    pub const MAX_CONFIDENCE: f64 = INV_PHI;
}

/// Verdict thresholds on the Q-score scale [0, 100]
pub mod verdicts {
    /// Q at or above this approves (HOWL): φ⁻¹ × 100
    pub const HOWL_THRESHOLD: f64 = super::phi::INV_PHI * 100.0;

    /// Q at or above this accepts with advice (WAG)
    pub const WAG_THRESHOLD: f64 = 45.0;

    /// Q at or above this warns (GROWL); below it blocks (BARK)
    pub const GROWL_THRESHOLD: f64 = 30.0;
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    // Service
    pub const KERNEL_PORT: u16 = 8765;
    pub const WORKER_COUNT: usize = 4;
    pub const WORKER_QUEUE_CAPACITY: usize = 256;

    // Perception
    pub const FIELD_TRUNCATION_LEN: usize = 500;
    pub const TRUNCATION_MARKER: &str = "… [truncated]";

    // Deduplication
    pub const DEDUP_WINDOW: Duration = Duration::from_secs(120);
    pub const DEDUP_CACHE_SIZE: usize = 512;

    // Timeouts
    pub const STORE_OP_TIMEOUT: Duration = Duration::from_secs(2);
    pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(1);
    pub const EXTERNAL_MODEL_TIMEOUT: Duration = Duration::from_secs(8);

    // Retry configuration (transient store failures)
    pub const MAX_RETRIES: usize = 3;
    pub const RETRY_BACKOFF_MS: [u64; 3] = [50, 150, 450];

    // Guidance side channel
    pub const GUIDANCE_STALENESS: Duration = Duration::from_secs(24 * 3600);

    // Learning
    pub const LEARNING_RATE_MIN: f64 = 0.1;
    pub const LEARNING_RATE_MAX: f64 = super::phi::INV_PHI_SQ;
    pub const EPSILON_START: f64 = 0.10;
    pub const EPSILON_FLOOR: f64 = 0.01;
    pub const WEIGHT_MODIFIER_MIN: f64 = 0.5;
    pub const WEIGHT_MODIFIER_MAX: f64 = 1.5;
    pub const THRESHOLD_DELTA_MAX: f64 = 10.0;
    pub const CYCLE_EVERY_POST_TOOL_EVENTS: u64 = 20;

    // Pattern promotion and merging
    pub const PROMOTION_MIN_OCCURRENCES: i64 = 13;
    pub const PROMOTION_MIN_CONFIDENCE: f64 = 0.5;
    pub const MERGE_SIMILARITY_THRESHOLD: f64 = 0.8;

    // Implicit feedback
    pub const SUGGESTION_WINDOW_SIZE: usize = 16;
    pub const IMPLICIT_FOLLOW_WINDOW: Duration = Duration::from_secs(60);

    // Session injection limits by experience level (new/learning/experienced/expert)
    pub const FACT_LIMITS: [usize; 4] = [50, 30, 15, 5];
    pub const REFLECTION_LIMITS: [usize; 4] = [10, 5, 3, 1];
    pub const FACT_MIN_CONFIDENCE: f64 = super::phi::INV_PHI_SQ;
}

/// Retention schedule for e-score history (hourly → 24 h, daily → 7 d,
/// weekly → 365 d, then deleted)
pub mod retention {
    pub const HOURLY_WINDOW_HOURS: i64 = 24;
    pub const DAILY_WINDOW_DAYS: i64 = 7;
    pub const WEEKLY_WINDOW_DAYS: i64 = 365;
}

/// Chain constants
pub mod chain {
    /// `prev_hash` of the genesis block
    pub const GENESIS_PREV_HASH: &str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// Tools the host hook will actually deny on a BARK
pub mod guard {
    pub const GUARDED_TOOLS: [&str; 3] = ["Bash", "Edit", "Write"];
}

/// The confirm phrase gating destructive reset
pub const RESET_CONFIRM_PHRASE: &str = "BURN_IT_ALL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phi_identities() {
        assert!((phi::PHI * phi::INV_PHI - 1.0).abs() < 1e-12);
        assert!((phi::INV_PHI * phi::INV_PHI - phi::INV_PHI_SQ).abs() < 1e-12);
    }

    #[test]
    fn test_verdict_thresholds_are_ordered() {
        assert!(verdicts::HOWL_THRESHOLD > verdicts::WAG_THRESHOLD);
        assert!(verdicts::WAG_THRESHOLD > verdicts::GROWL_THRESHOLD);
        assert!((verdicts::HOWL_THRESHOLD - 61.803).abs() < 0.01);
    }

    #[test]
    fn test_genesis_hash_is_64_zeros() {
        assert_eq!(chain::GENESIS_PREV_HASH.len(), 64);
        assert!(chain::GENESIS_PREV_HASH.chars().all(|c| c == '0'));
    }

    #[test]
    fn test_learning_rate_bounds() {
        assert!(defaults::LEARNING_RATE_MIN < defaults::LEARNING_RATE_MAX);
        assert!((defaults::LEARNING_RATE_MAX - 0.382).abs() < 0.001);
    }
}
