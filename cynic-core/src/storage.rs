//! # Storage Abstraction
//!
//! The durable store owns every persisted row. Components interact with it
//! only through this trait so the kernel can run against the libSQL backend
//! in production and degrade to no-op persistence in SAFE mode.
//!
//! All operations are transactional at single-operation granularity; no
//! cross-table transaction spans an HTTP call. `NotFound` is `Ok(None)`,
//! never an error.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{
    Block, EScoreSnapshot, Fact, Feedback, Judgment, LearningCycle, Pattern, PsychologySnapshot,
    SessionSnapshot, UserLearningProfile, Verdict,
};

/// Filters for judgment queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentFilter {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub verdict: Option<Verdict>,
    pub item_type: Option<String>,
    /// Case-insensitive substring or FTS match over item content
    pub query: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for JudgmentFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            session_id: None,
            verdict: None,
            item_type: None,
            query: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Aggregates over a judgment set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JudgmentStats {
    pub total: u64,
    pub avg_q_score: f64,
    pub avg_confidence: f64,
    pub verdict_counts: BTreeMap<String, u64>,
}

/// Row counts removed by a confirmed reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResetOutcome {
    pub judgments: u64,
    pub blocks: u64,
    pub patterns: u64,
    pub facts: u64,
    pub feedback: u64,
    pub sessions: u64,
}

/// Durable storage backend for the kernel.
///
/// The Judge creates judgment rows and never updates them; the Chain updates
/// only the block-link columns; the Learner persists snapshots of otherwise
/// in-memory state. Blocks have no update or delete operation by design of
/// this trait.
#[async_trait]
pub trait Store: Send + Sync {
    // ========== Judgments ==========

    /// Persist a judgment. If a judgment with the same `item_hash` and
    /// session already exists inside the dedup window, the existing row is
    /// returned and nothing is written.
    async fn create_judgment(&self, judgment: &Judgment) -> Result<Judgment>;

    async fn get_judgment(&self, judgment_id: &str) -> Result<Option<Judgment>>;

    async fn find_judgments(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>>;

    async fn judgment_stats(&self, filter: &JudgmentFilter) -> Result<JudgmentStats>;

    /// Judgments sharing the same content hash, newest first
    async fn find_similar_judgments(&self, item_hash: &str, limit: usize) -> Result<Vec<Judgment>>;

    /// Judgments not yet sealed into any block, oldest first
    async fn orphan_judgments(&self, limit: usize) -> Result<Vec<Judgment>>;

    // ========== Blocks ==========

    /// Insert a sealed block and link its judgments, in one transaction.
    ///
    /// A `block_number` collision is a silent no-op (ON CONFLICT DO
    /// NOTHING); callers treat that as success. Judgments whose
    /// `block_hash` is already set are left untouched.
    async fn create_block(&self, block: &Block) -> Result<()>;

    async fn head_block(&self) -> Result<Option<Block>>;

    async fn block_by_number(&self, number: i64) -> Result<Option<Block>>;

    async fn block_by_hash(&self, hash: &str) -> Result<Option<Block>>;

    /// Blocks with `block_number >= number`, ascending
    async fn blocks_since(&self, number: i64, limit: usize) -> Result<Vec<Block>>;

    // ========== Patterns ==========

    /// Insert or update by `(pattern_type, pattern_key)`; returns the row
    /// as stored
    async fn upsert_pattern(&self, pattern: &Pattern) -> Result<Pattern>;

    async fn find_pattern(&self, pattern_type: &str, pattern_key: &str)
        -> Result<Option<Pattern>>;

    /// Active (unmerged) patterns of one type, highest confidence first
    async fn patterns_by_type(&self, pattern_type: &str, limit: usize) -> Result<Vec<Pattern>>;

    /// Active patterns across types ranked by confidence and recency
    async fn top_patterns(&self, limit: usize) -> Result<Vec<Pattern>>;

    /// Absorb `source_ids` into `target_id`: sets `merged_at` on sources
    /// and extends the target's `parent_ids`, transactionally. Already
    /// merged sources are skipped (idempotent).
    async fn merge_patterns(&self, source_ids: &[String], target_id: &str) -> Result<()>;

    /// Active same-type patterns whose key trigram-similarity meets the
    /// threshold, excluding the key itself
    async fn similar_patterns(
        &self,
        pattern_type: &str,
        pattern_key: &str,
        threshold: f64,
    ) -> Result<Vec<Pattern>>;

    /// Set or clear `promoted_at` (heuristic promotion/demotion)
    async fn set_pattern_promotion(&self, pattern_id: &str, promoted: bool) -> Result<()>;

    // ========== Facts ==========

    async fn create_fact(&self, fact: &Fact) -> Result<Fact>;

    /// Full-text search ranked by `relevance × confidence`
    async fn search_facts(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<Fact>>;

    async fn facts_by_user(
        &self,
        user_id: &str,
        min_confidence: f64,
        limit: usize,
    ) -> Result<Vec<Fact>>;

    /// Bump `access_count` and nudge `relevance` upward
    async fn record_fact_access(&self, fact_id: &str) -> Result<()>;

    // ========== Profiles ==========

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserLearningProfile>>;

    /// Upsert; `learning_rate` is clamped to [0.1, 0.382] at this boundary
    async fn upsert_profile(&self, profile: &UserLearningProfile) -> Result<()>;

    // ========== Feedback ==========

    async fn create_feedback(&self, feedback: &Feedback) -> Result<()>;

    /// Unapplied feedback in `(created_at, id)` ascending order
    async fn unapplied_feedback(&self, limit: usize) -> Result<Vec<Feedback>>;

    async fn mark_feedback_applied(&self, feedback_ids: &[String]) -> Result<()>;

    // ========== Learning cycles ==========

    async fn record_cycle(&self, cycle: &LearningCycle) -> Result<()>;

    async fn last_cycle(&self) -> Result<Option<LearningCycle>>;

    // ========== E-score history ==========

    async fn record_escore(&self, snapshot: &EScoreSnapshot) -> Result<()>;

    /// Apply the 24 h / 7 d / 365 d retention schedule; returns rows deleted
    async fn cleanup_escore_history(&self) -> Result<u64>;

    // ========== Sessions ==========

    async fn record_session(&self, snapshot: &SessionSnapshot) -> Result<()>;

    async fn session_count(&self, user_id: &str) -> Result<i64>;

    async fn record_psychology(
        &self,
        user_id: &str,
        snapshot: &PsychologySnapshot,
    ) -> Result<()>;

    // ========== Maintenance ==========

    /// Destructive truncation of judgments, blocks, patterns, facts,
    /// feedback and sessions. Requires the exact confirm phrase
    /// `BURN_IT_ALL`; anything else fails with `DangerousReset`.
    async fn reset(&self, confirm: &str) -> Result<ResetOutcome>;

    /// Cheap liveness probe used by boot-mode selection and `/health`
    async fn healthy(&self) -> bool;
}
