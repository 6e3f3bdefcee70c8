//! `Store` trait implementation for `TursoStore`
//!
//! Write paths on the hot loop (judgments, blocks, feedback, patterns) are
//! wrapped in the transient-failure retry; reads surface their first error
//! to the caller, which degrades to SAFE mode on its own schedule.

use async_trait::async_trait;

use cynic_core::storage::{JudgmentFilter, JudgmentStats, ResetOutcome, Store};
use cynic_core::types::{
    Block, EScoreSnapshot, Fact, Feedback, Judgment, LearningCycle, Pattern, PsychologySnapshot,
    SessionSnapshot, UserLearningProfile,
};
use cynic_core::Result;

use crate::retry::with_retry;
use crate::TursoStore;

#[async_trait]
impl Store for TursoStore {
    async fn create_judgment(&self, judgment: &Judgment) -> Result<Judgment> {
        with_retry("create_judgment", || self.create_judgment_row(judgment)).await
    }

    async fn get_judgment(&self, judgment_id: &str) -> Result<Option<Judgment>> {
        self.get_judgment_row(judgment_id).await
    }

    async fn find_judgments(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>> {
        self.find_judgment_rows(filter).await
    }

    async fn judgment_stats(&self, filter: &JudgmentFilter) -> Result<JudgmentStats> {
        self.judgment_stats_rows(filter).await
    }

    async fn find_similar_judgments(&self, item_hash: &str, limit: usize) -> Result<Vec<Judgment>> {
        self.find_similar_judgment_rows(item_hash, limit).await
    }

    async fn orphan_judgments(&self, limit: usize) -> Result<Vec<Judgment>> {
        self.orphan_judgment_rows(limit).await
    }

    async fn create_block(&self, block: &Block) -> Result<()> {
        with_retry("create_block", || self.create_block_row(block)).await
    }

    async fn head_block(&self) -> Result<Option<Block>> {
        self.head_block_row().await
    }

    async fn block_by_number(&self, number: i64) -> Result<Option<Block>> {
        self.block_by_number_row(number).await
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Option<Block>> {
        self.block_by_hash_row(hash).await
    }

    async fn blocks_since(&self, number: i64, limit: usize) -> Result<Vec<Block>> {
        self.blocks_since_rows(number, limit).await
    }

    async fn upsert_pattern(&self, pattern: &Pattern) -> Result<Pattern> {
        with_retry("upsert_pattern", || self.upsert_pattern_row(pattern)).await
    }

    async fn find_pattern(
        &self,
        pattern_type: &str,
        pattern_key: &str,
    ) -> Result<Option<Pattern>> {
        self.find_pattern_row(pattern_type, pattern_key).await
    }

    async fn patterns_by_type(&self, pattern_type: &str, limit: usize) -> Result<Vec<Pattern>> {
        self.patterns_by_type_rows(pattern_type, limit).await
    }

    async fn top_patterns(&self, limit: usize) -> Result<Vec<Pattern>> {
        self.top_pattern_rows(limit).await
    }

    async fn merge_patterns(&self, source_ids: &[String], target_id: &str) -> Result<()> {
        self.merge_pattern_rows(source_ids, target_id).await
    }

    async fn similar_patterns(
        &self,
        pattern_type: &str,
        pattern_key: &str,
        threshold: f64,
    ) -> Result<Vec<Pattern>> {
        self.similar_pattern_rows(pattern_type, pattern_key, threshold)
            .await
    }

    async fn set_pattern_promotion(&self, pattern_id: &str, promoted: bool) -> Result<()> {
        self.set_pattern_promotion_row(pattern_id, promoted).await
    }

    async fn create_fact(&self, fact: &Fact) -> Result<Fact> {
        with_retry("create_fact", || self.create_fact_row(fact)).await
    }

    async fn search_facts(&self, user_id: &str, query: &str, limit: usize) -> Result<Vec<Fact>> {
        self.search_fact_rows(user_id, query, limit).await
    }

    async fn facts_by_user(
        &self,
        user_id: &str,
        min_confidence: f64,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        self.facts_by_user_rows(user_id, min_confidence, limit).await
    }

    async fn record_fact_access(&self, fact_id: &str) -> Result<()> {
        self.record_fact_access_row(fact_id).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserLearningProfile>> {
        self.get_profile_row(user_id).await
    }

    async fn upsert_profile(&self, profile: &UserLearningProfile) -> Result<()> {
        with_retry("upsert_profile", || self.upsert_profile_row(profile)).await
    }

    async fn create_feedback(&self, feedback: &Feedback) -> Result<()> {
        with_retry("create_feedback", || self.create_feedback_row(feedback)).await
    }

    async fn unapplied_feedback(&self, limit: usize) -> Result<Vec<Feedback>> {
        self.unapplied_feedback_rows(limit).await
    }

    async fn mark_feedback_applied(&self, feedback_ids: &[String]) -> Result<()> {
        self.mark_feedback_applied_rows(feedback_ids).await
    }

    async fn record_cycle(&self, cycle: &LearningCycle) -> Result<()> {
        with_retry("record_cycle", || self.record_cycle_row(cycle)).await
    }

    async fn last_cycle(&self) -> Result<Option<LearningCycle>> {
        self.last_cycle_row().await
    }

    async fn record_escore(&self, snapshot: &EScoreSnapshot) -> Result<()> {
        self.record_escore_row(snapshot).await
    }

    async fn cleanup_escore_history(&self) -> Result<u64> {
        self.cleanup_escore_history_rows().await
    }

    async fn record_session(&self, snapshot: &SessionSnapshot) -> Result<()> {
        with_retry("record_session", || self.record_session_row(snapshot)).await
    }

    async fn session_count(&self, user_id: &str) -> Result<i64> {
        self.session_count_rows(user_id).await
    }

    async fn record_psychology(
        &self,
        user_id: &str,
        snapshot: &PsychologySnapshot,
    ) -> Result<()> {
        self.record_psychology_row(user_id, snapshot).await
    }

    async fn reset(&self, confirm: &str) -> Result<ResetOutcome> {
        self.reset_rows(confirm).await
    }

    async fn healthy(&self) -> bool {
        self.healthy_probe().await
    }
}
