//! Row → domain type conversion helpers

use chrono::{DateTime, TimeZone, Utc};
use libsql::Row;
use serde::de::DeserializeOwned;

use cynic_core::types::{
    Block, Fact, Feedback, Judgment, LearningCycle, Pattern, UserLearningProfile,
};
use cynic_core::{Error, Result};

pub(crate) fn ts_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

pub(crate) fn ts_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}

fn col_err(name: &str) -> impl FnOnce(libsql::Error) -> Error + '_ {
    move |e| Error::Storage(format!("column {name}: {e}"))
}

fn parse_json<T: DeserializeOwned>(raw: &str, name: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::Storage(format!("column {name} not valid JSON: {e}")))
}

/// Parse a TEXT enum column through its serde representation
pub(crate) fn enum_col<T: DeserializeOwned>(raw: &str, name: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| Error::Storage(format!("column {name} has unknown value {raw}: {e}")))
}

/// Column order must match `judgments::JUDGMENT_COLUMNS`
pub(crate) fn judgment_from_row(row: &Row) -> Result<Judgment> {
    let judgment_id: String = row.get(0).map_err(col_err("judgment_id"))?;
    let user_id: Option<String> = row.get(1).ok();
    let session_id: Option<String> = row.get(2).ok();
    let item_type: String = row.get(3).map_err(col_err("item_type"))?;
    let item_content: String = row.get(4).map_err(col_err("item_content"))?;
    let item_hash: String = row.get(5).map_err(col_err("item_hash"))?;
    let q_score: f64 = row.get(6).map_err(col_err("q_score"))?;
    let confidence: f64 = row.get(7).map_err(col_err("confidence"))?;
    let verdict_raw: String = row.get(8).map_err(col_err("verdict"))?;
    let axiom_scores_raw: String = row.get(9).map_err(col_err("axiom_scores"))?;
    let dimension_scores_raw: String = row.get(10).map_err(col_err("dimension_scores"))?;
    let weaknesses_raw: String = row.get(11).map_err(col_err("weaknesses"))?;
    let context_raw: String = row.get(12).map_err(col_err("context"))?;
    let block_hash: Option<String> = row.get(13).ok();
    let block_number: Option<i64> = row.get(14).ok();
    let prev_hash: Option<String> = row.get(15).ok();
    let refinement_raw: Option<String> = row.get(16).ok();
    let created_at: i64 = row.get(17).map_err(col_err("created_at"))?;

    Ok(Judgment {
        judgment_id,
        user_id,
        session_id,
        item_type,
        item_content,
        item_hash,
        q_score,
        confidence,
        verdict: enum_col(&verdict_raw, "verdict")?,
        axiom_scores: parse_json(&axiom_scores_raw, "axiom_scores")?,
        dimension_scores: parse_json(&dimension_scores_raw, "dimension_scores")?,
        weaknesses: parse_json(&weaknesses_raw, "weaknesses")?,
        context: parse_json(&context_raw, "context")?,
        block_hash,
        block_number,
        prev_hash,
        refinement: refinement_raw
            .map(|raw| parse_json(&raw, "refinement"))
            .transpose()?,
        created_at: ts_secs(created_at),
    })
}

pub(crate) fn block_from_row(row: &Row) -> Result<Block> {
    let block_number: i64 = row.get(0).map_err(col_err("block_number"))?;
    let block_hash: String = row.get(1).map_err(col_err("block_hash"))?;
    let prev_hash: String = row.get(2).map_err(col_err("prev_hash"))?;
    let merkle_root: String = row.get(3).map_err(col_err("merkle_root"))?;
    let judgment_count: i64 = row.get(4).map_err(col_err("judgment_count"))?;
    let judgment_ids_raw: String = row.get(5).map_err(col_err("judgment_ids"))?;
    let timestamp_ms: i64 = row.get(6).map_err(col_err("timestamp_ms"))?;

    Ok(Block {
        block_number,
        block_hash,
        prev_hash,
        merkle_root,
        judgment_count: judgment_count as usize,
        judgment_ids: parse_json(&judgment_ids_raw, "judgment_ids")?,
        timestamp: ts_millis(timestamp_ms),
    })
}

pub(crate) fn pattern_from_row(row: &Row) -> Result<Pattern> {
    let pattern_id: String = row.get(0).map_err(col_err("pattern_id"))?;
    let pattern_type: String = row.get(1).map_err(col_err("pattern_type"))?;
    let pattern_key: String = row.get(2).map_err(col_err("pattern_key"))?;
    let occurrence_count: i64 = row.get(3).map_err(col_err("occurrence_count"))?;
    let confidence: f64 = row.get(4).map_err(col_err("confidence"))?;
    let strength: f64 = row.get(5).map_err(col_err("strength"))?;
    let weight_modifier: f64 = row.get(6).map_err(col_err("weight_modifier"))?;
    let threshold_delta: f64 = row.get(7).map_err(col_err("threshold_delta"))?;
    let trend_raw: String = row.get(8).map_err(col_err("trend_direction"))?;
    let trend_velocity: f64 = row.get(9).map_err(col_err("trend_velocity"))?;
    let merged_at: Option<i64> = row.get(10).ok();
    let parent_ids_raw: Option<String> = row.get(11).ok();
    let promoted_at: Option<i64> = row.get(12).ok();
    let created_at: i64 = row.get(13).map_err(col_err("created_at"))?;
    let updated_at: i64 = row.get(14).map_err(col_err("updated_at"))?;

    Ok(Pattern {
        pattern_id,
        pattern_type,
        pattern_key,
        occurrence_count,
        confidence,
        strength,
        weight_modifier,
        threshold_delta,
        trend_direction: enum_col(&trend_raw, "trend_direction")?,
        trend_velocity,
        merged_at: merged_at.map(ts_secs),
        parent_ids: parent_ids_raw
            .map(|raw| parse_json(&raw, "parent_ids"))
            .transpose()?,
        promoted_at: promoted_at.map(ts_secs),
        created_at: ts_secs(created_at),
        updated_at: ts_secs(updated_at),
    })
}

pub(crate) fn fact_from_row(row: &Row) -> Result<Fact> {
    let fact_id: String = row.get(0).map_err(col_err("fact_id"))?;
    let user_id: String = row.get(1).map_err(col_err("user_id"))?;
    let fact_type: String = row.get(2).map_err(col_err("fact_type"))?;
    let subject: String = row.get(3).map_err(col_err("subject"))?;
    let content: String = row.get(4).map_err(col_err("content"))?;
    let confidence: f64 = row.get(5).map_err(col_err("confidence"))?;
    let relevance: f64 = row.get(6).map_err(col_err("relevance"))?;
    let tags_raw: String = row.get(7).map_err(col_err("tags"))?;
    let access_count: i64 = row.get(8).map_err(col_err("access_count"))?;
    let created_at: i64 = row.get(9).map_err(col_err("created_at"))?;
    let last_accessed_at: Option<i64> = row.get(10).ok();

    Ok(Fact {
        fact_id,
        user_id,
        fact_type,
        subject,
        content,
        confidence,
        relevance,
        tags: parse_json(&tags_raw, "tags")?,
        access_count,
        created_at: ts_secs(created_at),
        last_accessed_at: last_accessed_at.map(ts_secs),
    })
}

pub(crate) fn profile_from_row(row: &Row) -> Result<UserLearningProfile> {
    let user_id: String = row.get(0).map_err(col_err("user_id"))?;
    let learning_rate: f64 = row.get(1).map_err(col_err("learning_rate"))?;
    let session_count: i64 = row.get(2).map_err(col_err("session_count"))?;
    let judgment_count: i64 = row.get(3).map_err(col_err("judgment_count"))?;
    let feedback_count: i64 = row.get(4).map_err(col_err("feedback_count"))?;
    let preferred_raw: String = row.get(5).map_err(col_err("preferred_dimensions"))?;
    let patterns_raw: String = row.get(6).map_err(col_err("judgment_patterns"))?;
    let feedback_bias: f64 = row.get(7).map_err(col_err("feedback_bias"))?;
    let correlation: f64 = row.get(8).map_err(col_err("escore_feedback_correlation"))?;
    let created_at: i64 = row.get(9).map_err(col_err("created_at"))?;
    let updated_at: i64 = row.get(10).map_err(col_err("updated_at"))?;

    Ok(UserLearningProfile {
        user_id,
        learning_rate,
        session_count,
        judgment_count,
        feedback_count,
        preferred_dimensions: parse_json(&preferred_raw, "preferred_dimensions")?,
        judgment_patterns: parse_json(&patterns_raw, "judgment_patterns")?,
        feedback_bias,
        escore_feedback_correlation: correlation,
        created_at: ts_secs(created_at),
        updated_at: ts_secs(updated_at),
    })
}

pub(crate) fn feedback_from_row(row: &Row) -> Result<Feedback> {
    let feedback_id: String = row.get(0).map_err(col_err("feedback_id"))?;
    let judgment_id: Option<String> = row.get(1).ok();
    let user_id: Option<String> = row.get(2).ok();
    let session_id: Option<String> = row.get(3).ok();
    let outcome_raw: String = row.get(4).map_err(col_err("outcome"))?;
    let rating: Option<i64> = row.get(5).ok();
    let actual_score: Option<f64> = row.get(6).ok();
    let reason: Option<String> = row.get(7).ok();
    let source_raw: String = row.get(8).map_err(col_err("source_type"))?;
    let source_context_raw: Option<String> = row.get(9).ok();
    let confidence: f64 = row.get(10).map_err(col_err("confidence"))?;
    let applied: i64 = row.get(11).map_err(col_err("applied"))?;
    let created_at: i64 = row.get(12).map_err(col_err("created_at"))?;

    Ok(Feedback {
        feedback_id,
        judgment_id,
        user_id,
        session_id,
        outcome: enum_col(&outcome_raw, "outcome")?,
        rating: rating.map(|r| r as u8),
        actual_score,
        reason,
        source_type: enum_col(&source_raw, "source_type")?,
        source_context: source_context_raw
            .map(|raw| parse_json(&raw, "source_context"))
            .transpose()?,
        confidence,
        applied: applied != 0,
        created_at: ts_secs(created_at),
    })
}

pub(crate) fn cycle_from_row(row: &Row) -> Result<LearningCycle> {
    let cycle_id: String = row.get(0).map_err(col_err("cycle_id"))?;
    let feedback_processed: i64 = row.get(1).map_err(col_err("feedback_processed"))?;
    let patterns_updated: i64 = row.get(2).map_err(col_err("patterns_updated"))?;
    let patterns_merged: i64 = row.get(3).map_err(col_err("patterns_merged"))?;
    let weights_adjusted: i64 = row.get(4).map_err(col_err("weights_adjusted"))?;
    let thresholds_adjusted: i64 = row.get(5).map_err(col_err("thresholds_adjusted"))?;
    let avg_weight_delta: f64 = row.get(6).map_err(col_err("avg_weight_delta"))?;
    let avg_threshold_delta: f64 = row.get(7).map_err(col_err("avg_threshold_delta"))?;
    let duration_ms: i64 = row.get(8).map_err(col_err("duration_ms"))?;
    let created_at: i64 = row.get(9).map_err(col_err("created_at"))?;

    Ok(LearningCycle {
        cycle_id,
        feedback_processed: feedback_processed as u64,
        patterns_updated: patterns_updated as u64,
        patterns_merged: patterns_merged as u64,
        weights_adjusted: weights_adjusted as u64,
        thresholds_adjusted: thresholds_adjusted as u64,
        avg_weight_delta,
        avg_threshold_delta,
        duration_ms: duration_ms as u64,
        created_at: ts_secs(created_at),
    })
}
