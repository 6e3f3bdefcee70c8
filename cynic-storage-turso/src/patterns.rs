//! Pattern repository operations

use chrono::Utc;
use libsql::params;
use tracing::{debug, info};

use cynic_core::similarity::trigram_similarity;
use cynic_core::types::Pattern;
use cynic_core::{Error, Result};

use crate::rows::pattern_from_row;
use crate::TursoStore;

const PATTERN_COLUMNS: &str = "pattern_id, pattern_type, pattern_key, occurrence_count, \
     confidence, strength, weight_modifier, threshold_delta, trend_direction, trend_velocity, \
     merged_at, parent_ids, promoted_at, created_at, updated_at";

/// Candidate pool scanned per similarity query
const SIMILARITY_SCAN_LIMIT: usize = 200;

impl TursoStore {
    /// Insert or update by `(pattern_type, pattern_key)`
    pub async fn upsert_pattern_row(&self, pattern: &Pattern) -> Result<Pattern> {
        let conn = self.get_connection()?;
        let parent_ids = pattern
            .parent_ids
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let trend = serde_json::to_value(pattern.trend_direction)?
            .as_str()
            .unwrap_or("stable")
            .to_string();

        conn.execute(
            r#"
            INSERT INTO patterns (
                pattern_id, pattern_type, pattern_key, occurrence_count,
                confidence, strength, weight_modifier, threshold_delta,
                trend_direction, trend_velocity, merged_at, parent_ids,
                promoted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(pattern_type, pattern_key) DO UPDATE SET
                occurrence_count = excluded.occurrence_count,
                confidence = excluded.confidence,
                strength = excluded.strength,
                weight_modifier = excluded.weight_modifier,
                threshold_delta = excluded.threshold_delta,
                trend_direction = excluded.trend_direction,
                trend_velocity = excluded.trend_velocity,
                merged_at = excluded.merged_at,
                parent_ids = excluded.parent_ids,
                promoted_at = excluded.promoted_at,
                updated_at = excluded.updated_at
            "#,
            params![
                pattern.pattern_id.clone(),
                pattern.pattern_type.clone(),
                pattern.pattern_key.clone(),
                pattern.occurrence_count,
                pattern.confidence,
                pattern.strength,
                pattern.weight_modifier,
                pattern.threshold_delta,
                trend,
                pattern.trend_velocity,
                pattern.merged_at.map(|t| t.timestamp()),
                parent_ids,
                pattern.promoted_at.map(|t| t.timestamp()),
                pattern.created_at.timestamp(),
                pattern.updated_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to upsert pattern: {e}")))?;

        // Read back so the caller sees the surviving pattern_id on conflict
        self.find_pattern_row(&pattern.pattern_type, &pattern.pattern_key)
            .await?
            .ok_or_else(|| Error::Storage("pattern vanished after upsert".to_string()))
    }

    pub async fn find_pattern_row(
        &self,
        pattern_type: &str,
        pattern_key: &str,
    ) -> Result<Option<Pattern>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns WHERE pattern_type = ? AND pattern_key = ?"
        );
        let mut rows = conn
            .query(&sql, params![pattern_type, pattern_key])
            .await
            .map_err(|e| Error::Storage(format!("failed to query pattern: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch pattern: {e}")))?
        {
            Some(row) => Ok(Some(pattern_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Active patterns of one type, highest confidence first
    pub async fn patterns_by_type_rows(
        &self,
        pattern_type: &str,
        limit: usize,
    ) -> Result<Vec<Pattern>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns \
             WHERE pattern_type = ? AND merged_at IS NULL \
             ORDER BY confidence DESC, updated_at DESC LIMIT {}",
            limit.min(1000)
        );
        let mut rows = conn
            .query(&sql, params![pattern_type])
            .await
            .map_err(|e| Error::Storage(format!("failed to query patterns: {e}")))?;
        let mut patterns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch pattern row: {e}")))?
        {
            patterns.push(pattern_from_row(&row)?);
        }
        Ok(patterns)
    }

    /// Active patterns across all types by confidence and recency
    pub async fn top_pattern_rows(&self, limit: usize) -> Result<Vec<Pattern>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {PATTERN_COLUMNS} FROM patterns WHERE merged_at IS NULL \
             ORDER BY confidence DESC, updated_at DESC LIMIT {}",
            limit.min(1000)
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::Storage(format!("failed to query top patterns: {e}")))?;
        let mut patterns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch top pattern: {e}")))?
        {
            patterns.push(pattern_from_row(&row)?);
        }
        Ok(patterns)
    }

    /// Absorb sources into the target, transactionally and idempotently.
    ///
    /// Sources already merged are skipped; the target's `parent_ids` grows
    /// by exactly the sources actually absorbed this call.
    pub async fn merge_pattern_rows(&self, source_ids: &[String], target_id: &str) -> Result<()> {
        let source_ids = source_ids.to_vec();
        let source_count = source_ids.len();
        let target_id = target_id.to_string();
        let target_label = target_id.clone();
        let now = Utc::now().timestamp();

        self.in_transaction(move |conn| async move {
            let mut absorbed = Vec::new();
            for source_id in &source_ids {
                if source_id == &target_id {
                    continue;
                }
                let updated = conn
                    .execute(
                        "UPDATE patterns SET merged_at = ? \
                         WHERE pattern_id = ? AND merged_at IS NULL",
                        params![now, source_id.clone()],
                    )
                    .await
                    .map_err(|e| Error::Storage(format!("failed to mark merged: {e}")))?;
                if updated > 0 {
                    absorbed.push(source_id.clone());
                }
            }
            if absorbed.is_empty() {
                debug!("merge was a no-op, all sources already merged");
                return Ok(());
            }

            let mut rows = conn
                .query(
                    "SELECT parent_ids FROM patterns WHERE pattern_id = ?",
                    params![target_id.clone()],
                )
                .await
                .map_err(|e| Error::Storage(format!("failed to read target: {e}")))?;
            let existing: Vec<String> = match rows
                .next()
                .await
                .map_err(|e| Error::Storage(format!("failed to fetch target: {e}")))?
            {
                Some(row) => {
                    let raw: Option<String> = row.get(0).ok();
                    raw.and_then(|r| serde_json::from_str(&r).ok())
                        .unwrap_or_default()
                }
                None => {
                    return Err(Error::NotFound(format!("merge target {target_id}")));
                }
            };

            let mut parents = existing;
            for id in absorbed {
                if !parents.contains(&id) {
                    parents.push(id);
                }
            }
            let parents_json = serde_json::to_string(&parents)?;
            conn.execute(
                "UPDATE patterns SET parent_ids = ?, updated_at = ? WHERE pattern_id = ?",
                params![parents_json, now, target_id.clone()],
            )
            .await
            .map_err(|e| Error::Storage(format!("failed to update target parents: {e}")))?;
            Ok(())
        })
        .await?;

        info!(target = %target_label, sources = source_count, "pattern merge complete");
        Ok(())
    }

    /// Same-type active patterns whose key similarity meets the threshold.
    ///
    /// Trigram similarity is computed in Rust over a bounded candidate
    /// pool, matching how the rest of the kernel does fuzzy matching.
    pub async fn similar_pattern_rows(
        &self,
        pattern_type: &str,
        pattern_key: &str,
        threshold: f64,
    ) -> Result<Vec<Pattern>> {
        let candidates = self
            .patterns_by_type_rows(pattern_type, SIMILARITY_SCAN_LIMIT)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|p| p.pattern_key != pattern_key)
            .filter(|p| trigram_similarity(&p.pattern_key, pattern_key) >= threshold)
            .collect())
    }

    /// Set or clear heuristic promotion
    pub async fn set_pattern_promotion_row(
        &self,
        pattern_id: &str,
        promoted: bool,
    ) -> Result<()> {
        let conn = self.get_connection()?;
        let promoted_at = promoted.then(|| Utc::now().timestamp());
        conn.execute(
            "UPDATE patterns SET promoted_at = ?, updated_at = ? WHERE pattern_id = ?",
            params![promoted_at, Utc::now().timestamp(), pattern_id],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to set promotion: {e}")))?;
        Ok(())
    }
}
