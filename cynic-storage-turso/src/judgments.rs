//! Judgment repository operations

use chrono::Utc;
use libsql::params;
use tracing::{debug, info};

use cynic_core::constants::defaults;
use cynic_core::storage::{JudgmentFilter, JudgmentStats};
use cynic_core::types::Judgment;
use cynic_core::{Error, Result};

use crate::rows::judgment_from_row;
use crate::TursoStore;

pub(crate) const JUDGMENT_COLUMNS: &str = "judgment_id, user_id, session_id, item_type, \
     item_content, item_hash, q_score, confidence, verdict, axiom_scores, dimension_scores, \
     weaknesses, context, block_hash, block_number, prev_hash, refinement, created_at";

impl TursoStore {
    /// Insert a judgment, deduplicating on `(item_hash, session_id)` inside
    /// the dedup window. Returns the stored row (the existing one on dedup).
    pub async fn create_judgment_row(&self, judgment: &Judgment) -> Result<Judgment> {
        let conn = self.get_connection()?;

        if let Some(session_id) = &judgment.session_id {
            let window_start =
                (Utc::now() - defaults::DEDUP_WINDOW).timestamp();
            let sql = format!(
                "SELECT {JUDGMENT_COLUMNS} FROM judgments \
                 WHERE item_hash = ? AND session_id = ? AND created_at >= ? \
                 ORDER BY created_at DESC LIMIT 1"
            );
            let mut rows = conn
                .query(
                    &sql,
                    params![judgment.item_hash.clone(), session_id.clone(), window_start],
                )
                .await
                .map_err(|e| Error::Storage(format!("dedup lookup failed: {e}")))?;
            if let Some(row) = rows
                .next()
                .await
                .map_err(|e| Error::Storage(format!("dedup fetch failed: {e}")))?
            {
                let existing = judgment_from_row(&row)?;
                debug!(
                    judgment_id = %existing.judgment_id,
                    "duplicate judgment within dedup window, returning existing"
                );
                return Ok(existing);
            }
        }

        let sql = r#"
            INSERT INTO judgments (
                judgment_id, user_id, session_id, item_type, item_content,
                item_hash, q_score, confidence, verdict, axiom_scores,
                dimension_scores, weaknesses, context, block_hash,
                block_number, prev_hash, refinement, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let axiom_scores = serde_json::to_string(&judgment.axiom_scores)?;
        let dimension_scores = serde_json::to_string(&judgment.dimension_scores)?;
        let weaknesses = serde_json::to_string(&judgment.weaknesses)?;
        let context = serde_json::to_string(&judgment.context)?;
        let refinement = judgment
            .refinement
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            sql,
            params![
                judgment.judgment_id.clone(),
                judgment.user_id.clone(),
                judgment.session_id.clone(),
                judgment.item_type.clone(),
                judgment.item_content.clone(),
                judgment.item_hash.clone(),
                judgment.q_score,
                judgment.confidence,
                judgment.verdict.as_str(),
                axiom_scores,
                dimension_scores,
                weaknesses,
                context,
                judgment.block_hash.clone(),
                judgment.block_number,
                judgment.prev_hash.clone(),
                refinement,
                judgment.created_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store judgment: {e}")))?;

        conn.execute(
            "INSERT INTO judgments_fts (judgment_id, item_content) VALUES (?, ?)",
            params![judgment.judgment_id.clone(), judgment.item_content.clone()],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to index judgment: {e}")))?;

        info!(judgment_id = %judgment.judgment_id, "stored judgment");
        Ok(judgment.clone())
    }

    pub async fn get_judgment_row(&self, judgment_id: &str) -> Result<Option<Judgment>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {JUDGMENT_COLUMNS} FROM judgments WHERE judgment_id = ?");
        let mut rows = conn
            .query(&sql, params![judgment_id])
            .await
            .map_err(|e| Error::Storage(format!("failed to query judgment: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch judgment: {e}")))?
        {
            Some(row) => Ok(Some(judgment_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_judgment_rows(&self, filter: &JudgmentFilter) -> Result<Vec<Judgment>> {
        let conn = self.get_connection()?;
        let (mut sql, mut params_vec) = filter_clause(filter);
        push_query_clause(&mut sql, &mut params_vec, filter.query.as_deref());
        sql.push_str(" ORDER BY created_at DESC");
        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            filter.limit.min(1000),
            filter.offset
        ));

        let mut rows = conn
            .query(&sql, libsql::params_from_iter(params_vec))
            .await
            .map_err(|e| Error::Storage(format!("failed to query judgments: {e}")))?;

        let mut judgments = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch judgment row: {e}")))?
        {
            judgments.push(judgment_from_row(&row)?);
        }
        debug!(count = judgments.len(), "judgment query complete");
        Ok(judgments)
    }

    pub async fn judgment_stats_rows(&self, filter: &JudgmentFilter) -> Result<JudgmentStats> {
        let conn = self.get_connection()?;
        let (mut base, mut params_vec) = filter_clause_for(
            "SELECT COUNT(*), COALESCE(AVG(q_score), 0), COALESCE(AVG(confidence), 0), verdict \
             FROM judgments",
            filter,
        );
        push_query_clause(&mut base, &mut params_vec, filter.query.as_deref());
        let sql = format!("{base} GROUP BY verdict");

        let mut rows = conn
            .query(&sql, libsql::params_from_iter(params_vec))
            .await
            .map_err(|e| Error::Storage(format!("failed to query stats: {e}")))?;

        let mut stats = JudgmentStats::default();
        let mut weighted_q = 0.0;
        let mut weighted_conf = 0.0;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch stats row: {e}")))?
        {
            let count: i64 = row.get(0).map_err(|e| Error::Storage(e.to_string()))?;
            let avg_q: f64 = row.get(1).map_err(|e| Error::Storage(e.to_string()))?;
            let avg_conf: f64 = row.get(2).map_err(|e| Error::Storage(e.to_string()))?;
            let verdict: String = row.get(3).map_err(|e| Error::Storage(e.to_string()))?;
            stats.total += count as u64;
            weighted_q += avg_q * count as f64;
            weighted_conf += avg_conf * count as f64;
            stats.verdict_counts.insert(verdict, count as u64);
        }
        if stats.total > 0 {
            stats.avg_q_score = weighted_q / stats.total as f64;
            stats.avg_confidence = weighted_conf / stats.total as f64;
        }
        Ok(stats)
    }

    pub async fn find_similar_judgment_rows(
        &self,
        item_hash: &str,
        limit: usize,
    ) -> Result<Vec<Judgment>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {JUDGMENT_COLUMNS} FROM judgments WHERE item_hash = ? \
             ORDER BY created_at DESC LIMIT {}",
            limit.min(100)
        );
        let mut rows = conn
            .query(&sql, params![item_hash])
            .await
            .map_err(|e| Error::Storage(format!("failed to query similar judgments: {e}")))?;
        let mut judgments = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch similar judgment: {e}")))?
        {
            judgments.push(judgment_from_row(&row)?);
        }
        Ok(judgments)
    }

    /// Judgments never sealed into a block, oldest first
    pub async fn orphan_judgment_rows(&self, limit: usize) -> Result<Vec<Judgment>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {JUDGMENT_COLUMNS} FROM judgments WHERE block_hash IS NULL \
             ORDER BY created_at ASC LIMIT {}",
            limit.min(1000)
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::Storage(format!("failed to query orphans: {e}")))?;
        let mut judgments = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch orphan: {e}")))?
        {
            judgments.push(judgment_from_row(&row)?);
        }
        Ok(judgments)
    }
}

/// Build `SELECT {cols} FROM judgments WHERE …` with positional params
fn filter_clause(filter: &JudgmentFilter) -> (String, Vec<String>) {
    filter_clause_for(
        &format!("SELECT {JUDGMENT_COLUMNS} FROM judgments"),
        filter,
    )
}

fn filter_clause_for(select: &str, filter: &JudgmentFilter) -> (String, Vec<String>) {
    let mut sql = format!("{select} WHERE 1=1");
    let mut params_vec = Vec::new();

    if let Some(user_id) = &filter.user_id {
        sql.push_str(" AND user_id = ?");
        params_vec.push(user_id.clone());
    }
    if let Some(session_id) = &filter.session_id {
        sql.push_str(" AND session_id = ?");
        params_vec.push(session_id.clone());
    }
    if let Some(verdict) = filter.verdict {
        sql.push_str(" AND verdict = ?");
        params_vec.push(verdict.as_str().to_string());
    }
    if let Some(item_type) = &filter.item_type {
        sql.push_str(" AND item_type = ?");
        params_vec.push(item_type.clone());
    }
    (sql, params_vec)
}

/// Append the text-search condition: FTS5 MATCH for plain word queries,
/// case-insensitive LIKE for anything carrying operator characters
fn push_query_clause(sql: &mut String, params_vec: &mut Vec<String>, query: Option<&str>) {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return;
    };
    let word_query = query
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || c == '_');
    if word_query {
        sql.push_str(
            " AND judgment_id IN \
             (SELECT judgment_id FROM judgments_fts WHERE judgments_fts MATCH ?)",
        );
        params_vec.push(query.to_string());
    } else {
        sql.push_str(" AND lower(item_content) LIKE ?");
        params_vec.push(format!("%{}%", query.to_lowercase()));
    }
}
