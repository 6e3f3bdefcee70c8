//! Fact repository operations

use chrono::Utc;
use libsql::params;
use tracing::debug;

use cynic_core::types::Fact;
use cynic_core::{Error, Result};

use crate::rows::fact_from_row;
use crate::TursoStore;

const FACT_COLUMNS: &str = "fact_id, user_id, fact_type, subject, content, confidence, \
     relevance, tags, access_count, created_at, last_accessed_at";

/// Relevance bump applied on each access
const ACCESS_RELEVANCE_BUMP: f64 = 0.02;

impl TursoStore {
    pub async fn create_fact_row(&self, fact: &Fact) -> Result<Fact> {
        let conn = self.get_connection()?;
        let tags = serde_json::to_string(&fact.tags)?;
        conn.execute(
            r#"
            INSERT INTO facts (
                fact_id, user_id, fact_type, subject, content, confidence,
                relevance, tags, access_count, created_at, last_accessed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                fact.fact_id.clone(),
                fact.user_id.clone(),
                fact.fact_type.clone(),
                fact.subject.clone(),
                fact.content.clone(),
                fact.confidence,
                fact.relevance,
                tags,
                fact.access_count,
                fact.created_at.timestamp(),
                fact.last_accessed_at.map(|t| t.timestamp()),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store fact: {e}")))?;

        conn.execute(
            "INSERT INTO facts_fts (fact_id, subject, content) VALUES (?, ?, ?)",
            params![fact.fact_id.clone(), fact.subject.clone(), fact.content.clone()],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to index fact: {e}")))?;

        Ok(fact.clone())
    }

    /// Full-text search over subject and content, ranked by
    /// `relevance × confidence`
    pub async fn search_fact_rows(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {FACT_COLUMNS} FROM facts \
             WHERE user_id = ? AND fact_id IN \
             (SELECT fact_id FROM facts_fts WHERE facts_fts MATCH ?) \
             ORDER BY relevance * confidence DESC LIMIT {}",
            limit.min(200)
        );
        let mut rows = conn
            .query(&sql, params![user_id, query])
            .await
            .map_err(|e| Error::Storage(format!("failed to search facts: {e}")))?;
        let mut facts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch fact row: {e}")))?
        {
            facts.push(fact_from_row(&row)?);
        }
        debug!(count = facts.len(), query, "fact search complete");
        Ok(facts)
    }

    /// A user's facts above the confidence floor, best retrieval score first
    pub async fn facts_by_user_rows(
        &self,
        user_id: &str,
        min_confidence: f64,
        limit: usize,
    ) -> Result<Vec<Fact>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {FACT_COLUMNS} FROM facts \
             WHERE user_id = ? AND confidence >= ? \
             ORDER BY relevance * confidence DESC LIMIT {}",
            limit.min(200)
        );
        let mut rows = conn
            .query(&sql, params![user_id, min_confidence])
            .await
            .map_err(|e| Error::Storage(format!("failed to query facts: {e}")))?;
        let mut facts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch fact row: {e}")))?
        {
            facts.push(fact_from_row(&row)?);
        }
        Ok(facts)
    }

    /// Bump access count and nudge relevance upward (capped at 1.0)
    pub async fn record_fact_access_row(&self, fact_id: &str) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            "UPDATE facts SET \
             access_count = access_count + 1, \
             relevance = min(1.0, relevance + ?), \
             last_accessed_at = ? \
             WHERE fact_id = ?",
            params![ACCESS_RELEVANCE_BUMP, Utc::now().timestamp(), fact_id],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to record fact access: {e}")))?;
        Ok(())
    }
}
