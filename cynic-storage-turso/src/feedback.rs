//! Feedback queue and learning-cycle audit operations

use libsql::params;
use tracing::debug;

use cynic_core::types::{Feedback, LearningCycle};
use cynic_core::{Error, Result};

use crate::rows::{cycle_from_row, feedback_from_row};
use crate::TursoStore;

const FEEDBACK_COLUMNS: &str = "feedback_id, judgment_id, user_id, session_id, outcome, \
     rating, actual_score, reason, source_type, source_context, confidence, applied, created_at";

const CYCLE_COLUMNS: &str = "cycle_id, feedback_processed, patterns_updated, patterns_merged, \
     weights_adjusted, thresholds_adjusted, avg_weight_delta, avg_threshold_delta, \
     duration_ms, created_at";

impl TursoStore {
    pub async fn create_feedback_row(&self, feedback: &Feedback) -> Result<()> {
        let conn = self.get_connection()?;
        let outcome = enum_text(&serde_json::to_value(feedback.outcome)?);
        let source_type = enum_text(&serde_json::to_value(feedback.source_type)?);
        let source_context = feedback
            .source_context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        conn.execute(
            r#"
            INSERT INTO feedback (
                feedback_id, judgment_id, user_id, session_id, outcome,
                rating, actual_score, reason, source_type, source_context,
                confidence, applied, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                feedback.feedback_id.clone(),
                feedback.judgment_id.clone(),
                feedback.user_id.clone(),
                feedback.session_id.clone(),
                outcome,
                feedback.rating.map(i64::from),
                feedback.actual_score,
                feedback.reason.clone(),
                source_type,
                source_context,
                feedback.confidence,
                i64::from(feedback.applied),
                feedback.created_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store feedback: {e}")))?;
        Ok(())
    }

    /// Unapplied feedback in `(created_at, feedback_id)` ascending order
    pub async fn unapplied_feedback_rows(&self, limit: usize) -> Result<Vec<Feedback>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE applied = 0 \
             ORDER BY created_at ASC, feedback_id ASC LIMIT {}",
            limit.min(1000)
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::Storage(format!("failed to query feedback: {e}")))?;
        let mut feedback = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch feedback row: {e}")))?
        {
            feedback.push(feedback_from_row(&row)?);
        }
        debug!(count = feedback.len(), "drained unapplied feedback");
        Ok(feedback)
    }

    pub async fn mark_feedback_applied_rows(&self, feedback_ids: &[String]) -> Result<()> {
        if feedback_ids.is_empty() {
            return Ok(());
        }
        let conn = self.get_connection()?;
        for feedback_id in feedback_ids {
            conn.execute(
                "UPDATE feedback SET applied = 1 WHERE feedback_id = ?",
                params![feedback_id.clone()],
            )
            .await
            .map_err(|e| Error::Storage(format!("failed to mark feedback applied: {e}")))?;
        }
        Ok(())
    }

    pub async fn record_cycle_row(&self, cycle: &LearningCycle) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            r#"
            INSERT INTO learning_cycles (
                cycle_id, feedback_processed, patterns_updated, patterns_merged,
                weights_adjusted, thresholds_adjusted, avg_weight_delta,
                avg_threshold_delta, duration_ms, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                cycle.cycle_id.clone(),
                cycle.feedback_processed as i64,
                cycle.patterns_updated as i64,
                cycle.patterns_merged as i64,
                cycle.weights_adjusted as i64,
                cycle.thresholds_adjusted as i64,
                cycle.avg_weight_delta,
                cycle.avg_threshold_delta,
                cycle.duration_ms as i64,
                cycle.created_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store cycle: {e}")))?;
        Ok(())
    }

    pub async fn last_cycle_row(&self) -> Result<Option<LearningCycle>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {CYCLE_COLUMNS} FROM learning_cycles ORDER BY created_at DESC LIMIT 1"
        );
        let mut rows = conn
            .query(&sql, ())
            .await
            .map_err(|e| Error::Storage(format!("failed to query last cycle: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch last cycle: {e}")))?
        {
            Some(row) => Ok(Some(cycle_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

/// Pull the bare string out of a serde-serialized unit enum
fn enum_text(value: &serde_json::Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}
