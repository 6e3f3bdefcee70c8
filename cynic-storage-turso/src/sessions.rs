//! Session snapshot and psychology repository operations

use libsql::params;

use cynic_core::types::{PsychologySnapshot, SessionSnapshot};
use cynic_core::{Error, Result};

use crate::TursoStore;

impl TursoStore {
    pub async fn record_session_row(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let conn = self.get_connection()?;
        let trend = serde_json::to_value(snapshot.trend)?
            .as_str()
            .unwrap_or("stable")
            .to_string();
        let handoff = serde_json::to_string(&snapshot.handoff)?;
        conn.execute(
            r#"
            INSERT INTO sessions (
                session_id, user_id, session_end_time, duration_ms,
                prompt_count, judgment_count, avg_q_score, trend, handoff
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                session_end_time = excluded.session_end_time,
                duration_ms = excluded.duration_ms,
                prompt_count = excluded.prompt_count,
                judgment_count = excluded.judgment_count,
                avg_q_score = excluded.avg_q_score,
                trend = excluded.trend,
                handoff = excluded.handoff
            "#,
            params![
                snapshot.session_id.clone(),
                snapshot.user_id.clone(),
                snapshot.session_end_time.timestamp(),
                snapshot.duration as i64,
                snapshot.prompt_count as i64,
                snapshot.judgment_count as i64,
                snapshot.avg_q_score,
                trend,
                handoff,
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store session: {e}")))?;
        Ok(())
    }

    pub async fn session_count_rows(&self, user_id: &str) -> Result<i64> {
        let conn = self.get_connection()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sessions WHERE user_id = ?",
                params![user_id],
            )
            .await
            .map_err(|e| Error::Storage(format!("failed to count sessions: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch session count: {e}")))?
        {
            Some(row) => row.get(0).map_err(|e| Error::Storage(e.to_string())),
            None => Ok(0),
        }
    }

    pub async fn record_psychology_row(
        &self,
        user_id: &str,
        snapshot: &PsychologySnapshot,
    ) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute(
            r#"
            INSERT INTO psychology_snapshots (
                user_id, energy, focus, creativity, frustration,
                burnout, flow, work_done, error_count, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                snapshot.energy,
                snapshot.focus,
                snapshot.creativity,
                snapshot.frustration,
                snapshot.burnout,
                snapshot.flow,
                snapshot.work_done,
                snapshot.error_count as i64,
                snapshot.created_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store psychology snapshot: {e}")))?;
        Ok(())
    }
}
