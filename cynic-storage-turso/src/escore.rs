//! E-score history and its 24 h / 7 d / 365 d retention schedule

use chrono::{Duration, Utc};
use libsql::params;
use tracing::info;

use cynic_core::constants::retention;
use cynic_core::types::EScoreSnapshot;
use cynic_core::{Error, Result};

use crate::TursoStore;

impl TursoStore {
    pub async fn record_escore_row(&self, snapshot: &EScoreSnapshot) -> Result<()> {
        let conn = self.get_connection()?;
        let dimensions = serde_json::to_string(&snapshot.dimensions)?;
        conn.execute(
            "INSERT INTO escore_history (user_id, e_score, dimensions, trigger_event, delta, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                snapshot.user_id.clone(),
                snapshot.e_score,
                dimensions,
                snapshot.trigger_event.clone(),
                snapshot.delta,
                snapshot.created_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to store e-score snapshot: {e}")))?;
        Ok(())
    }

    /// Apply the retention schedule:
    ///
    /// - within 24 h: only on-the-hour rows survive
    /// - 24 h – 7 d: only midnight rows survive
    /// - 7 d – 365 d: only Sunday-midnight rows survive
    /// - older than 365 d: deleted entirely
    ///
    /// Each surviving bucket keeps a unique representative (lowest id).
    /// Returns total rows deleted.
    pub async fn cleanup_escore_history_rows(&self) -> Result<u64> {
        let conn = self.get_connection()?;
        let now = Utc::now();
        let cutoff_hourly = (now - Duration::hours(retention::HOURLY_WINDOW_HOURS)).timestamp();
        let cutoff_daily = (now - Duration::days(retention::DAILY_WINDOW_DAYS)).timestamp();
        let cutoff_weekly = (now - Duration::days(retention::WEEKLY_WINDOW_DAYS)).timestamp();
        let mut deleted: u64 = 0;

        // Beyond 365 d: gone entirely
        deleted += conn
            .execute(
                "DELETE FROM escore_history WHERE created_at < ?",
                params![cutoff_weekly],
            )
            .await
            .map_err(|e| Error::Storage(format!("retention (weekly bound) failed: {e}")))?;

        // 7 d – 365 d: Sunday midnight only
        deleted += conn
            .execute(
                "DELETE FROM escore_history WHERE created_at < ? \
                 AND strftime('%w %H:%M:%S', created_at, 'unixepoch') != '0 00:00:00'",
                params![cutoff_daily],
            )
            .await
            .map_err(|e| Error::Storage(format!("retention (weekly band) failed: {e}")))?;

        // 24 h – 7 d: midnight only
        deleted += conn
            .execute(
                "DELETE FROM escore_history WHERE created_at < ? AND created_at >= ? \
                 AND strftime('%H:%M:%S', created_at, 'unixepoch') != '00:00:00'",
                params![cutoff_hourly, cutoff_daily],
            )
            .await
            .map_err(|e| Error::Storage(format!("retention (daily band) failed: {e}")))?;

        // Within 24 h: on-the-hour only
        deleted += conn
            .execute(
                "DELETE FROM escore_history WHERE created_at >= ? \
                 AND strftime('%M:%S', created_at, 'unixepoch') != '00:00'",
                params![cutoff_hourly],
            )
            .await
            .map_err(|e| Error::Storage(format!("retention (hourly band) failed: {e}")))?;

        // One representative per (user, timestamp) bucket
        deleted += conn
            .execute(
                "DELETE FROM escore_history WHERE id NOT IN \
                 (SELECT MIN(id) FROM escore_history GROUP BY user_id, created_at)",
                (),
            )
            .await
            .map_err(|e| Error::Storage(format!("retention (dedup) failed: {e}")))?;

        info!(deleted, "e-score retention sweep complete");
        Ok(deleted)
    }
}
