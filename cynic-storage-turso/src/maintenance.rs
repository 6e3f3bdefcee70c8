//! Destructive maintenance: the confirm-gated reset

use tracing::warn;

use cynic_core::constants::RESET_CONFIRM_PHRASE;
use cynic_core::storage::ResetOutcome;
use cynic_core::{Error, Result};

use crate::TursoStore;

impl TursoStore {
    /// Truncate judgments, blocks, patterns, facts, feedback and sessions.
    ///
    /// The only fatal-by-design operation in the store. Requires the exact
    /// confirm phrase; anything else is rejected before any row is touched.
    pub async fn reset_rows(&self, confirm: &str) -> Result<ResetOutcome> {
        if confirm != RESET_CONFIRM_PHRASE {
            return Err(Error::DangerousReset);
        }
        warn!("confirmed reset: truncating all kernel tables");

        let conn = self.get_connection()?;
        let mut outcome = ResetOutcome::default();

        outcome.judgments = conn
            .execute("DELETE FROM judgments", ())
            .await
            .map_err(|e| Error::Storage(format!("reset judgments failed: {e}")))?;
        conn.execute("DELETE FROM judgments_fts", ())
            .await
            .map_err(|e| Error::Storage(format!("reset judgments_fts failed: {e}")))?;
        outcome.blocks = conn
            .execute("DELETE FROM blocks", ())
            .await
            .map_err(|e| Error::Storage(format!("reset blocks failed: {e}")))?;
        outcome.patterns = conn
            .execute("DELETE FROM patterns", ())
            .await
            .map_err(|e| Error::Storage(format!("reset patterns failed: {e}")))?;
        outcome.facts = conn
            .execute("DELETE FROM facts", ())
            .await
            .map_err(|e| Error::Storage(format!("reset facts failed: {e}")))?;
        conn.execute("DELETE FROM facts_fts", ())
            .await
            .map_err(|e| Error::Storage(format!("reset facts_fts failed: {e}")))?;
        outcome.feedback = conn
            .execute("DELETE FROM feedback", ())
            .await
            .map_err(|e| Error::Storage(format!("reset feedback failed: {e}")))?;
        outcome.sessions = conn
            .execute("DELETE FROM sessions", ())
            .await
            .map_err(|e| Error::Storage(format!("reset sessions failed: {e}")))?;
        conn.execute("DELETE FROM learning_cycles", ())
            .await
            .map_err(|e| Error::Storage(format!("reset cycles failed: {e}")))?;
        conn.execute("DELETE FROM escore_history", ())
            .await
            .map_err(|e| Error::Storage(format!("reset escore failed: {e}")))?;
        conn.execute("DELETE FROM psychology_snapshots", ())
            .await
            .map_err(|e| Error::Storage(format!("reset psychology failed: {e}")))?;
        conn.execute("DELETE FROM user_profiles", ())
            .await
            .map_err(|e| Error::Storage(format!("reset profiles failed: {e}")))?;

        warn!(
            judgments = outcome.judgments,
            blocks = outcome.blocks,
            patterns = outcome.patterns,
            "identity restart complete"
        );
        Ok(outcome)
    }

    /// Cheap liveness probe
    pub async fn healthy_probe(&self) -> bool {
        let Ok(conn) = self.get_connection() else {
            return false;
        };
        conn.query("SELECT 1", ()).await.is_ok()
    }
}
