//! User learning profile repository operations

use libsql::params;

use cynic_core::types::UserLearningProfile;
use cynic_core::{Error, Result};

use crate::rows::profile_from_row;
use crate::TursoStore;

const PROFILE_COLUMNS: &str = "user_id, learning_rate, session_count, judgment_count, \
     feedback_count, preferred_dimensions, judgment_patterns, feedback_bias, \
     escore_feedback_correlation, created_at, updated_at";

impl TursoStore {
    pub async fn get_profile_row(&self, user_id: &str) -> Result<Option<UserLearningProfile>> {
        let conn = self.get_connection()?;
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?");
        let mut rows = conn
            .query(&sql, params![user_id])
            .await
            .map_err(|e| Error::Storage(format!("failed to query profile: {e}")))?;
        match rows
            .next()
            .await
            .map_err(|e| Error::Storage(format!("failed to fetch profile: {e}")))?
        {
            Some(row) => Ok(Some(profile_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Upsert the profile. The learning rate is clamped to [0.1, 0.382]
    /// here so no out-of-band value ever reaches a row.
    pub async fn upsert_profile_row(&self, profile: &UserLearningProfile) -> Result<()> {
        let conn = self.get_connection()?;
        let learning_rate = UserLearningProfile::clamp_learning_rate(profile.learning_rate);
        let preferred = serde_json::to_string(&profile.preferred_dimensions)?;
        let patterns = serde_json::to_string(&profile.judgment_patterns)?;

        conn.execute(
            r#"
            INSERT INTO user_profiles (
                user_id, learning_rate, session_count, judgment_count,
                feedback_count, preferred_dimensions, judgment_patterns,
                feedback_bias, escore_feedback_correlation, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                learning_rate = excluded.learning_rate,
                session_count = excluded.session_count,
                judgment_count = excluded.judgment_count,
                feedback_count = excluded.feedback_count,
                preferred_dimensions = excluded.preferred_dimensions,
                judgment_patterns = excluded.judgment_patterns,
                feedback_bias = excluded.feedback_bias,
                escore_feedback_correlation = excluded.escore_feedback_correlation,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.user_id.clone(),
                learning_rate,
                profile.session_count,
                profile.judgment_count,
                profile.feedback_count,
                preferred,
                patterns,
                profile.feedback_bias,
                profile.escore_feedback_correlation,
                profile.created_at.timestamp(),
                profile.updated_at.timestamp(),
            ],
        )
        .await
        .map_err(|e| Error::Storage(format!("failed to upsert profile: {e}")))?;
        Ok(())
    }
}
