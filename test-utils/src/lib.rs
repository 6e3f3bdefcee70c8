//! # Test Utilities
//!
//! Shared fixtures for the kernel crates:
//! - observation and judgment builders
//! - a tempfile-backed store for integration tests

use chrono::Utc;
use serde_json::json;

use cynic_core::types::{
    HookEventKind, Judgment, JudgmentLevel, Observation, Reality, Verdict,
};

/// Build a minimal tool observation
pub fn tool_observation(tool_name: &str, content: &str) -> Observation {
    Observation {
        source: HookEventKind::PostToolUse,
        reality: Reality::Code,
        data: json!({"tool_name": tool_name, "content": content}),
        context: String::new(),
        run_judgment: true,
        level: JudgmentLevel::Reflex,
        session_id: Some("ses_test".to_string()),
        user_id: Some("usr_test".to_string()),
        received_at: Utc::now(),
    }
}

/// Build a judgment with a fixed id and content, for store tests
pub fn test_judgment(judgment_id: &str, content: &str) -> Judgment {
    let q_score = 70.0;
    Judgment {
        judgment_id: judgment_id.to_string(),
        user_id: Some("usr_test".to_string()),
        session_id: Some("ses_test".to_string()),
        item_type: "Bash".to_string(),
        item_content: content.to_string(),
        item_hash: cynic_core::ids::item_hash(content),
        q_score,
        confidence: 0.5,
        verdict: Verdict::from_q_score(q_score),
        axiom_scores: cynic_core::types::Axiom::ALL
            .iter()
            .map(|&a| (a, q_score))
            .collect(),
        dimension_scores: Default::default(),
        weaknesses: Vec::new(),
        context: json!({}),
        block_hash: None,
        block_number: None,
        prev_hash: None,
        refinement: None,
        created_at: Utc::now(),
    }
}

#[cfg(feature = "turso")]
pub mod store {
    use std::sync::Arc;

    use cynic_storage_turso::TursoStore;
    use tempfile::TempDir;

    /// A store backed by a scratch file that lives as long as the guard
    pub struct TempStore {
        pub store: Arc<TursoStore>,
        _dir: TempDir,
    }

    /// Open a fresh store in a temporary directory
    pub async fn temp_store() -> anyhow::Result<TempStore> {
        let dir = tempfile::tempdir()?;
        let store = TursoStore::open_local(&dir.path().join("kernel.db")).await?;
        Ok(TempStore {
            store: Arc::new(store),
            _dir: dir,
        })
    }
}
