//! Self-judgment: the kernel judging changes to its own code
//!
//! When a tool event touches the kernel's own source, the full dimension
//! pass always runs and a risk scan looks for recursion hazards. A critical
//! risk lowers the verdict one step.

use serde::{Deserialize, Serialize};

use crate::types::Observation;

/// Path fragments that mark the kernel's own source tree
const SELF_PATHS: [&str; 4] = ["cynic-core", "cynic-kernel", "cynic-storage", ".cynic/"];

/// A detected risk in a self-modifying change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRisk {
    pub kind: SelfRiskKind,
    pub detail: String,
    pub critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfRiskKind {
    /// The judge judging its own judging path
    FractalRecursion,
    /// Content referencing the module that evaluates it
    SelfReferenceCycle,
    /// Changes near the hash chain or block sealing
    ChainTampering,
    /// Changes to reward or posterior update paths
    LearnerPoisoning,
}

/// Whether this observation modifies the kernel itself
pub fn is_self_modification(obs: &Observation) -> bool {
    let path = obs
        .data
        .get("file_path")
        .or_else(|| obs.data.get("path"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    SELF_PATHS.iter().any(|fragment| path.contains(fragment))
}

/// Scan a self-modifying change for recursion and tampering risks
pub fn scan_risks(obs: &Observation) -> Vec<SelfRisk> {
    let content = obs.content();
    let lower = content.to_lowercase();
    let mut risks = Vec::new();

    if lower.contains("judge") && (lower.contains("judge_self") || lower.contains("self_judgment"))
    {
        risks.push(SelfRisk {
            kind: SelfRiskKind::FractalRecursion,
            detail: "change touches the self-judgment path itself".to_string(),
            critical: true,
        });
    }

    if lower.contains("block_hash") || lower.contains("merkle") || lower.contains("prev_hash") {
        risks.push(SelfRisk {
            kind: SelfRiskKind::ChainTampering,
            detail: "change touches chain sealing fields".to_string(),
            critical: true,
        });
    }

    if lower.contains("reward") && (lower.contains("alpha") || lower.contains("posterior")) {
        risks.push(SelfRisk {
            kind: SelfRiskKind::LearnerPoisoning,
            detail: "change touches posterior update paths".to_string(),
            critical: false,
        });
    }

    if lower.contains("observation") && lower.contains("observe(") {
        risks.push(SelfRisk {
            kind: SelfRiskKind::SelfReferenceCycle,
            detail: "observer observing its own observation path".to_string(),
            critical: false,
        });
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HookEventKind, JudgmentLevel, Reality};
    use serde_json::json;

    fn obs(data: serde_json::Value) -> Observation {
        Observation {
            source: HookEventKind::PostToolUse,
            reality: Reality::Code,
            data,
            context: String::new(),
            run_judgment: true,
            level: JudgmentLevel::Reflex,
            session_id: None,
            user_id: None,
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_detects_own_source_paths() {
        assert!(is_self_modification(&obs(
            json!({"file_path": "cynic-core/src/judge/mod.rs"})
        )));
        assert!(is_self_modification(&obs(json!({"path": "/home/u/.cynic/guidance.json"}))));
        assert!(!is_self_modification(&obs(json!({"file_path": "src/main.rs"}))));
    }

    #[test]
    fn test_chain_tampering_is_critical() {
        let risks = scan_risks(&obs(json!({
            "file_path": "cynic-core/src/chain/mod.rs",
            "content": "let block_hash = recompute(prev_hash);",
        })));
        assert!(risks.iter().any(|r| r.kind == SelfRiskKind::ChainTampering && r.critical));
    }

    #[test]
    fn test_benign_self_change_has_no_risks() {
        let risks = scan_risks(&obs(json!({
            "file_path": "cynic-core/src/constants.rs",
            "content": "pub const KERNEL_PORT: u16 = 8765;",
        })));
        assert!(risks.is_empty());
    }
}
