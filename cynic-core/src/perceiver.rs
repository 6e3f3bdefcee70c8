//! Perception pipeline: raw hook payloads into canonical observations
//!
//! The thin host shims POST whatever the editor handed them. The perceiver
//! tolerates unknown fields, truncates oversized string fields, classifies
//! the event's reality dimension, and emits an [`Observation`] the Judge
//! and Learner can rely on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::defaults;
use crate::types::{HookEventKind, JudgmentLevel, Observation, Reality};

/// String fields subject to truncation wherever they appear in the payload
const TRUNCATED_FIELDS: [&str; 5] = ["content", "diff", "output", "file_content", "prompt"];

/// A raw hook event as it arrives on the wire.
///
/// Everything except `source` is optional; the shims are fire-and-forget
/// and send whatever they have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHookEvent {
    pub source: HookEventKind,
    #[serde(default)]
    pub reality: Option<Reality>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub run_judgment: Option<bool>,
    #[serde(default)]
    pub level: Option<JudgmentLevel>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Stateless normalizer for hook events
#[derive(Debug, Clone, Default)]
pub struct Perceiver {
    /// Maximum retained length for truncated fields
    max_field_len: usize,
}

impl Perceiver {
    pub fn new() -> Self {
        Self {
            max_field_len: defaults::FIELD_TRUNCATION_LEN,
        }
    }

    /// Normalize a raw hook event into an observation.
    ///
    /// Never fails: malformed sub-structures are carried through opaquely,
    /// and the reality dimension falls back to the fixed source table when
    /// the shim did not override it.
    pub fn perceive(&self, raw: RawHookEvent) -> Observation {
        let mut data = raw.data;
        self.sanitize(&mut data);

        let reality = raw.reality.unwrap_or_else(|| raw.source.reality());
        let run_judgment = raw
            .run_judgment
            .unwrap_or(!matches!(raw.source, HookEventKind::Notification));
        let level = raw.level.unwrap_or_default();

        debug!(
            source = ?raw.source,
            reality = reality.as_str(),
            ?level,
            run_judgment,
            "perceived hook event"
        );

        Observation {
            source: raw.source,
            reality,
            data,
            context: raw.context.unwrap_or_default(),
            run_judgment,
            level,
            session_id: raw.session_id,
            user_id: raw.user_id,
            received_at: chrono::Utc::now(),
        }
    }

    /// Truncate known-large string fields in place, marking the cut.
    ///
    /// Walks one level of nesting so `tool_input.content` and friends are
    /// covered without a full deep scan of arbitrary payloads.
    fn sanitize(&self, data: &mut Value) {
        let Some(map) = data.as_object_mut() else {
            return;
        };
        for (key, value) in map.iter_mut() {
            if TRUNCATED_FIELDS.contains(&key.as_str()) {
                Self::truncate_in_place(value, self.max_field_len);
            } else if let Some(nested) = value.as_object_mut() {
                for (nested_key, nested_value) in nested.iter_mut() {
                    if TRUNCATED_FIELDS.contains(&nested_key.as_str()) {
                        Self::truncate_in_place(nested_value, self.max_field_len);
                    }
                }
            }
        }
    }

    fn truncate_in_place(value: &mut Value, max_len: usize) {
        if let Some(text) = value.as_str() {
            if text.chars().count() > max_len {
                let truncated: String = text.chars().take(max_len).collect();
                *value = Value::String(format!("{truncated}{}", defaults::TRUNCATION_MARKER));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(source: HookEventKind, data: Value) -> RawHookEvent {
        RawHookEvent {
            source,
            reality: None,
            data,
            context: None,
            run_judgment: None,
            level: None,
            session_id: None,
            user_id: None,
        }
    }

    #[test]
    fn test_truncates_long_content() {
        let perceiver = Perceiver::new();
        let long = "x".repeat(800);
        let obs = perceiver.perceive(raw(
            HookEventKind::PostToolUse,
            json!({"tool_name": "Write", "content": long}),
        ));
        let content = obs.data["content"].as_str().unwrap();
        assert!(content.ends_with(defaults::TRUNCATION_MARKER));
        assert!(content.chars().count() < 800);
    }

    #[test]
    fn test_truncates_nested_tool_input() {
        let perceiver = Perceiver::new();
        let obs = perceiver.perceive(raw(
            HookEventKind::PreToolUse,
            json!({"tool_input": {"prompt": "y".repeat(600), "path": "a.rs"}}),
        ));
        let prompt = obs.data["tool_input"]["prompt"].as_str().unwrap();
        assert!(prompt.ends_with(defaults::TRUNCATION_MARKER));
        assert_eq!(obs.data["tool_input"]["path"], "a.rs");
    }

    #[test]
    fn test_short_fields_left_alone() {
        let perceiver = Perceiver::new();
        let obs = perceiver.perceive(raw(
            HookEventKind::PostToolUse,
            json!({"output": "ok"}),
        ));
        assert_eq!(obs.data["output"], "ok");
    }

    #[test]
    fn test_reality_defaults_from_source() {
        let perceiver = Perceiver::new();
        let obs = perceiver.perceive(raw(HookEventKind::Error, json!({})));
        assert_eq!(obs.reality, Reality::Cynic);
    }

    #[test]
    fn test_shim_reality_override_wins() {
        let perceiver = Perceiver::new();
        let mut event = raw(HookEventKind::Error, json!({}));
        event.reality = Some(Reality::Code);
        let obs = perceiver.perceive(event);
        assert_eq!(obs.reality, Reality::Code);
    }

    #[test]
    fn test_notifications_skip_judgment_by_default() {
        let perceiver = Perceiver::new();
        let obs = perceiver.perceive(raw(HookEventKind::Notification, json!({})));
        assert!(!obs.run_judgment);
        let obs = perceiver.perceive(raw(HookEventKind::PostToolUse, json!({})));
        assert!(obs.run_judgment);
    }
}
