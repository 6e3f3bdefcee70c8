//! Hook events, reality dimensions, and the canonical Observation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hook events emitted by the host editor's dispatcher.
///
/// The thin per-event shims forward these verbatim; the kernel never sees
/// anything else from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventKind {
    PreToolUse,
    PostToolUse,
    UserPromptSubmit,
    Stop,
    SessionStart,
    SessionEnd,
    Error,
    Notification,
    SubagentStart,
    SubagentStop,
}

impl HookEventKind {
    /// Classify the event into its reality dimension (fixed table)
    pub fn reality(self) -> Reality {
        match self {
            HookEventKind::PostToolUse | HookEventKind::PreToolUse => Reality::Code,
            HookEventKind::UserPromptSubmit
            | HookEventKind::Stop
            | HookEventKind::SessionStart
            | HookEventKind::SessionEnd => Reality::Human,
            HookEventKind::Error
            | HookEventKind::Notification
            | HookEventKind::SubagentStart
            | HookEventKind::SubagentStop => Reality::Cynic,
        }
    }

    /// Events that count toward the periodic learning-cycle trigger
    pub fn is_post_tool(self) -> bool {
        matches!(self, HookEventKind::PostToolUse)
    }
}

/// Reality dimension attached to events for state-key shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Reality {
    Code,
    Human,
    Cynic,
}

impl Reality {
    pub fn as_str(self) -> &'static str {
        match self {
            Reality::Code => "code",
            Reality::Human => "human",
            Reality::Cynic => "cynic",
        }
    }
}

impl std::str::FromStr for Reality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(Reality::Code),
            "human" => Ok(Reality::Human),
            "cynic" => Ok(Reality::Cynic),
            _ => Err(()),
        }
    }
}

/// Depth of judgment requested for an observation.
///
/// REFLEX targets <10 ms (tabular scoring only), REFLECT allows the Judge's
/// self-refinement pass, DELIBERATE additionally allows external model
/// consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JudgmentLevel {
    #[default]
    Reflex,
    Reflect,
    Deliberate,
}

/// Task categories for Q-table state keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Debug,
    Test,
    Deployment,
    Exploration,
    CodeChange,
    Analysis,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Debug => "debug",
            TaskType::Test => "test",
            TaskType::Deployment => "deployment",
            TaskType::Exploration => "exploration",
            TaskType::CodeChange => "code_change",
            TaskType::Analysis => "analysis",
        }
    }

    /// Inverse of [`TaskType::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debug" => Some(TaskType::Debug),
            "test" => Some(TaskType::Test),
            "deployment" => Some(TaskType::Deployment),
            "exploration" => Some(TaskType::Exploration),
            "code_change" => Some(TaskType::CodeChange),
            "analysis" => Some(TaskType::Analysis),
            _ => None,
        }
    }

    /// Classify a tool invocation into a task type.
    ///
    /// Content heuristics only; unknown shapes fall back to `Exploration`.
    pub fn classify(tool_name: &str, content: &str) -> Self {
        let lower = content.to_lowercase();
        if lower.contains("deploy") || lower.contains("release") || lower.contains("publish") {
            return TaskType::Deployment;
        }
        if tool_name == "Bash"
            && (lower.contains("test") || lower.contains("pytest") || lower.contains("cargo t"))
        {
            return TaskType::Test;
        }
        if lower.contains("error")
            || lower.contains("panic")
            || lower.contains("traceback")
            || lower.contains("fix")
        {
            return TaskType::Debug;
        }
        match tool_name {
            "Edit" | "Write" | "NotebookEdit" => TaskType::CodeChange,
            "Read" | "Grep" | "Glob" => TaskType::Exploration,
            "Bash" => TaskType::CodeChange,
            _ => TaskType::Analysis,
        }
    }
}

/// A sanitized hook event, ready for judgment.
///
/// Unknown fields from the wire are preserved opaquely inside `data`;
/// everything the Judge and Learner consume is lifted into named fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Originating hook event
    pub source: HookEventKind,
    /// Reality dimension (derived from `source` unless the shim overrode it)
    pub reality: Reality,
    /// Sanitized event payload (large string fields truncated)
    pub data: serde_json::Value,
    /// Free-form context string carried to the Judge
    #[serde(default)]
    pub context: String,
    /// Whether the Judge should run at all for this event
    #[serde(default = "default_run_judgment")]
    pub run_judgment: bool,
    /// Requested judgment depth
    #[serde(default)]
    pub level: JudgmentLevel,
    /// Propagated session tag, if any
    #[serde(default)]
    pub session_id: Option<String>,
    /// User owning this session, if known
    #[serde(default)]
    pub user_id: Option<String>,
    /// When the kernel received the event
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

fn default_run_judgment() -> bool {
    true
}

impl Observation {
    /// The tool name for tool events, empty otherwise
    pub fn tool_name(&self) -> &str {
        self.data
            .get("tool_name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    /// Best-effort textual content of the event, used for hashing and scoring
    pub fn content(&self) -> String {
        for key in ["content", "command", "diff", "output", "prompt", "message"] {
            if let Some(text) = self.data.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        self.data.to_string()
    }

    /// Task type for state-key shaping
    pub fn task_type(&self) -> TaskType {
        TaskType::classify(self.tool_name(), &self.content())
    }

    /// Execution time reported by the host, if present
    pub fn execution_ms(&self) -> Option<u64> {
        self.data.get("execution_ms").and_then(|v| v.as_u64())
    }
}
