//! Core data types for the judgment and learning kernel
//!
//! Explicit structs for everything that crosses a boundary: observations in,
//! judgments out, feedback around the loop, and the durable entities the
//! Store owns. Wire input tolerates unknown fields; persistence is strict.

mod block;
mod fact;
mod feedback;
mod judgment;
mod observation;
mod pattern;
mod profile;
mod session;

pub use block::Block;
pub use fact::Fact;
pub use feedback::{Feedback, FeedbackOutcome, FeedbackSource};
pub use judgment::{Axiom, Judgment, Refinement, Verdict};
pub use observation::{HookEventKind, JudgmentLevel, Observation, Reality, TaskType};
pub use pattern::{Pattern, TrendDirection};
pub use profile::{ExperienceLevel, JudgmentHistograms, UserLearningProfile};
pub use session::{
    EScoreDimensions, EScoreSnapshot, Handoff, LearningCycle, PsychologySnapshot, SessionSnapshot,
};

/// Named policy roles the Learner selects between.
///
/// Dogs are implementation-free labels: the roster below ships as the
/// default arm/action set, and unknown names arriving from the wire are
/// accepted as-is.
pub mod dogs {
    pub const GUARDIAN: &str = "guardian";
    pub const SCOUT: &str = "scout";
    pub const TRACKER: &str = "tracker";
    pub const HEALER: &str = "healer";
    pub const SAGE: &str = "sage";
    pub const HERALD: &str = "herald";

    /// The default roster, in selection order
    pub const ROSTER: [&str; 6] = [GUARDIAN, SCOUT, TRACKER, HEALER, SAGE, HERALD];
}
