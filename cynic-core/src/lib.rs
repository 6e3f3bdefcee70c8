#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

//! # CYNIC Core
//!
//! The judgment and learning engine behind a set of thin host hooks: every
//! tool invocation of the host coding assistant becomes an observation,
//! gets a multi-dimensional quality score, and feeds a reinforcement
//! learner whose state survives restarts through the durable store.
//!
//! ## Core Concepts
//!
//! - **Observations**: sanitized hook events tagged with a reality dimension
//! - **Judgments**: four-axiom Q-scores with verdicts (HOWL/WAG/GROWL/BARK)
//! - **Chain**: accepted judgments sealed into SHA-256 linked blocks
//! - **Learner**: TD(0) Q-table plus Thompson sampling over named arms
//! - **Harmonic loop**: feedback in, weight and threshold adjustments out
//!
//! ## Module Organization
//!
//! - [`perceiver`]: raw hook payloads → canonical observations
//! - [`judge`]: axiom and dimension scoring, refinement, self-judgment
//! - [`chain`]: block sealing, orphan adoption, integrity verification
//! - [`learner`]: Q-table, Thompson posteriors, pattern evolution, trackers
//! - [`harmonic`]: feedback routing, learning cycles, promotion
//! - [`storage`]: the durable store trait the backends implement
//! - [`types`]: everything that crosses a boundary
//!
//! ## Judgment Cycle
//!
//! 1. **Perceive**: normalize the hook event into an observation
//! 2. **Judge**: score it through the four axioms, emit a verdict
//! 3. **Seal**: append the judgment to the hash-linked chain
//! 4. **Learn**: update the Q-table and posteriors from the outcome
//! 5. **Harmonize**: fold feedback into weights and promotions

pub mod chain;
pub mod constants;
pub mod error;
pub mod harmonic;
pub mod ids;
pub mod judge;
pub mod learner;
pub mod perceiver;
pub mod similarity;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use chain::{Chain, IntegrityIssue, IntegrityIssueKind};
pub use error::{Error, Result};
pub use harmonic::{HarmonicLoop, ImplicitObserver, Suggestion};
pub use judge::{AxiomWeights, Judge};
pub use learner::{Learner, PatternEvolution, QTable, RewardComponents, StateKey, ThompsonSampler};
pub use perceiver::{Perceiver, RawHookEvent};
pub use storage::{JudgmentFilter, JudgmentStats, ResetOutcome, Store};
pub use types::{
    dogs, Axiom, Block, EScoreDimensions, EScoreSnapshot, ExperienceLevel, Fact, Feedback,
    FeedbackOutcome, FeedbackSource, Handoff, HookEventKind, Judgment, JudgmentLevel,
    LearningCycle, Observation, Pattern, PsychologySnapshot, Reality, Refinement,
    SessionSnapshot, TaskType, TrendDirection, UserLearningProfile, Verdict,
};
