#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

//! # CYNIC Kernel Service
//!
//! The single-process loopback HTTP service wrapping the judgment and
//! learning engine, plus the session orchestrator that decides how the
//! kernel wakes up (COLD / WARM / SAFE) and what it flushes when it
//! sleeps.
//!
//! Thin host hooks are fire-and-forget HTTP clients of this surface:
//!
//! - `POST /perceive` — judge a hook event, get the verdict back
//! - `POST /feedback` — explicit feedback into the harmonic loop
//! - `GET /guidance` — the last judgment summary (24 h staleness TTL)
//! - `GET /health` — liveness, boot mode, back-pressure counters
//! - `GET /stats/*` — judgment and learner aggregates

pub mod config;
pub mod context;
pub mod llm;
pub mod orchestrator;
pub mod service;

pub use config::{exit_codes, KernelConfig};
pub use context::KernelContext;
pub use orchestrator::{BootMode, BootReport};
pub use service::router;
