//! HTTP surface of the kernel
//!
//! Loopback-only JSON endpoints. Handlers never panic and always answer
//! JSON; errors follow `{"error": {"code", "message"}}`. The perceive path
//! judges synchronously (REFLEX budget) and defers everything durable to
//! the worker pool.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use cynic_core::harmonic::Suggestion;
use cynic_core::learner::StateKey;
use cynic_core::storage::JudgmentFilter;
use cynic_core::types::{Feedback, FeedbackOutcome, HookEventKind, Judgment, Verdict};
use cynic_core::{Error, RawHookEvent};

use crate::context::KernelContext;
use crate::service::guidance::{self, Guidance};
use crate::service::workers::PersistTask;

/// Build the full router
pub fn router(ctx: Arc<KernelContext>) -> Router {
    Router::new()
        .route("/perceive", post(perceive_handler))
        .route("/feedback", post(feedback_handler))
        .route("/guidance", get(guidance_handler))
        .route("/health", get(health_handler))
        .route("/stats/judgments", get(judgment_stats_handler))
        .route("/stats/learner", get(learner_stats_handler))
        .with_state(ctx)
}

/// JSON error envelope
struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) | Error::Serialization(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": {"code": self.0.code(), "message": self.0.to_string()}
        });
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[derive(Debug, Serialize)]
struct PerceiveResponse {
    judgment: Option<Judgment>,
    persistence: &'static str,
    degraded: bool,
}

#[instrument(skip_all)]
async fn perceive_handler(
    State(ctx): State<Arc<KernelContext>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<PerceiveResponse>, ApiError> {
    let raw: RawHookEvent = serde_json::from_value(body)
        .map_err(|e| Error::Validation(format!("malformed observation: {e}")))?;
    let mut obs = raw_with_session_defaults(&ctx, raw);
    if obs.session_id.is_none() {
        obs.session_id = ctx.config.session_id.clone();
    }

    if matches!(obs.source, HookEventKind::UserPromptSubmit) {
        ctx.counters.prompt_count.fetch_add(1, Ordering::Relaxed);
    }
    if matches!(obs.source, HookEventKind::Error) {
        ctx.counters.record_error(obs.content());
    }

    if !obs.run_judgment {
        return Ok(Json(PerceiveResponse {
            judgment: None,
            persistence: "skipped",
            degraded: ctx.degraded(),
        }));
    }

    // Select the active dog, then judge under that state
    let provisional = StateKey::new(obs.task_type(), obs.reality, "guardian");
    let (dog, dog_votes) = ctx.learner.select_dog(&provisional);
    let state = StateKey::new(obs.task_type(), obs.reality, dog.clone());

    let mut judgment = ctx.judge.judge(&obs);
    stamp_context(&mut judgment, &state, &ctx);
    ctx.counters.record_judgment(judgment.q_score, &judgment.item_type);
    if let Some(path) = obs
        .data
        .get("file_path")
        .and_then(|v| v.as_str())
    {
        ctx.counters.record_file_modified(path.to_string());
    }

    // Guidance is the synchronous side channel for the next hook
    let guidance_record = Guidance {
        state_key: state.to_string(),
        verdict: judgment.verdict,
        q_score: judgment.q_score,
        confidence: judgment.confidence,
        reality: obs.reality,
        dog_votes,
        timestamp: chrono::Utc::now(),
    };
    if let Err(err) = guidance::write_guidance(&ctx.config.guidance_path(), &guidance_record) {
        tracing::warn!(%err, "guidance write failed");
    }

    let suggestion = suggestion_from(&judgment, &dog);
    let task = PersistTask {
        judgment: Box::new(judgment.clone()),
        state,
        execution_ms: obs.execution_ms(),
        is_post_tool: obs.source.is_post_tool(),
        action_text: obs.content(),
        suggestion,
    };
    let persistence = match ctx.workers.enqueue(task) {
        Ok(()) => {
            if ctx.store.is_some() {
                "queued"
            } else {
                "skipped"
            }
        }
        Err(Error::Overloaded) => "skipped",
        Err(err) => return Err(err.into()),
    };

    Ok(Json(PerceiveResponse {
        judgment: Some(judgment),
        persistence,
        degraded: ctx.degraded(),
    }))
}

/// Either a bare rating or the full unified feedback shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedbackRequest {
    Rating {
        rating: u8,
    },
    Full {
        judgment_id: Option<String>,
        outcome: FeedbackOutcome,
        actual_score: Option<f64>,
        reason: Option<String>,
        #[serde(default)]
        source_context: Option<serde_json::Value>,
    },
}

#[instrument(skip_all)]
async fn feedback_handler(
    State(ctx): State<Arc<KernelContext>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: FeedbackRequest = serde_json::from_value(body)
        .map_err(|e| Error::Validation(format!("malformed feedback: {e}")))?;
    let mut feedback = match request {
        FeedbackRequest::Rating { rating } => Feedback::from_rating(rating)?,
        FeedbackRequest::Full {
            judgment_id,
            outcome,
            actual_score,
            reason,
            source_context,
        } => {
            let mut fb = Feedback::explicit(judgment_id, outcome);
            fb.actual_score = actual_score;
            fb.reason = reason;
            fb.source_context = source_context;
            fb
        }
    };
    feedback.user_id = Some(ctx.config.user_id.clone());
    feedback.session_id = ctx.config.session_id.clone();

    ctx.harmonic.handle_feedback(feedback).await?;

    // Explicit feedback is rare enough to harmonize immediately
    let outcome = ctx.harmonic.run_cycle().await?;
    Ok(Json(json!({"ok": true, "cycle_id": outcome.cycle.cycle_id})))
}

async fn guidance_handler(State(ctx): State<Arc<KernelContext>>) -> Json<serde_json::Value> {
    let guidance = guidance::read_guidance(&ctx.config.guidance_path());
    Json(json!({ "guidance": guidance }))
}

async fn health_handler(State(ctx): State<Arc<KernelContext>>) -> Json<serde_json::Value> {
    let last_cycle = match &ctx.store {
        Some(store) => store.last_cycle().await.ok().flatten(),
        None => None,
    };
    Json(json!({
        "alive": true,
        "uptime_ms": ctx.started_at.elapsed().as_millis() as u64,
        "degraded": ctx.degraded(),
        "boot_mode": ctx.boot.mode,
        "dropped_persistence_total": ctx.workers.dropped_total(),
        "last_cycle": last_cycle,
    }))
}

/// Query-string form of the judgment filter
#[derive(Debug, Deserialize, Default)]
struct StatsQuery {
    user_id: Option<String>,
    session_id: Option<String>,
    verdict: Option<String>,
    item_type: Option<String>,
    query: Option<String>,
}

async fn judgment_stats_handler(
    State(ctx): State<Arc<KernelContext>>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(store) = &ctx.store else {
        return Ok(Json(json!({"degraded": true, "stats": null})));
    };
    let verdict = params
        .verdict
        .as_deref()
        .map(parse_verdict)
        .transpose()?;
    let filter = JudgmentFilter {
        user_id: params.user_id,
        session_id: params.session_id,
        verdict,
        item_type: params.item_type,
        query: params.query,
        ..Default::default()
    };
    let stats = store.judgment_stats(&filter).await?;
    Ok(Json(json!({"degraded": false, "stats": stats})))
}

async fn learner_stats_handler(State(ctx): State<Arc<KernelContext>>) -> Json<serde_json::Value> {
    let stats = ctx.learner.stats();
    #[cfg(feature = "analytics")]
    let trackers = Some(ctx.learner.tracker_report());
    #[cfg(not(feature = "analytics"))]
    let trackers: Option<()> = None;
    Json(json!({
        "learner": stats,
        "threshold_delta": ctx.harmonic.threshold_delta(),
        "trackers": trackers,
    }))
}

fn parse_verdict(raw: &str) -> Result<Verdict, Error> {
    match raw.to_uppercase().as_str() {
        "HOWL" => Ok(Verdict::Howl),
        "WAG" => Ok(Verdict::Wag),
        "GROWL" => Ok(Verdict::Growl),
        "BARK" => Ok(Verdict::Bark),
        other => Err(Error::Validation(format!("unknown verdict: {other}"))),
    }
}

fn raw_with_session_defaults(
    ctx: &KernelContext,
    raw: RawHookEvent,
) -> cynic_core::Observation {
    let mut raw = raw;
    if raw.user_id.is_none() {
        raw.user_id = Some(ctx.config.user_id.clone());
    }
    ctx.perceiver.perceive(raw)
}

/// Stamp the learner state into the judgment context so feedback can find
/// its way back to the right Q-table entry
fn stamp_context(judgment: &mut Judgment, state: &StateKey, ctx: &KernelContext) {
    if let serde_json::Value::Object(map) = &mut judgment.context {
        map.insert("state_key".to_string(), json!(state.to_string()));
        map.insert("dog".to_string(), json!(state.dog));
        map.insert(
            "threshold_delta".to_string(),
            json!(ctx.harmonic.threshold_delta()),
        );
    }
}

/// Verdicts below HOWL become suggestions the implicit observer can match
/// later actions against
fn suggestion_from(judgment: &Judgment, dog: &str) -> Option<Suggestion> {
    if judgment.verdict == Verdict::Howl {
        return None;
    }
    let advice = match judgment.verdict {
        Verdict::Bark => judgment.item_content.clone(),
        _ => judgment
            .weaknesses
            .first()
            .map(|w| advice_for(w))
            .unwrap_or_else(|| "review this change".to_string()),
    };
    Some(Suggestion {
        judgment_id: Some(judgment.judgment_id.clone()),
        advice,
        dog: dog.to_string(),
        blocking: judgment.verdict.is_blocking(),
        created_at: chrono::Utc::now(),
    })
}

/// Turn a weakness label into actionable advice text
fn advice_for(weakness: &str) -> String {
    match weakness {
        "testability" | "falsifiability" | "assertion_density" => {
            "run tests and add assertions".to_string()
        }
        "error_handling" => "handle the error paths".to_string(),
        "brevity" | "focus" | "yagni" => "split this into smaller pieces".to_string(),
        "depth_restraint" => "flatten the nesting".to_string(),
        "duplication_avoidance" => "deduplicate the repeated lines".to_string(),
        "naming_consistency" | "style_consistency" => "match the surrounding style".to_string(),
        "documentation" => "document the intent".to_string(),
        other => format!("improve {other}"),
    }
}
