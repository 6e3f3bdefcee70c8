//! Integration tests against a tempfile-backed store

use chrono::{Datelike, Duration, DurationRound, Utc};
use cynic_core::chain::Chain;
use cynic_core::constants::chain::GENESIS_PREV_HASH;
use cynic_core::constants::RESET_CONFIRM_PHRASE;
use cynic_core::storage::{JudgmentFilter, Store};
use cynic_core::types::{
    EScoreDimensions, EScoreSnapshot, Fact, Feedback, FeedbackOutcome, Pattern,
    UserLearningProfile, Verdict,
};
use test_utils::store::temp_store;
use test_utils::test_judgment;

#[tokio::test]
async fn test_judgment_round_trip() {
    let ts = temp_store().await.unwrap();
    let judgment = test_judgment("jdg_roundtrip", "echo hello");
    ts.store.create_judgment(&judgment).await.unwrap();

    let loaded = ts
        .store
        .get_judgment("jdg_roundtrip")
        .await
        .unwrap()
        .expect("judgment exists");
    assert_eq!(loaded.judgment_id, judgment.judgment_id);
    assert_eq!(loaded.item_hash, cynic_core::ids::item_hash("echo hello"));
    assert_eq!(loaded.verdict, Verdict::Howl);
    assert_eq!(loaded.axiom_scores, judgment.axiom_scores);
    assert!(loaded.is_orphan());
}

#[tokio::test]
async fn test_dedup_window_returns_existing() {
    let ts = temp_store().await.unwrap();
    let first = test_judgment("jdg_dup_a", "cargo build");
    let second = test_judgment("jdg_dup_b", "cargo build");
    ts.store.create_judgment(&first).await.unwrap();
    let stored = ts.store.create_judgment(&second).await.unwrap();
    // Same hash and session inside the window: the first row wins
    assert_eq!(stored.judgment_id, "jdg_dup_a");
    assert!(ts.store.get_judgment("jdg_dup_b").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_judgments_with_filters() {
    let ts = temp_store().await.unwrap();
    for (id, content) in [
        ("jdg_f1", "run the test suite"),
        ("jdg_f2", "deploy to production"),
        ("jdg_f3", "inspect the logs"),
    ] {
        ts.store
            .create_judgment(&test_judgment(id, content))
            .await
            .unwrap();
    }

    let all = ts
        .store
        .find_judgments(&JudgmentFilter {
            session_id: Some("ses_test".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let matched = ts
        .store
        .find_judgments(&JudgmentFilter {
            query: Some("deploy".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].judgment_id, "jdg_f2");

    let stats = ts
        .store
        .judgment_stats(&JudgmentFilter::default())
        .await
        .unwrap();
    assert_eq!(stats.total, 3);
    assert!((stats.avg_q_score - 70.0).abs() < 1e-9);
    assert_eq!(stats.verdict_counts.get("HOWL"), Some(&3));
}

#[tokio::test]
async fn test_chain_continuity_and_linking() {
    let ts = temp_store().await.unwrap();
    let chain = Chain::new(ts.store.clone());

    for (id, content) in [("jdg_c1", "one"), ("jdg_c2", "two")] {
        ts.store
            .create_judgment(&test_judgment(id, content))
            .await
            .unwrap();
    }
    let genesis = chain
        .seal(vec!["jdg_c1".to_string(), "jdg_c2".to_string()])
        .await
        .unwrap()
        .expect("sealed");
    assert_eq!(genesis.block_number, 0);
    assert_eq!(genesis.prev_hash, GENESIS_PREV_HASH);

    ts.store
        .create_judgment(&test_judgment("jdg_c3", "three"))
        .await
        .unwrap();
    let next = chain
        .seal(vec!["jdg_c3".to_string()])
        .await
        .unwrap()
        .expect("sealed");
    assert_eq!(next.block_number, 1);
    assert_eq!(next.prev_hash, genesis.block_hash);

    // Judgment → block link
    let linked = ts.store.get_judgment("jdg_c1").await.unwrap().unwrap();
    assert_eq!(linked.block_hash.as_deref(), Some(genesis.block_hash.as_str()));
    assert_eq!(linked.block_number, Some(0));

    // Full-chain verification walks clean
    let issues = chain.verify_integrity(0, 100).await.unwrap();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[tokio::test]
async fn test_orphan_adoption() {
    // S2: judgments created, some sealed, crash before linking the rest
    let ts = temp_store().await.unwrap();
    let chain = Chain::new(ts.store.clone());

    ts.store
        .create_judgment(&test_judgment("jdg_o0", "sealed"))
        .await
        .unwrap();
    let head = chain
        .seal(vec!["jdg_o0".to_string()])
        .await
        .unwrap()
        .expect("sealed");

    for (id, content) in [("jdg_o1", "a"), ("jdg_o2", "b"), ("jdg_o3", "c")] {
        ts.store
            .create_judgment(&test_judgment(id, content))
            .await
            .unwrap();
    }

    let recovery = chain
        .adopt_orphans()
        .await
        .unwrap()
        .expect("recovery block created");
    assert_eq!(recovery.prev_hash, head.block_hash);
    assert_eq!(recovery.judgment_count, 3);

    for id in ["jdg_o1", "jdg_o2", "jdg_o3"] {
        let judgment = ts.store.get_judgment(id).await.unwrap().unwrap();
        assert_eq!(judgment.block_hash.as_deref(), Some(recovery.block_hash.as_str()));
    }
    assert!(chain.adopt_orphans().await.unwrap().is_none(), "no orphans remain");
}

#[tokio::test]
async fn test_block_number_collision_is_noop() {
    let ts = temp_store().await.unwrap();
    let block_a = cynic_core::types::Block::seal(
        0,
        GENESIS_PREV_HASH.to_string(),
        vec!["jdg_x".to_string()],
    );
    let block_b = cynic_core::types::Block::seal(
        0,
        GENESIS_PREV_HASH.to_string(),
        vec!["jdg_y".to_string()],
    );
    ts.store.create_block(&block_a).await.unwrap();
    ts.store.create_block(&block_b).await.unwrap();

    let head = ts.store.head_block().await.unwrap().unwrap();
    assert_eq!(head.block_hash, block_a.block_hash, "first writer wins");
}

#[tokio::test]
async fn test_pattern_upsert_and_merge_idempotence() {
    let ts = temp_store().await.unwrap();

    let mut base = Pattern::new("tool_sequence", "run tests before commit");
    base.confidence = 0.5;
    base.occurrence_count = 9;
    let stored = ts.store.upsert_pattern(&base).await.unwrap();

    // Re-upserting the same row does not inflate occurrences
    let again = ts.store.upsert_pattern(&stored).await.unwrap();
    assert_eq!(again.occurrence_count, 9);
    assert_eq!(again.pattern_id, stored.pattern_id);

    let mut near = Pattern::new("tool_sequence", "run tests before commits");
    near.confidence = 0.3;
    near.occurrence_count = 2;
    let near = ts.store.upsert_pattern(&near).await.unwrap();

    let similar = ts
        .store
        .similar_patterns("tool_sequence", "run tests before commit", 0.8)
        .await
        .unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].pattern_id, near.pattern_id);

    ts.store
        .merge_patterns(&[near.pattern_id.clone()], &stored.pattern_id)
        .await
        .unwrap();
    let merged = ts
        .store
        .find_pattern("tool_sequence", "run tests before commits")
        .await
        .unwrap()
        .unwrap();
    assert!(merged.merged_at.is_some());

    let target = ts
        .store
        .find_pattern("tool_sequence", "run tests before commit")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(target.parent_ids.as_deref(), Some(&[near.pattern_id.clone()][..]));

    // Merging an already-merged pattern is a no-op
    ts.store
        .merge_patterns(&[near.pattern_id.clone()], &stored.pattern_id)
        .await
        .unwrap();
    let target_after = ts
        .store
        .find_pattern("tool_sequence", "run tests before commit")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(target_after.parent_ids.map(|p| p.len()), Some(1));

    // Merged patterns disappear from active queries
    let active = ts.store.patterns_by_type("tool_sequence", 10).await.unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_fact_search_and_access() {
    let ts = temp_store().await.unwrap();
    let fact = Fact::new(
        "usr_test",
        "preference",
        "testing",
        "prefers pytest over unittest",
        0.8,
    );
    ts.store.create_fact(&fact).await.unwrap();

    let found = ts.store.search_facts("usr_test", "pytest", 10).await.unwrap();
    assert_eq!(found.len(), 1);

    ts.store.record_fact_access(&fact.fact_id).await.unwrap();
    let listed = ts.store.facts_by_user("usr_test", 0.5, 10).await.unwrap();
    assert_eq!(listed[0].access_count, 1);
    assert!(listed[0].last_accessed_at.is_some());
}

#[tokio::test]
async fn test_profile_learning_rate_clamped_at_boundary() {
    let ts = temp_store().await.unwrap();
    let mut profile = UserLearningProfile::new("usr_clamp");
    profile.learning_rate = 0.9;
    ts.store.upsert_profile(&profile).await.unwrap();

    let loaded = ts.store.get_profile("usr_clamp").await.unwrap().unwrap();
    assert!(loaded.learning_rate <= 0.382);
    assert!(loaded.learning_rate >= 0.1);
}

#[tokio::test]
async fn test_feedback_fifo_order() {
    let ts = temp_store().await.unwrap();
    let mut ids = Vec::new();
    for i in 0..5 {
        let mut fb = Feedback::explicit(None, FeedbackOutcome::Correct);
        fb.created_at = Utc::now() - Duration::seconds(100 - i);
        ids.push(fb.feedback_id.clone());
        ts.store.create_feedback(&fb).await.unwrap();
    }

    let drained = ts.store.unapplied_feedback(10).await.unwrap();
    let drained_ids: Vec<String> = drained.iter().map(|f| f.feedback_id.clone()).collect();
    assert_eq!(drained_ids, ids, "FIFO by (created_at, id)");

    ts.store.mark_feedback_applied(&ids[..2]).await.unwrap();
    let remaining = ts.store.unapplied_feedback(10).await.unwrap();
    assert_eq!(remaining.len(), 3);
}

fn escore_at(ts_secs: i64) -> EScoreSnapshot {
    EScoreSnapshot {
        user_id: "usr_test".to_string(),
        e_score: 0.7,
        dimensions: EScoreDimensions::default(),
        trigger_event: "test".to_string(),
        delta: 0.0,
        created_at: chrono::DateTime::from_timestamp(ts_secs, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_escore_retention_schedule() {
    // S6: only the schedule's representatives survive cleanup
    let ts = temp_store().await.unwrap();
    let now = Utc::now();
    let this_hour = now.duration_trunc(Duration::hours(1)).unwrap();

    // Within 24 h: one on-the-hour row (kept), one off-hour row (pruned)
    let kept_hourly = this_hour - Duration::hours(2);
    let pruned_offset = kept_hourly + Duration::minutes(17);

    // 24 h – 7 d: midnight kept, noon pruned
    let midnight_3d = (now - Duration::days(3))
        .duration_trunc(Duration::days(1))
        .unwrap();
    let noon_3d = midnight_3d + Duration::hours(12);

    // 7 d – 365 d: Sunday midnight kept, other midnights pruned
    let mut sunday = (now - Duration::days(30))
        .duration_trunc(Duration::days(1))
        .unwrap();
    while sunday.weekday() != chrono::Weekday::Sun {
        sunday -= Duration::days(1);
    }
    let monday = sunday + Duration::days(1);

    // Beyond 365 d: deleted regardless of alignment
    let ancient = (now - Duration::days(400))
        .duration_trunc(Duration::days(1))
        .unwrap();

    for moment in [
        kept_hourly,
        pruned_offset,
        midnight_3d,
        noon_3d,
        sunday,
        monday,
        ancient,
    ] {
        ts.store.record_escore(&escore_at(moment.timestamp())).await.unwrap();
    }

    let deleted = ts.store.cleanup_escore_history().await.unwrap();
    assert_eq!(deleted, 4, "off-hour, noon, monday, ancient rows deleted");

    // Verify the survivors by re-running: nothing more to delete
    let second_pass = ts.store.cleanup_escore_history().await.unwrap();
    assert_eq!(second_pass, 0, "cleanup is idempotent");
}

#[tokio::test]
async fn test_reset_requires_confirm_phrase() {
    let ts = temp_store().await.unwrap();
    ts.store
        .create_judgment(&test_judgment("jdg_reset", "content"))
        .await
        .unwrap();

    let refused = ts.store.reset("please").await;
    assert!(refused.is_err());
    assert!(ts.store.get_judgment("jdg_reset").await.unwrap().is_some());

    let outcome = ts.store.reset(RESET_CONFIRM_PHRASE).await.unwrap();
    assert_eq!(outcome.judgments, 1);
    assert!(ts.store.get_judgment("jdg_reset").await.unwrap().is_none());

    let stats = ts
        .store
        .judgment_stats(&JudgmentFilter::default())
        .await
        .unwrap();
    assert_eq!(stats.total, 0);
}
