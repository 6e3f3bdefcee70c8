//! Database schema definitions for the Turso store

/// SQL to create the judgments table
pub const CREATE_JUDGMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS judgments (
    judgment_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT,
    session_id TEXT,
    item_type TEXT NOT NULL,
    item_content TEXT NOT NULL,
    item_hash TEXT NOT NULL,
    q_score REAL NOT NULL,
    confidence REAL NOT NULL,
    verdict TEXT NOT NULL,
    axiom_scores TEXT NOT NULL,
    dimension_scores TEXT NOT NULL DEFAULT '{}',
    weaknesses TEXT NOT NULL DEFAULT '[]',
    context TEXT NOT NULL DEFAULT '{}',
    block_hash TEXT,
    block_number INTEGER,
    prev_hash TEXT,
    refinement TEXT,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// FTS5 index over judgment content
pub const CREATE_JUDGMENTS_FTS: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS judgments_fts USING fts5(
    judgment_id UNINDEXED,
    item_content
)
"#;

/// SQL to create the blocks table. No update or delete path exists for
/// this table anywhere in the store.
pub const CREATE_BLOCKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    block_number INTEGER PRIMARY KEY NOT NULL,
    block_hash TEXT NOT NULL UNIQUE,
    prev_hash TEXT NOT NULL,
    merkle_root TEXT NOT NULL,
    judgment_count INTEGER NOT NULL,
    judgment_ids TEXT NOT NULL,
    timestamp_ms INTEGER NOT NULL
)
"#;

/// SQL to create the patterns table
pub const CREATE_PATTERNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    pattern_id TEXT PRIMARY KEY NOT NULL,
    pattern_type TEXT NOT NULL,
    pattern_key TEXT NOT NULL,
    occurrence_count INTEGER NOT NULL DEFAULT 1,
    confidence REAL NOT NULL,
    strength REAL NOT NULL,
    weight_modifier REAL NOT NULL DEFAULT 1.0,
    threshold_delta REAL NOT NULL DEFAULT 0.0,
    trend_direction TEXT NOT NULL DEFAULT 'stable',
    trend_velocity REAL NOT NULL DEFAULT 0.0,
    merged_at INTEGER,
    parent_ids TEXT,
    promoted_at INTEGER,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    UNIQUE(pattern_type, pattern_key)
)
"#;

/// SQL to create the facts table
pub const CREATE_FACTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS facts (
    fact_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    fact_type TEXT NOT NULL,
    subject TEXT NOT NULL,
    content TEXT NOT NULL,
    confidence REAL NOT NULL,
    relevance REAL NOT NULL DEFAULT 1.0,
    tags TEXT NOT NULL DEFAULT '[]',
    access_count INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    last_accessed_at INTEGER
)
"#;

/// FTS5 index over fact subject and content
pub const CREATE_FACTS_FTS: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS facts_fts USING fts5(
    fact_id UNINDEXED,
    subject,
    content
)
"#;

/// SQL to create the user learning profiles table
pub const CREATE_PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id TEXT PRIMARY KEY NOT NULL,
    learning_rate REAL NOT NULL,
    session_count INTEGER NOT NULL DEFAULT 0,
    judgment_count INTEGER NOT NULL DEFAULT 0,
    feedback_count INTEGER NOT NULL DEFAULT 0,
    preferred_dimensions TEXT NOT NULL DEFAULT '[]',
    judgment_patterns TEXT NOT NULL DEFAULT '{}',
    feedback_bias REAL NOT NULL DEFAULT 0.0,
    escore_feedback_correlation REAL NOT NULL DEFAULT 0.0,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// SQL to create the feedback table
pub const CREATE_FEEDBACK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id TEXT PRIMARY KEY NOT NULL,
    judgment_id TEXT,
    user_id TEXT,
    session_id TEXT,
    outcome TEXT NOT NULL,
    rating INTEGER,
    actual_score REAL,
    reason TEXT,
    source_type TEXT NOT NULL,
    source_context TEXT,
    confidence REAL NOT NULL,
    applied INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// SQL to create the learning cycles audit table
pub const CREATE_CYCLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS learning_cycles (
    cycle_id TEXT PRIMARY KEY NOT NULL,
    feedback_processed INTEGER NOT NULL,
    patterns_updated INTEGER NOT NULL,
    patterns_merged INTEGER NOT NULL,
    weights_adjusted INTEGER NOT NULL,
    thresholds_adjusted INTEGER NOT NULL,
    avg_weight_delta REAL NOT NULL,
    avg_threshold_delta REAL NOT NULL,
    duration_ms INTEGER NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// SQL to create the e-score history table
pub const CREATE_ESCORE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS escore_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    e_score REAL NOT NULL,
    dimensions TEXT NOT NULL,
    trigger_event TEXT NOT NULL,
    delta REAL NOT NULL DEFAULT 0.0,
    created_at INTEGER NOT NULL
)
"#;

/// SQL to create the sessions table
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT,
    session_end_time INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    prompt_count INTEGER NOT NULL,
    judgment_count INTEGER NOT NULL,
    avg_q_score REAL NOT NULL,
    trend TEXT NOT NULL,
    handoff TEXT NOT NULL
)
"#;

/// SQL to create the psychology snapshots table
pub const CREATE_PSYCHOLOGY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS psychology_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    energy REAL NOT NULL,
    focus REAL NOT NULL,
    creativity REAL NOT NULL,
    frustration REAL NOT NULL,
    burnout REAL NOT NULL,
    flow REAL NOT NULL,
    work_done REAL NOT NULL,
    error_count INTEGER NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
)
"#;

/// Index on judgments content hash for dedup and similarity lookups
pub const CREATE_JUDGMENTS_HASH_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_judgments_item_hash
ON judgments(item_hash, created_at DESC)
"#;

/// Index on judgments session for session-scoped queries
pub const CREATE_JUDGMENTS_SESSION_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_judgments_session
ON judgments(session_id)
"#;

/// Partial index on orphan judgments awaiting chain adoption
pub const CREATE_JUDGMENTS_ORPHAN_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_judgments_orphans
ON judgments(created_at) WHERE block_hash IS NULL
"#;

/// Index on patterns type for typed queries and merge scans
pub const CREATE_PATTERNS_TYPE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_patterns_type
ON patterns(pattern_type, confidence DESC)
"#;

/// Index on facts owner for injection queries
pub const CREATE_FACTS_USER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_facts_user
ON facts(user_id, confidence DESC)
"#;

/// Index on unapplied feedback in FIFO order
pub const CREATE_FEEDBACK_UNAPPLIED_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_feedback_unapplied
ON feedback(applied, created_at, feedback_id)
"#;

/// Index on e-score history for retention sweeps
pub const CREATE_ESCORE_TIME_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_escore_time
ON escore_history(user_id, created_at)
"#;

/// All schema statements in creation order
pub const ALL_SCHEMA: [&str; 19] = [
    CREATE_JUDGMENTS_TABLE,
    CREATE_JUDGMENTS_FTS,
    CREATE_BLOCKS_TABLE,
    CREATE_PATTERNS_TABLE,
    CREATE_FACTS_TABLE,
    CREATE_FACTS_FTS,
    CREATE_PROFILES_TABLE,
    CREATE_FEEDBACK_TABLE,
    CREATE_CYCLES_TABLE,
    CREATE_ESCORE_TABLE,
    CREATE_SESSIONS_TABLE,
    CREATE_PSYCHOLOGY_TABLE,
    CREATE_JUDGMENTS_HASH_INDEX,
    CREATE_JUDGMENTS_SESSION_INDEX,
    CREATE_JUDGMENTS_ORPHAN_INDEX,
    CREATE_PATTERNS_TYPE_INDEX,
    CREATE_FACTS_USER_INDEX,
    CREATE_FEEDBACK_UNAPPLIED_INDEX,
    CREATE_ESCORE_TIME_INDEX,
];
