//! Database schema definitions

use rusqlite::Connection;
use tracing::info;

use crate::error::PipelineError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<(), PipelineError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.execute_batch(TABLES_SCHEMA)?;
        conn.execute_batch(INDEXES_SCHEMA)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!("Migrating schema from v{} to v{}", current_version, SCHEMA_VERSION);
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &Connection) -> Result<i32, PipelineError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), PipelineError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?)", [version])?;
    Ok(())
}

/// Entity tables.
///
/// Cascade chain: prompts -> content_artifacts -> processed_content ->
/// published_content. Fact-check rows outlive the artifact they checked.
const TABLES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS prompts (
    id TEXT PRIMARY KEY NOT NULL,
    prompt_text TEXT NOT NULL,
    temperature REAL NOT NULL,
    token_limit INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS content_artifacts (
    id TEXT PRIMARY KEY NOT NULL,
    prompt_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (prompt_id) REFERENCES prompts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS fact_check_results (
    id TEXT PRIMARY KEY NOT NULL,
    artifact_id TEXT,
    claim TEXT NOT NULL,
    textual_rating TEXT NOT NULL,
    verification_score REAL NOT NULL DEFAULT 0.0,
    evidence_json TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    FOREIGN KEY (artifact_id) REFERENCES content_artifacts(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS processed_content (
    id TEXT PRIMARY KEY NOT NULL,
    artifact_id TEXT NOT NULL UNIQUE,
    fact_check_id TEXT,
    categories_json TEXT NOT NULL DEFAULT '[]',
    tags_json TEXT NOT NULL DEFAULT '[]',
    fact_check_status TEXT NOT NULL,
    composite_score REAL NOT NULL DEFAULT 0.0,
    evidence_json TEXT NOT NULL DEFAULT '{}',
    publish_status TEXT NOT NULL,
    processed_at TEXT NOT NULL,
    FOREIGN KEY (artifact_id) REFERENCES content_artifacts(id) ON DELETE CASCADE,
    FOREIGN KEY (fact_check_id) REFERENCES fact_check_results(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS published_content (
    id TEXT PRIMARY KEY NOT NULL,
    processed_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    fact_check_status TEXT NOT NULL,
    evidence_json TEXT NOT NULL DEFAULT '{}',
    category TEXT NOT NULL DEFAULT 'General',
    tags_json TEXT NOT NULL DEFAULT '[]',
    image_url TEXT,
    video_url TEXT,
    published_at TEXT NOT NULL,
    manually_overridden INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (processed_id) REFERENCES processed_content(id) ON DELETE CASCADE
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_fact_check_artifact ON fact_check_results(artifact_id);
CREATE INDEX IF NOT EXISTS idx_fact_check_claim ON fact_check_results(claim);
CREATE INDEX IF NOT EXISTS idx_artifacts_created ON content_artifacts(created_at);
"#;
