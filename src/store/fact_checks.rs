//! Fact-check result rows (append-only)

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{ContentArtifact, FactCheckResult};
use crate::error::PipelineError;

use super::{json_column, optional_uuid_column, parse_column};

fn fact_check_from_row(row: &Row) -> rusqlite::Result<FactCheckResult> {
    Ok(FactCheckResult {
        id: parse_column(row, "id")?,
        artifact_id: optional_uuid_column(row, "artifact_id")?,
        claim: row.get("claim")?,
        textual_rating: row.get("textual_rating")?,
        verification_score: row.get("verification_score")?,
        evidence: json_column(row, "evidence_json")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert_fact_check(conn: &Connection, result: &FactCheckResult) -> Result<(), PipelineError> {
    conn.execute(
        "INSERT INTO fact_check_results
            (id, artifact_id, claim, textual_rating, verification_score, evidence_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            result.id.to_string(),
            result.artifact_id.map(|id| id.to_string()),
            result.claim,
            result.textual_rating,
            result.verification_score,
            serde_json::to_string(&result.evidence)?,
            result.created_at,
        ],
    )?;
    Ok(())
}

/// The result that applies to an artifact right now.
///
/// Prefers the newest result linked to the artifact, then the newest result
/// whose claim equals the body. Ties on timestamp resolve by insertion order.
pub fn current_for_artifact(
    conn: &Connection,
    artifact: &ContentArtifact,
) -> Result<Option<FactCheckResult>, PipelineError> {
    let linked = conn
        .query_row(
            "SELECT * FROM fact_check_results WHERE artifact_id = ?
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![artifact.id.to_string()],
            fact_check_from_row,
        )
        .optional()?;

    if linked.is_some() {
        return Ok(linked);
    }

    let by_claim = conn
        .query_row(
            "SELECT * FROM fact_check_results WHERE claim = ?
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![artifact.claim()],
            fact_check_from_row,
        )
        .optional()?;

    Ok(by_claim)
}
