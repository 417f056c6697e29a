//! Content artifact rows

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::ContentArtifact;
use crate::error::PipelineError;

use super::parse_column;

fn artifact_from_row(row: &Row) -> rusqlite::Result<ContentArtifact> {
    Ok(ContentArtifact {
        id: parse_column(row, "id")?,
        prompt_id: parse_column(row, "prompt_id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert_artifact(conn: &Connection, artifact: &ContentArtifact) -> Result<(), PipelineError> {
    conn.execute(
        "INSERT INTO content_artifacts (id, prompt_id, title, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            artifact.id.to_string(),
            artifact.prompt_id.to_string(),
            artifact.title,
            artifact.body,
            artifact.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_artifact(conn: &Connection, id: Uuid) -> Result<Option<ContentArtifact>, PipelineError> {
    let artifact = conn
        .query_row(
            "SELECT * FROM content_artifacts WHERE id = ?",
            params![id.to_string()],
            artifact_from_row,
        )
        .optional()?;
    Ok(artifact)
}

pub fn get_artifact_for_prompt(
    conn: &Connection,
    prompt_id: Uuid,
) -> Result<Option<ContentArtifact>, PipelineError> {
    let artifact = conn
        .query_row(
            "SELECT * FROM content_artifacts WHERE prompt_id = ?",
            params![prompt_id.to_string()],
            artifact_from_row,
        )
        .optional()?;
    Ok(artifact)
}

/// List artifacts, newest first
pub fn list_artifacts(conn: &Connection, limit: u32) -> Result<Vec<ContentArtifact>, PipelineError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM content_artifacts ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )?;

    let artifacts = stmt
        .query_map(params![limit], artifact_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(artifacts)
}
