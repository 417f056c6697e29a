//! Processed and published content rows

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::{Evidence, ProcessedContent, PublishedContent};
use crate::error::PipelineError;

use super::{json_column, optional_uuid_column, parse_column};

fn processed_from_row(row: &Row) -> rusqlite::Result<ProcessedContent> {
    Ok(ProcessedContent {
        id: parse_column(row, "id")?,
        artifact_id: parse_column(row, "artifact_id")?,
        fact_check_id: optional_uuid_column(row, "fact_check_id")?,
        categories: json_column(row, "categories_json")?,
        tags: json_column(row, "tags_json")?,
        fact_check_status: row.get("fact_check_status")?,
        composite_score: row.get("composite_score")?,
        evidence: json_column(row, "evidence_json")?,
        publish_status: parse_column(row, "publish_status")?,
        processed_at: row.get("processed_at")?,
    })
}

fn published_from_row(row: &Row) -> rusqlite::Result<PublishedContent> {
    Ok(PublishedContent {
        id: parse_column(row, "id")?,
        processed_id: parse_column(row, "processed_id")?,
        title: row.get("title")?,
        body: row.get("body")?,
        fact_check_status: row.get("fact_check_status")?,
        evidence: json_column(row, "evidence_json")?,
        category: row.get("category")?,
        tags: json_column(row, "tags_json")?,
        image_url: row.get("image_url")?,
        video_url: row.get("video_url")?,
        published_at: row.get("published_at")?,
        manually_overridden: row.get("manually_overridden")?,
    })
}

pub fn insert_processed(conn: &Connection, processed: &ProcessedContent) -> Result<(), PipelineError> {
    conn.execute(
        "INSERT INTO processed_content
            (id, artifact_id, fact_check_id, categories_json, tags_json, fact_check_status,
             composite_score, evidence_json, publish_status, processed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            processed.id.to_string(),
            processed.artifact_id.to_string(),
            processed.fact_check_id.map(|id| id.to_string()),
            serde_json::to_string(&processed.categories)?,
            serde_json::to_string(&processed.tags)?,
            processed.fact_check_status,
            processed.composite_score,
            serde_json::to_string(&processed.evidence)?,
            processed.publish_status.as_str(),
            processed.processed_at,
        ],
    )?;
    Ok(())
}

pub fn get_processed(conn: &Connection, id: Uuid) -> Result<Option<ProcessedContent>, PipelineError> {
    let processed = conn
        .query_row(
            "SELECT * FROM processed_content WHERE id = ?",
            params![id.to_string()],
            processed_from_row,
        )
        .optional()?;
    Ok(processed)
}

pub fn get_processed_for_artifact(
    conn: &Connection,
    artifact_id: Uuid,
) -> Result<Option<ProcessedContent>, PipelineError> {
    let processed = conn
        .query_row(
            "SELECT * FROM processed_content WHERE artifact_id = ?",
            params![artifact_id.to_string()],
            processed_from_row,
        )
        .optional()?;
    Ok(processed)
}

/// Insert unless a record already exists for the same processed content.
/// Returns true if this call created the row.
pub fn insert_published_if_absent(
    conn: &Connection,
    published: &PublishedContent,
) -> Result<bool, PipelineError> {
    let changed = conn.execute(
        "INSERT INTO published_content
            (id, processed_id, title, body, fact_check_status, evidence_json, category,
             tags_json, image_url, video_url, published_at, manually_overridden)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(processed_id) DO NOTHING",
        params![
            published.id.to_string(),
            published.processed_id.to_string(),
            published.title,
            published.body,
            published.fact_check_status,
            serde_json::to_string(&published.evidence)?,
            published.category,
            serde_json::to_string(&published.tags)?,
            published.image_url,
            published.video_url,
            published.published_at,
            published.manually_overridden,
        ],
    )?;
    Ok(changed == 1)
}

pub fn get_published(conn: &Connection, id: Uuid) -> Result<Option<PublishedContent>, PipelineError> {
    let published = conn
        .query_row(
            "SELECT * FROM published_content WHERE id = ?",
            params![id.to_string()],
            published_from_row,
        )
        .optional()?;
    Ok(published)
}

pub fn get_published_for_processed(
    conn: &Connection,
    processed_id: Uuid,
) -> Result<Option<PublishedContent>, PipelineError> {
    let published = conn
        .query_row(
            "SELECT * FROM published_content WHERE processed_id = ?",
            params![processed_id.to_string()],
            published_from_row,
        )
        .optional()?;
    Ok(published)
}

/// Replace evidence with an operator-supplied value and pin it.
/// Returns false if the record does not exist.
pub fn set_evidence_override(
    conn: &Connection,
    id: Uuid,
    evidence: &Evidence,
) -> Result<bool, PipelineError> {
    let changed = conn.execute(
        "UPDATE published_content SET evidence_json = ?1, manually_overridden = 1 WHERE id = ?2",
        params![serde_json::to_string(evidence)?, id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Evidence for a news article, following artifact -> processed -> published
pub fn evidence_for_artifact(
    conn: &Connection,
    artifact_id: Uuid,
) -> Result<Option<Evidence>, PipelineError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT pub.evidence_json
             FROM content_artifacts a
             JOIN processed_content pc ON pc.artifact_id = a.id
             JOIN published_content pub ON pub.processed_id = pc.id
             WHERE a.id = ?",
            params![artifact_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}
