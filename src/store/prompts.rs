//! Prompt rows

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::domain::{Prompt, PromptStatus};
use crate::error::PipelineError;

use super::parse_column;

fn prompt_from_row(row: &Row) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: parse_column(row, "id")?,
        prompt_text: row.get("prompt_text")?,
        temperature: row.get("temperature")?,
        token_limit: row.get("token_limit")?,
        status: parse_column(row, "status")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert_prompt(conn: &Connection, prompt: &Prompt) -> Result<(), PipelineError> {
    conn.execute(
        "INSERT INTO prompts (id, prompt_text, temperature, token_limit, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            prompt.id.to_string(),
            prompt.prompt_text,
            prompt.temperature,
            prompt.token_limit,
            prompt.status.as_str(),
            prompt.created_at,
        ],
    )?;
    Ok(())
}

/// Move a prompt out of `pending`. Returns false if the prompt does not exist.
pub fn set_prompt_status(
    conn: &Connection,
    id: Uuid,
    status: PromptStatus,
) -> Result<bool, PipelineError> {
    let changed = conn.execute(
        "UPDATE prompts SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    Ok(changed == 1)
}

pub fn get_prompt(conn: &Connection, id: Uuid) -> Result<Option<Prompt>, PipelineError> {
    let prompt = conn
        .query_row(
            "SELECT * FROM prompts WHERE id = ?",
            params![id.to_string()],
            prompt_from_row,
        )
        .optional()?;
    Ok(prompt)
}

/// Delete a prompt and, through cascades, everything generated from it
pub fn delete_prompt(conn: &Connection, id: Uuid) -> Result<bool, PipelineError> {
    let changed = conn.execute("DELETE FROM prompts WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}
