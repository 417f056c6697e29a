//! Append-only pipeline journal with file-based persistence.
//!
//! Each artifact gets its own directory holding an `events.jsonl` file.
//! Events are newline-delimited JSON so a run can be inspected with `cat`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::{Event, EventType, PipelineRun, Stage};

/// Journal for a single artifact
pub struct ArtifactJournal {
    artifact_id: Uuid,
    events_path: PathBuf,
}

impl ArtifactJournal {
    /// Create or open the journal for an artifact under `base_dir`
    pub async fn open(base_dir: &Path, artifact_id: Uuid) -> Result<Self> {
        let artifact_dir = base_dir.join(artifact_id.to_string());

        fs::create_dir_all(&artifact_dir)
            .await
            .with_context(|| format!("Failed to create journal directory: {}", artifact_dir.display()))?;

        Ok(Self {
            artifact_id,
            events_path: artifact_dir.join("events.jsonl"),
        })
    }

    pub fn artifact_id(&self) -> Uuid {
        self.artifact_id
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Append an event to the log
    pub async fn append(&self, event: &Event) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let json = serde_json::to_string(event).context("Failed to serialize event")?;
        file.write_all(format!("{}\n", json).as_bytes())
            .await
            .context("Failed to write event")?;
        file.flush().await.context("Failed to flush event")?;

        Ok(())
    }

    /// Replay all events in order
    pub async fn replay(&self) -> Result<Vec<Event>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse event: {}", line))?;
            events.push(event);
        }

        Ok(events)
    }

    /// Check if a stage already completed for this key
    pub async fn is_stage_completed(&self, idempotency_key: &str) -> Result<bool> {
        let events = self.replay().await?;

        Ok(events.iter().any(|e| {
            e.idempotency_key == idempotency_key && e.event_type == EventType::StageCompleted
        }))
    }

    /// Replay into the pipeline state, `None` if nothing was recorded
    pub async fn run(&self) -> Result<Option<PipelineRun>> {
        let events = self.replay().await?;
        Ok(PipelineRun::from_events(&events))
    }
}

/// Generate an idempotency key for a stage
pub fn generate_idempotency_key(artifact_id: Uuid, stage: Stage, input: &str) -> String {
    format!("{}:{}:{}", artifact_id, stage, hash_input(input))
}

/// Hash input content (first 16 hex chars of SHA256)
pub fn hash_input(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..8])
}
