//! Journal events for the per-artifact pipeline.
//!
//! Every stage transition is recorded as an immutable event in an
//! append-only log. The state of an artifact's pipeline can be reconstructed
//! by replaying its events in order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single event in the append-only journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier for this event
    pub id: Uuid,

    /// When this event occurred (ISO 8601)
    pub timestamp: DateTime<Utc>,

    /// The artifact this event belongs to
    pub artifact_id: Uuid,

    /// Stage that emitted the event (if applicable)
    pub stage: Option<Stage>,

    /// Type of event
    pub event_type: EventType,

    /// Idempotency key format: "{artifact_id}:{stage}:{input_hash}"
    pub idempotency_key: String,

    /// Human-readable summary (NO secrets)
    pub payload_summary: String,

    /// Status of the stage after this event
    pub status: StageStatus,

    /// Time taken in milliseconds (for finished stages)
    pub duration_ms: Option<u64>,

    /// Error message if failed
    pub error: Option<String>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(
        artifact_id: Uuid,
        stage: Option<Stage>,
        event_type: EventType,
        idempotency_key: String,
        payload_summary: String,
        status: StageStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            artifact_id,
            stage,
            event_type,
            idempotency_key,
            payload_summary,
            status,
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Stages of the content pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generation,
    FactCheck,
    Categorization,
    Processing,
    Publication,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::FactCheck => "fact_check",
            Self::Categorization => "categorization",
            Self::Processing => "processing",
            Self::Publication => "publication",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Types of events recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The artifact was committed by the generation stage
    ArtifactCreated,

    /// A stage has started
    StageStarted,

    /// A stage completed successfully
    StageCompleted,

    /// A stage failed; no retry is scheduled
    StageFailed,

    /// A stage was skipped (idempotency check)
    StageSkipped,

    /// Gatekeeping allowed publication and the record exists
    Published,

    /// Gatekeeping withheld the artifact
    Withheld,
}

/// Status of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = Event::new(
            Uuid::new_v4(),
            Some(Stage::FactCheck),
            EventType::StageStarted,
            "test-key".to_string(),
            "Checking claim".to_string(),
            StageStatus::Running,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"stage\":\"fact_check\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type, EventType::StageStarted);
        assert_eq!(parsed.stage, Some(Stage::FactCheck));
    }

    #[test]
    fn test_event_with_error() {
        let event = Event::new(
            Uuid::new_v4(),
            Some(Stage::Categorization),
            EventType::StageFailed,
            "test-key".to_string(),
            "Categorization failed".to_string(),
            StageStatus::Failed,
        )
        .with_duration(12)
        .with_error("body too large".to_string());

        assert_eq!(event.duration_ms, Some(12));
        assert_eq!(event.error.as_deref(), Some("body too large"));
    }
}
