//! Per-artifact pipeline state reconstructed from journal events.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{Event, EventType, Stage, StageStatus};

/// Position of an artifact in the pipeline.
///
/// Ordered: a replay never moves an artifact backwards, so a late
/// fact-check completion after processing leaves it `Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Created,
    FactChecked,
    Processed,
    Published,
    Withheld,
}

impl ArtifactState {
    /// Terminal states end the pipeline for the artifact
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Withheld)
    }
}

/// The pipeline run for one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub artifact_id: Uuid,
    pub state: ArtifactState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stage_statuses: HashMap<Stage, StageStatus>,
    /// Last stage error seen, if any
    pub last_error: Option<String>,
}

impl PipelineRun {
    pub fn new(artifact_id: Uuid) -> Self {
        Self {
            artifact_id,
            state: ArtifactState::Created,
            started_at: Utc::now(),
            finished_at: None,
            stage_statuses: HashMap::new(),
            last_error: None,
        }
    }

    /// Reconstruct state from a sequence of events
    pub fn from_events(events: &[Event]) -> Option<Self> {
        let first_event = events.first()?;

        let mut run = Self::new(first_event.artifact_id);
        run.started_at = first_event.timestamp;

        for event in events {
            run.apply_event(event);
        }

        Some(run)
    }

    /// Apply a single event to update state
    pub fn apply_event(&mut self, event: &Event) {
        match event.event_type {
            EventType::ArtifactCreated => {
                self.started_at = event.timestamp;
            }
            EventType::StageStarted => self.set_stage(event, StageStatus::Running),
            EventType::StageCompleted => {
                self.set_stage(event, StageStatus::Completed);
                match event.stage {
                    Some(Stage::FactCheck) => self.advance(ArtifactState::FactChecked),
                    Some(Stage::Processing) => self.advance(ArtifactState::Processed),
                    _ => {}
                }
            }
            EventType::StageFailed => {
                self.set_stage(event, StageStatus::Failed);
                self.last_error = event.error.clone();
            }
            EventType::StageSkipped => self.set_stage(event, StageStatus::Skipped),
            EventType::Published => {
                self.advance(ArtifactState::Published);
                self.finished_at = Some(event.timestamp);
            }
            EventType::Withheld => {
                self.advance(ArtifactState::Withheld);
                self.finished_at = Some(event.timestamp);
            }
        }
    }

    fn set_stage(&mut self, event: &Event, status: StageStatus) {
        if let Some(stage) = event.stage {
            self.stage_statuses.insert(stage, status);
        }
    }

    fn advance(&mut self, next: ArtifactState) {
        if !self.state.is_terminal() && next > self.state {
            self.state = next;
        }
    }

    pub fn stage_status(&self, stage: Stage) -> StageStatus {
        self.stage_statuses.get(&stage).copied().unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(artifact_id: Uuid, stage: Option<Stage>, event_type: EventType, status: StageStatus) -> Event {
        Event::new(
            artifact_id,
            stage,
            event_type,
            format!("{}:test", artifact_id),
            "test".to_string(),
            status,
        )
    }

    #[test]
    fn test_run_from_events_published() {
        let id = Uuid::new_v4();
        let events = vec![
            event(id, None, EventType::ArtifactCreated, StageStatus::Completed),
            event(id, Some(Stage::FactCheck), EventType::StageStarted, StageStatus::Running),
            event(id, Some(Stage::FactCheck), EventType::StageCompleted, StageStatus::Completed),
            event(id, Some(Stage::Processing), EventType::StageCompleted, StageStatus::Completed),
            event(id, Some(Stage::Publication), EventType::Published, StageStatus::Completed),
        ];

        let run = PipelineRun::from_events(&events).unwrap();

        assert_eq!(run.artifact_id, id);
        assert_eq!(run.state, ArtifactState::Published);
        assert_eq!(run.stage_status(Stage::FactCheck), StageStatus::Completed);
        assert!(run.is_finished());
    }

    #[test]
    fn test_late_fact_check_does_not_move_state_back() {
        let id = Uuid::new_v4();
        let events = vec![
            event(id, None, EventType::ArtifactCreated, StageStatus::Completed),
            event(id, Some(Stage::Processing), EventType::StageCompleted, StageStatus::Completed),
            event(id, Some(Stage::FactCheck), EventType::StageCompleted, StageStatus::Completed),
        ];

        let run = PipelineRun::from_events(&events).unwrap();
        assert_eq!(run.state, ArtifactState::Processed);
    }

    #[test]
    fn test_failed_stage_records_error() {
        let id = Uuid::new_v4();
        let events = vec![
            event(id, None, EventType::ArtifactCreated, StageStatus::Completed),
            event(id, Some(Stage::Categorization), EventType::StageFailed, StageStatus::Failed)
                .with_error("body too large".to_string()),
        ];

        let run = PipelineRun::from_events(&events).unwrap();

        assert_eq!(run.state, ArtifactState::Created);
        assert_eq!(run.stage_status(Stage::Categorization), StageStatus::Failed);
        assert_eq!(run.last_error.as_deref(), Some("body too large"));
    }

    #[test]
    fn test_empty_events() {
        assert!(PipelineRun::from_events(&[]).is_none());
    }
}
