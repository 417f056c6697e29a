//! Idempotency Integration Tests
//!
//! Idempotency keys, journal replay and stage skipping on reruns.

mod common;

use common::{FixedGenerator, Harness, ScriptedFactSource};
use newsgate::core::{generate_idempotency_key, hash_input, ArtifactJournal};
use newsgate::domain::{ArtifactState, Event, EventType, GenerationRequest, Stage, StageStatus};
use tempfile::TempDir;
use uuid::Uuid;

fn completed(artifact_id: Uuid, stage: Stage, key: &str) -> Event {
    Event::new(
        artifact_id,
        Some(stage),
        EventType::StageCompleted,
        key.to_string(),
        format!("{} completed", stage),
        StageStatus::Completed,
    )
}

#[test]
fn test_idempotency_key_format() {
    let artifact_id = Uuid::new_v4();
    let key = generate_idempotency_key(artifact_id, Stage::FactCheck, "Vaccines cause autism");

    let parts: Vec<&str> = key.split(':').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], artifact_id.to_string());
    assert_eq!(parts[1], "fact_check");
    assert_eq!(parts[2].len(), 16);
    assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_idempotency_key_is_deterministic() {
    let artifact_id = Uuid::new_v4();

    let first = generate_idempotency_key(artifact_id, Stage::Processing, "body");
    let second = generate_idempotency_key(artifact_id, Stage::Processing, "body");
    assert_eq!(first, second);

    assert_ne!(first, generate_idempotency_key(artifact_id, Stage::Processing, "other body"));
    assert_ne!(first, generate_idempotency_key(artifact_id, Stage::Categorization, "body"));
    assert_ne!(first, generate_idempotency_key(Uuid::new_v4(), Stage::Processing, "body"));
}

#[test]
fn test_hash_input_length() {
    assert_eq!(hash_input("").len(), 16);
    assert_eq!(hash_input(&"x".repeat(10_000)).len(), 16);
    assert_ne!(hash_input("a"), hash_input("b"));
}

#[tokio::test]
async fn test_completed_stage_is_detected() {
    let dir = TempDir::new().unwrap();
    let artifact_id = Uuid::new_v4();
    let journal = ArtifactJournal::open(dir.path(), artifact_id).await.unwrap();

    let key = generate_idempotency_key(artifact_id, Stage::FactCheck, "claim");
    assert!(!journal.is_stage_completed(&key).await.unwrap());

    journal
        .append(&Event::new(
            artifact_id,
            Some(Stage::FactCheck),
            EventType::StageStarted,
            key.clone(),
            "started".to_string(),
            StageStatus::Running,
        ))
        .await
        .unwrap();
    assert!(!journal.is_stage_completed(&key).await.unwrap());

    journal.append(&completed(artifact_id, Stage::FactCheck, &key)).await.unwrap();
    assert!(journal.is_stage_completed(&key).await.unwrap());

    let other = generate_idempotency_key(artifact_id, Stage::FactCheck, "edited claim");
    assert!(!journal.is_stage_completed(&other).await.unwrap());
}

#[tokio::test]
async fn test_journal_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let artifact_id = Uuid::new_v4();

    {
        let journal = ArtifactJournal::open(dir.path(), artifact_id).await.unwrap();
        journal
            .append(&Event::new(
                artifact_id,
                None,
                EventType::ArtifactCreated,
                format!("{}:created", artifact_id),
                "created".to_string(),
                StageStatus::Completed,
            ))
            .await
            .unwrap();
        journal
            .append(&completed(artifact_id, Stage::FactCheck, "k1"))
            .await
            .unwrap();
    }

    let reopened = ArtifactJournal::open(dir.path(), artifact_id).await.unwrap();
    assert_eq!(reopened.replay().await.unwrap().len(), 2);
    assert!(reopened.events_path().ends_with("events.jsonl"));

    let run = reopened.run().await.unwrap().unwrap();
    assert_eq!(run.state, ArtifactState::FactChecked);
    assert_eq!(run.stage_status(Stage::FactCheck), StageStatus::Completed);
}

#[tokio::test]
async fn test_rerun_skips_completed_fact_check() {
    let harness = Harness::new(
        FixedGenerator::new("Rates hold. The central bank kept rates unchanged."),
        ScriptedFactSource::rating("Mostly True"),
    );

    let report = harness
        .orchestrator
        .submit_prompt(&GenerationRequest::new("Write about rates"))
        .await
        .unwrap();
    assert_eq!(harness.fact_source.call_count(), 1);

    let rerun = harness.orchestrator.on_artifact_created(&report.artifact).await;
    assert_eq!(harness.fact_source.call_count(), 1);
    assert_eq!(
        rerun.fact_check.map(|f| f.id),
        report.fact_check.map(|f| f.id)
    );
    assert_eq!(harness.store.stats().unwrap().processed, 1);
    assert_eq!(harness.store.stats().unwrap().published, 1);

    let journal = ArtifactJournal::open(harness.journal.path(), report.artifact.id)
        .await
        .unwrap();
    let skipped = journal
        .replay()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.event_type == EventType::StageSkipped && e.stage == Some(Stage::FactCheck))
        .count();
    assert_eq!(skipped, 1);
}
