//! SQLite persistence for the content pipeline.
//!
//! ## Tables
//!
//! - `prompts` - Client prompts and their generation status
//! - `content_artifacts` - Generated articles (one per prompt)
//! - `fact_check_results` - Append-only verdicts
//! - `processed_content` - Categorized, gatekept articles (one per artifact)
//! - `published_content` - Publish-ready records (one per processed article)
//!
//! Every multi-row write runs in a single transaction. The connection lock
//! is held only for the duration of a call, never across network I/O.

pub mod artifacts;
pub mod fact_checks;
pub mod processed;
pub mod prompts;
pub mod schema;

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    ContentArtifact, Evidence, FactCheckResult, ProcessedContent, Prompt, PromptStatus,
    PublishedContent,
};
use crate::error::PipelineError;

/// SQLite database for pipeline entities
pub struct ContentStore {
    conn: Mutex<Connection>,
}

impl ContentStore {
    /// Open or create the database file
    pub fn open(db_path: &Path) -> Result<Self, PipelineError> {
        info!("Opening SQLite database at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, PipelineError> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PipelineError> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&Connection) -> Result<T, PipelineError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PipelineError::Server(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Execute a write operation with exclusive access
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T, PipelineError>
    where
        F: FnOnce(&mut Connection) -> Result<T, PipelineError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| PipelineError::Server(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    // ------------------------------------------------------------------
    // Prompts and artifacts
    // ------------------------------------------------------------------

    pub fn create_prompt(&self, prompt: &Prompt) -> Result<(), PipelineError> {
        self.with_conn(|conn| prompts::insert_prompt(conn, prompt))
    }

    pub fn prompt(&self, id: Uuid) -> Result<Option<Prompt>, PipelineError> {
        self.with_conn(|conn| prompts::get_prompt(conn, id))
    }

    pub fn mark_prompt(&self, id: Uuid, status: PromptStatus) -> Result<(), PipelineError> {
        self.with_conn(|conn| {
            if prompts::set_prompt_status(conn, id, status)? {
                Ok(())
            } else {
                Err(PipelineError::not_found("Prompt", id))
            }
        })
    }

    /// Store the artifact and complete its prompt in one transaction
    pub fn commit_generation(&self, artifact: &ContentArtifact) -> Result<(), PipelineError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            artifacts::insert_artifact(&tx, artifact)?;
            if !prompts::set_prompt_status(&tx, artifact.prompt_id, PromptStatus::Completed)? {
                return Err(PipelineError::not_found("Prompt", artifact.prompt_id));
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_prompt(&self, id: Uuid) -> Result<bool, PipelineError> {
        self.with_conn(|conn| prompts::delete_prompt(conn, id))
    }

    pub fn artifact(&self, id: Uuid) -> Result<Option<ContentArtifact>, PipelineError> {
        self.with_conn(|conn| artifacts::get_artifact(conn, id))
    }

    pub fn artifact_for_prompt(&self, prompt_id: Uuid) -> Result<Option<ContentArtifact>, PipelineError> {
        self.with_conn(|conn| artifacts::get_artifact_for_prompt(conn, prompt_id))
    }

    pub fn artifacts(&self, limit: u32) -> Result<Vec<ContentArtifact>, PipelineError> {
        self.with_conn(|conn| artifacts::list_artifacts(conn, limit))
    }

    // ------------------------------------------------------------------
    // Fact checks
    // ------------------------------------------------------------------

    pub fn record_fact_check(&self, result: &FactCheckResult) -> Result<(), PipelineError> {
        self.with_conn(|conn| fact_checks::insert_fact_check(conn, result))
    }

    pub fn current_fact_check(
        &self,
        artifact: &ContentArtifact,
    ) -> Result<Option<FactCheckResult>, PipelineError> {
        self.with_conn(|conn| fact_checks::current_for_artifact(conn, artifact))
    }

    // ------------------------------------------------------------------
    // Processing and publication
    // ------------------------------------------------------------------

    /// Insert a processed record, refusing a second one for the same artifact
    pub fn create_processed(&self, record: &ProcessedContent) -> Result<(), PipelineError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if processed::get_processed_for_artifact(&tx, record.artifact_id)?.is_some() {
                return Err(PipelineError::AlreadyProcessed(record.artifact_id));
            }
            processed::insert_processed(&tx, record)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn processed(&self, id: Uuid) -> Result<Option<ProcessedContent>, PipelineError> {
        self.with_conn(|conn| processed::get_processed(conn, id))
    }

    pub fn processed_for_artifact(
        &self,
        artifact_id: Uuid,
    ) -> Result<Option<ProcessedContent>, PipelineError> {
        self.with_conn(|conn| processed::get_processed_for_artifact(conn, artifact_id))
    }

    /// Lookup-or-create keyed on the processed record.
    ///
    /// Returns the stored row and whether this call created it. An existing
    /// row is returned unchanged.
    pub fn publish_once(
        &self,
        candidate: &PublishedContent,
    ) -> Result<(PublishedContent, bool), PipelineError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let created = processed::insert_published_if_absent(&tx, candidate)?;
            let stored = processed::get_published_for_processed(&tx, candidate.processed_id)?
                .ok_or_else(|| PipelineError::not_found("Published content", candidate.processed_id))?;
            tx.commit()?;
            Ok((stored, created))
        })
    }

    pub fn published(&self, id: Uuid) -> Result<Option<PublishedContent>, PipelineError> {
        self.with_conn(|conn| processed::get_published(conn, id))
    }

    pub fn published_for_processed(
        &self,
        processed_id: Uuid,
    ) -> Result<Option<PublishedContent>, PipelineError> {
        self.with_conn(|conn| processed::get_published_for_processed(conn, processed_id))
    }

    /// Set operator evidence and return the updated record
    pub fn override_evidence(
        &self,
        published_id: Uuid,
        evidence: &Evidence,
    ) -> Result<PublishedContent, PipelineError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if !processed::set_evidence_override(&tx, published_id, evidence)? {
                return Err(PipelineError::not_found("Published content", published_id));
            }
            let updated = processed::get_published(&tx, published_id)?
                .ok_or_else(|| PipelineError::not_found("Published content", published_id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    pub fn evidence_for_article(&self, artifact_id: Uuid) -> Result<Option<Evidence>, PipelineError> {
        self.with_conn(|conn| processed::evidence_for_artifact(conn, artifact_id))
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<StoreStats, PipelineError> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64, PipelineError> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
                Ok(n as u64)
            };

            Ok(StoreStats {
                prompts: count("prompts")?,
                artifacts: count("content_artifacts")?,
                fact_checks: count("fact_check_results")?,
                processed: count("processed_content")?,
                published: count("published_content")?,
            })
        })
    }
}

/// Row counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub prompts: u64,
    pub artifacts: u64,
    pub fact_checks: u64,
    pub processed: u64,
    pub published: u64,
}

/// Read a text column through `FromStr`
pub(crate) fn parse_column<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(column)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.to_string().into())
    })
}

pub(crate) fn optional_uuid_column(row: &Row, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
        })
    })
    .transpose()
}

/// Read a JSON text column
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FactCheckOutcome, GenerationRequest, PublishStatus, SupportingDocument};
    use std::collections::BTreeSet;

    fn seeded_store() -> (ContentStore, ContentArtifact) {
        let store = ContentStore::open_in_memory().unwrap();
        let prompt = Prompt::pending(&GenerationRequest::new("Write about wellness"));
        store.create_prompt(&prompt).unwrap();

        let artifact = ContentArtifact::new(
            prompt.id,
            "Wellness trends.".to_string(),
            "Doctors discuss health and wellness.".to_string(),
        );
        store.commit_generation(&artifact).unwrap();
        (store, artifact)
    }

    fn processed_for(artifact: &ContentArtifact, evidence: Evidence) -> ProcessedContent {
        ProcessedContent {
            id: Uuid::new_v4(),
            artifact_id: artifact.id,
            fact_check_id: None,
            categories: BTreeSet::from(["Health".to_string()]),
            tags: vec!["Doctors".to_string()],
            fact_check_status: "Unverified".to_string(),
            composite_score: 0.0,
            evidence,
            publish_status: PublishStatus::Published,
            processed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_commit_generation_completes_prompt() {
        let (store, artifact) = seeded_store();

        let prompt = store.prompt(artifact.prompt_id).unwrap().unwrap();
        assert_eq!(prompt.status, PromptStatus::Completed);
        assert_eq!(store.artifact(artifact.id).unwrap(), Some(artifact.clone()));
        assert_eq!(
            store.artifact_for_prompt(artifact.prompt_id).unwrap().map(|a| a.id),
            Some(artifact.id)
        );
    }

    #[test]
    fn test_second_artifact_for_prompt_rejected() {
        let (store, artifact) = seeded_store();

        let duplicate = ContentArtifact::new(artifact.prompt_id, "Again.".to_string(), String::new());
        assert!(matches!(
            store.commit_generation(&duplicate),
            Err(PipelineError::Storage(_))
        ));
        assert_eq!(store.stats().unwrap().artifacts, 1);
    }

    #[test]
    fn test_current_fact_check_prefers_newest_linked() {
        let (store, artifact) = seeded_store();

        let by_claim = FactCheckResult::new(artifact.body.clone(), None, FactCheckOutcome::unverified());
        store.record_fact_check(&by_claim).unwrap();
        assert_eq!(store.current_fact_check(&artifact).unwrap().map(|r| r.id), Some(by_claim.id));

        let first = FactCheckResult::new(artifact.body.clone(), Some(artifact.id), FactCheckOutcome::error());
        let second = FactCheckResult::new(
            artifact.body.clone(),
            Some(artifact.id),
            FactCheckOutcome::unverified(),
        );
        store.record_fact_check(&first).unwrap();
        store.record_fact_check(&second).unwrap();

        let current = store.current_fact_check(&artifact).unwrap().unwrap();
        assert_eq!(current.id, second.id);
    }

    #[test]
    fn test_create_processed_twice_is_already_processed() {
        let (store, artifact) = seeded_store();

        store.create_processed(&processed_for(&artifact, Evidence::default())).unwrap();
        let result = store.create_processed(&processed_for(&artifact, Evidence::default()));

        assert!(matches!(result, Err(PipelineError::AlreadyProcessed(id)) if id == artifact.id));
        assert_eq!(store.stats().unwrap().processed, 1);
    }

    #[test]
    fn test_publish_once_returns_existing_row() {
        let (store, artifact) = seeded_store();
        let processed = processed_for(&artifact, Evidence::default());
        store.create_processed(&processed).unwrap();

        let (first, created) = store
            .publish_once(&PublishedContent::from_processed(&processed, &artifact))
            .unwrap();
        assert!(created);
        assert_eq!(first.category, "Health");

        let (second, created_again) = store
            .publish_once(&PublishedContent::from_processed(&processed, &artifact))
            .unwrap();
        assert!(!created_again);
        assert_eq!(first, second);
        assert_eq!(store.stats().unwrap().published, 1);
    }

    #[test]
    fn test_evidence_override_and_article_lookup() {
        let (store, artifact) = seeded_store();
        let processed = processed_for(&artifact, Evidence::default());
        store.create_processed(&processed).unwrap();
        let (published, _) = store
            .publish_once(&PublishedContent::from_processed(&processed, &artifact))
            .unwrap();

        let operator = Evidence {
            url: "https://desk.example/review".to_string(),
            source: "Editorial desk".to_string(),
            supporting_documents: vec![SupportingDocument {
                url: "https://desk.example/doc".to_string(),
                title: "Notes".to_string(),
            }],
            ..Default::default()
        };
        let updated = store.override_evidence(published.id, &operator).unwrap();

        assert!(updated.manually_overridden);
        assert_eq!(updated.evidence, operator);
        assert_eq!(store.evidence_for_article(artifact.id).unwrap(), Some(operator));
    }

    #[test]
    fn test_override_missing_record_is_not_found() {
        let store = ContentStore::open_in_memory().unwrap();
        let result = store.override_evidence(Uuid::new_v4(), &Evidence::default());
        assert!(matches!(result, Err(PipelineError::NotFound { .. })));
    }

    #[test]
    fn test_deleting_prompt_cascades() {
        let (store, artifact) = seeded_store();
        let processed = processed_for(&artifact, Evidence::default());
        store.create_processed(&processed).unwrap();
        store
            .publish_once(&PublishedContent::from_processed(&processed, &artifact))
            .unwrap();

        assert!(store.delete_prompt(artifact.prompt_id).unwrap());

        let stats = store.stats().unwrap();
        assert_eq!(stats.artifacts, 0);
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.published, 0);
    }
}
