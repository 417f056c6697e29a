//! Pipeline orchestrator.
//!
//! Sequences the stages for each artifact once the write that created it has
//! committed:
//!
//! ```text
//! generate -> commit -> { fact-check | categorize } -> process -> gatekeep -> publish
//! ```
//!
//! Fact-checking and categorization run concurrently; processing waits for
//! both and reads whatever fact-check result is current at that moment. A
//! failed stage is logged and journaled; it never aborts the other branch.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{ContentGenerator, FactCheckSource, NewsSource};
use crate::domain::fact_check::RATING_UNVERIFIED;
use crate::domain::{
    ArtifactState, ContentArtifact, Event, EventType, Evidence, FactCheckResult, GenerationRequest,
    Modality, ModalityView, PipelineRun, ProcessedContent, PublishStatus, PublishedContent, Stage,
    StageStatus,
};
use crate::error::PipelineError;
use crate::store::ContentStore;

use super::categorize::{Categorization, CategorizationStage, KeywordTable};
use super::fact_check::FactCheckStage;
use super::gatekeeping::{GatekeepingPolicy, RatingPolicy};
use super::generation::GenerationStage;
use super::journal::{generate_idempotency_key, ArtifactJournal};
use super::publication::PublicationStage;
use super::safety::SafetyLimits;

/// Settings shared by the stages
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Directory holding one journal per artifact
    pub journal_dir: PathBuf,
    pub limits: SafetyLimits,
    pub keywords: KeywordTable,
}

impl PipelineSettings {
    pub fn new(journal_dir: impl Into<PathBuf>) -> Self {
        Self {
            journal_dir: journal_dir.into(),
            limits: SafetyLimits::default(),
            keywords: KeywordTable::default(),
        }
    }
}

/// Result of processing one artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub processed_content_id: Uuid,
    pub artifact_id: Uuid,
    pub categories: BTreeSet<String>,
    pub tags: Vec<String>,
    pub fact_check_status: String,
    pub composite_score: f64,
    pub publish_status: PublishStatus,
    pub published_content_id: Option<Uuid>,
}

impl ProcessingSummary {
    fn new(processed: &ProcessedContent, published: Option<&PublishedContent>) -> Self {
        Self {
            processed_content_id: processed.id,
            artifact_id: processed.artifact_id,
            categories: processed.categories.clone(),
            tags: processed.tags.clone(),
            fact_check_status: processed.fact_check_status.clone(),
            composite_score: processed.composite_score,
            publish_status: processed.publish_status,
            published_content_id: published.map(|p| p.id),
        }
    }
}

/// Everything the pipeline produced for a new artifact
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub artifact: ContentArtifact,
    pub fact_check: Option<FactCheckResult>,
    pub processing: Option<ProcessingSummary>,
    pub state: ArtifactState,
    /// Stage failures caught at the orchestrator boundary
    pub errors: Vec<String>,
}

/// Journal-derived status joined with stored rows
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub artifact_id: Uuid,
    pub run: PipelineRun,
    pub processed_content_id: Option<Uuid>,
    pub published_content_id: Option<Uuid>,
}

/// Main pipeline orchestrator
pub struct PipelineOrchestrator {
    store: Arc<ContentStore>,
    settings: PipelineSettings,
    generation: GenerationStage,
    fact_check: FactCheckStage,
    categorization: CategorizationStage,
    publication: PublicationStage,
    policy: Arc<dyn GatekeepingPolicy>,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<ContentStore>,
        generator: Arc<dyn ContentGenerator>,
        fact_source: Arc<dyn FactCheckSource>,
        settings: PipelineSettings,
    ) -> Self {
        let limits = settings.limits.clone();
        Self {
            generation: GenerationStage::new(generator, store.clone(), limits.clone()),
            fact_check: FactCheckStage::new(fact_source, limits.stage_timeout()),
            categorization: CategorizationStage::new(settings.keywords.clone(), limits),
            publication: PublicationStage::new(store.clone()),
            policy: Arc::new(RatingPolicy),
            store,
            settings,
        }
    }

    /// Append news corroboration to fact-check evidence
    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.fact_check = self.fact_check.with_news(news);
        self
    }

    /// Replace the gatekeeping policy
    pub fn with_policy(mut self, policy: Arc<dyn GatekeepingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.settings.limits
    }

    /// Generate an artifact and run the rest of the pipeline on it.
    ///
    /// Only generation failures are returned as errors; later stage failures
    /// are collected in the report.
    #[instrument(skip(self, request))]
    pub async fn submit_prompt(&self, request: &GenerationRequest) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        let artifact = self.generation.generate(request).await?;

        self.record(Event::new(
            artifact.id,
            Some(Stage::Generation),
            EventType::ArtifactCreated,
            generate_idempotency_key(artifact.id, Stage::Generation, &request.prompt_text),
            format!("Artifact created for prompt {}", artifact.prompt_id),
            StageStatus::Completed,
        )
        .with_duration(elapsed_ms(started)))
        .await;

        Ok(self.on_artifact_created(&artifact).await)
    }

    /// Run fact-checking and categorization, then process and publish
    #[instrument(skip(self, artifact), fields(artifact_id = %artifact.id))]
    pub async fn on_artifact_created(&self, artifact: &ContentArtifact) -> PipelineReport {
        let mut errors = Vec::new();

        let (fact_check, categorization) = tokio::join!(
            self.run_fact_check(artifact),
            self.run_categorization(artifact),
        );

        let fact_check = match fact_check {
            Ok(result) => result,
            Err(e) => {
                error!(artifact_id = %artifact.id, "Fact-check stage failed: {}", e);
                errors.push(format!("fact_check: {}", e));
                None
            }
        };

        let processing = match categorization {
            Ok(categorization) => match self.finalize(artifact, categorization).await {
                Ok(summary) => Some(summary),
                Err(PipelineError::AlreadyProcessed(_)) => {
                    debug!(artifact_id = %artifact.id, "Already processed by another path");
                    self.existing_summary(artifact.id).unwrap_or_else(|e| {
                        errors.push(format!("processing: {}", e));
                        None
                    })
                }
                Err(e) => {
                    error!(artifact_id = %artifact.id, "Processing failed: {}", e);
                    errors.push(format!("processing: {}", e));
                    None
                }
            },
            Err(e) => {
                error!(artifact_id = %artifact.id, "Categorization failed: {}", e);
                errors.push(format!("categorization: {}", e));
                None
            }
        };

        let state = match &processing {
            Some(summary) if summary.publish_status.is_published() => ArtifactState::Published,
            Some(_) => ArtifactState::Withheld,
            None if fact_check.is_some() => ArtifactState::FactChecked,
            None => ArtifactState::Created,
        };

        PipelineReport {
            artifact: artifact.clone(),
            fact_check,
            processing,
            state,
            errors,
        }
    }

    /// Process an artifact on request.
    ///
    /// Fails with `AlreadyProcessed` if a processed record exists, so a
    /// categorization failure can be retried through here exactly once.
    #[instrument(skip(self))]
    pub async fn process_content(&self, artifact_id: Uuid) -> Result<ProcessingSummary, PipelineError> {
        let artifact = self
            .store
            .artifact(artifact_id)?
            .ok_or_else(|| PipelineError::not_found("Content artifact", artifact_id))?;

        if self.store.processed_for_artifact(artifact_id)?.is_some() {
            return Err(PipelineError::AlreadyProcessed(artifact_id));
        }

        let categorization = self.run_categorization(&artifact).await?;
        self.finalize(&artifact, categorization).await
    }

    /// Fact-check a free-standing claim and store the result
    #[instrument(skip(self, claim))]
    pub async fn manual_fact_check(&self, claim: &str) -> Result<FactCheckResult, PipelineError> {
        self.settings.limits.validate_claim(claim)?;

        let result = self.fact_check.check(claim).await;
        self.store.record_fact_check(&result)?;
        info!(fact_check_id = %result.id, rating = %result.textual_rating, "Manual fact-check stored");
        Ok(result)
    }

    pub fn recent_artifacts(&self, limit: u32) -> Result<Vec<ContentArtifact>, PipelineError> {
        self.store.artifacts(limit)
    }

    /// Replay the artifact's journal alongside its stored rows
    pub async fn artifact_status(&self, artifact_id: Uuid) -> Result<ArtifactStatus, PipelineError> {
        if self.store.artifact(artifact_id)?.is_none() {
            return Err(PipelineError::not_found("Content artifact", artifact_id));
        }

        let journal = ArtifactJournal::open(&self.settings.journal_dir, artifact_id)
            .await
            .map_err(|e| PipelineError::Server(format!("{:#}", e)))?;
        let run = journal
            .run()
            .await
            .map_err(|e| PipelineError::Server(format!("{:#}", e)))?
            .unwrap_or_else(|| PipelineRun::new(artifact_id));

        let processed = self.store.processed_for_artifact(artifact_id)?;
        let published = match &processed {
            Some(p) => self.store.published_for_processed(p.id)?,
            None => None,
        };

        Ok(ArtifactStatus {
            artifact_id,
            run,
            processed_content_id: processed.map(|p| p.id),
            published_content_id: published.map(|p| p.id),
        })
    }

    pub fn published(&self, published_id: Uuid) -> Result<PublishedContent, PipelineError> {
        self.store
            .published(published_id)?
            .ok_or_else(|| PipelineError::not_found("Published content", published_id))
    }

    pub fn published_view(&self, published_id: Uuid, modality: Modality) -> Result<ModalityView, PipelineError> {
        Ok(ModalityView::render(&self.published(published_id)?, modality))
    }

    pub fn published_evidence(&self, published_id: Uuid) -> Result<Evidence, PipelineError> {
        Ok(self.published(published_id)?.evidence)
    }

    pub fn override_evidence(
        &self,
        published_id: Uuid,
        evidence: &Evidence,
    ) -> Result<PublishedContent, PipelineError> {
        self.publication.override_evidence(published_id, evidence)
    }

    /// Evidence for an article through artifact, processed and published rows
    pub fn evidence_for_article(&self, artifact_id: Uuid) -> Result<Evidence, PipelineError> {
        self.store
            .evidence_for_article(artifact_id)?
            .ok_or_else(|| PipelineError::not_found("Published evidence for article", artifact_id))
    }

    pub fn categories(&self, processed_id: Uuid) -> Result<BTreeSet<String>, PipelineError> {
        self.store
            .processed(processed_id)?
            .map(|p| p.categories)
            .ok_or_else(|| PipelineError::not_found("Processed content", processed_id))
    }

    // ------------------------------------------------------------------
    // Stage runners
    // ------------------------------------------------------------------

    /// Fact-check the artifact body unless this body was already checked
    async fn run_fact_check(&self, artifact: &ContentArtifact) -> Result<Option<FactCheckResult>, PipelineError> {
        let key = generate_idempotency_key(artifact.id, Stage::FactCheck, artifact.claim());

        if self.stage_completed(artifact.id, &key).await {
            if let Some(existing) = self.store.current_fact_check(artifact)? {
                info!(artifact_id = %artifact.id, "Fact-check already completed, skipping");
                self.record(Event::new(
                    artifact.id,
                    Some(Stage::FactCheck),
                    EventType::StageSkipped,
                    key,
                    "Fact-check skipped (already completed)".to_string(),
                    StageStatus::Skipped,
                ))
                .await;
                return Ok(Some(existing));
            }
        }

        let started = Instant::now();
        self.record(Event::new(
            artifact.id,
            Some(Stage::FactCheck),
            EventType::StageStarted,
            key.clone(),
            "Fact-check started".to_string(),
            StageStatus::Running,
        ))
        .await;

        let result = self.fact_check.check_artifact(artifact).await;
        if let Err(e) = self.store.record_fact_check(&result) {
            self.record_failure(artifact.id, Stage::FactCheck, key, &e, started).await;
            return Err(e);
        }

        self.record(
            Event::new(
                artifact.id,
                Some(Stage::FactCheck),
                EventType::StageCompleted,
                key,
                format!("Fact-check rated '{}'", result.textual_rating),
                StageStatus::Completed,
            )
            .with_duration(elapsed_ms(started)),
        )
        .await;

        Ok(Some(result))
    }

    async fn run_categorization(&self, artifact: &ContentArtifact) -> Result<Categorization, PipelineError> {
        let key = generate_idempotency_key(artifact.id, Stage::Categorization, &artifact.body);
        let started = Instant::now();

        match self.categorization.run(artifact) {
            Ok(categorization) => {
                self.record(
                    Event::new(
                        artifact.id,
                        Some(Stage::Categorization),
                        EventType::StageCompleted,
                        key,
                        format!("{} categories, {} tags", categorization.categories.len(), categorization.tags.len()),
                        StageStatus::Completed,
                    )
                    .with_duration(elapsed_ms(started)),
                )
                .await;
                Ok(categorization)
            }
            Err(e) => {
                self.record_failure(artifact.id, Stage::Categorization, key, &e, started).await;
                Err(e)
            }
        }
    }

    /// Create the processed record from the current fact-check, then publish
    async fn finalize(
        &self,
        artifact: &ContentArtifact,
        categorization: Categorization,
    ) -> Result<ProcessingSummary, PipelineError> {
        let started = Instant::now();
        let key = generate_idempotency_key(artifact.id, Stage::Processing, &artifact.body);

        // Processing ahead of the fact-check yields the unverified defaults
        let current = self.store.current_fact_check(artifact)?;
        let (fact_check_id, fact_check_status, composite_score, evidence) = match current {
            Some(result) => (
                Some(result.id),
                result.textual_rating,
                result.verification_score,
                result.evidence,
            ),
            None => (None, RATING_UNVERIFIED.to_string(), 0.0, Evidence::default()),
        };

        let processed = ProcessedContent {
            id: Uuid::new_v4(),
            artifact_id: artifact.id,
            fact_check_id,
            categories: categorization.categories,
            tags: categorization.tags,
            publish_status: self.policy.decide(&fact_check_status),
            fact_check_status,
            composite_score,
            evidence,
            processed_at: chrono::Utc::now(),
        };

        if let Err(e) = self.store.create_processed(&processed) {
            if !matches!(e, PipelineError::AlreadyProcessed(_)) {
                self.record_failure(artifact.id, Stage::Processing, key, &e, started).await;
            }
            return Err(e);
        }

        self.record(
            Event::new(
                artifact.id,
                Some(Stage::Processing),
                EventType::StageCompleted,
                key,
                format!("Processed as '{}' ({})", processed.fact_check_status, processed.publish_status),
                StageStatus::Completed,
            )
            .with_duration(elapsed_ms(started)),
        )
        .await;

        let published = self.publish(artifact.id, &processed).await?;
        Ok(ProcessingSummary::new(&processed, published.as_ref()))
    }

    async fn publish(
        &self,
        artifact_id: Uuid,
        processed: &ProcessedContent,
    ) -> Result<Option<PublishedContent>, PipelineError> {
        let started = Instant::now();
        let key = generate_idempotency_key(artifact_id, Stage::Publication, &processed.id.to_string());

        let published = match self.publication.publish_if_allowed(processed) {
            Ok(published) => published,
            Err(e) => {
                self.record_failure(artifact_id, Stage::Publication, key, &e, started).await;
                return Err(e);
            }
        };

        let (event_type, summary) = match &published {
            Some(p) => (EventType::Published, format!("Published as {}", p.id)),
            None => (
                EventType::Withheld,
                format!("Withheld: rated '{}'", processed.fact_check_status),
            ),
        };
        info!(artifact_id = %artifact_id, "{}", summary);

        self.record(
            Event::new(
                artifact_id,
                Some(Stage::Publication),
                event_type,
                key,
                summary,
                StageStatus::Completed,
            )
            .with_duration(elapsed_ms(started)),
        )
        .await;

        Ok(published)
    }

    fn existing_summary(&self, artifact_id: Uuid) -> Result<Option<ProcessingSummary>, PipelineError> {
        let Some(processed) = self.store.processed_for_artifact(artifact_id)? else {
            return Ok(None);
        };
        let published = self.store.published_for_processed(processed.id)?;
        Ok(Some(ProcessingSummary::new(&processed, published.as_ref())))
    }

    // ------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------

    /// Append to the artifact's journal; failures are logged only
    async fn record(&self, event: Event) {
        let result = async {
            let journal = ArtifactJournal::open(&self.settings.journal_dir, event.artifact_id).await?;
            journal.append(&event).await
        }
        .await;

        if let Err(e) = result {
            warn!(artifact_id = %event.artifact_id, "Failed to journal event: {:#}", e);
        }
    }

    async fn record_failure(
        &self,
        artifact_id: Uuid,
        stage: Stage,
        key: String,
        error: &PipelineError,
        started: Instant,
    ) {
        self.record(
            Event::new(
                artifact_id,
                Some(stage),
                EventType::StageFailed,
                key,
                format!("{} failed", stage),
                StageStatus::Failed,
            )
            .with_duration(elapsed_ms(started))
            .with_error(error.to_string()),
        )
        .await;
    }

    async fn stage_completed(&self, artifact_id: Uuid, key: &str) -> bool {
        let completed = async {
            let journal = ArtifactJournal::open(&self.settings.journal_dir, artifact_id).await?;
            journal.is_stage_completed(key).await
        }
        .await;

        completed.unwrap_or_else(|e| {
            warn!(artifact_id = %artifact_id, "Failed to read journal: {:#}", e);
            false
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::adapters::{ClaimReview, GeneratedText};

    struct Echo;

    #[async_trait]
    impl ContentGenerator for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, _: f64, _: u32, _: Duration) -> anyhow::Result<GeneratedText> {
            Ok(GeneratedText::from_completion(&format!("Headline. {}", prompt)))
        }
    }

    struct Rated(&'static str);

    #[async_trait]
    impl FactCheckSource for Rated {
        fn name(&self) -> &str {
            "rated"
        }

        async fn search(&self, _: &str, _: Duration) -> anyhow::Result<Option<ClaimReview>> {
            Ok(Some(ClaimReview {
                textual_rating: self.0.to_string(),
                url: Some("https://review.example".to_string()),
                publisher: Some("Reviewer".to_string()),
                title: Some("Review".to_string()),
            }))
        }
    }

    fn orchestrator(rating: &'static str) -> (PipelineOrchestrator, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(ContentStore::open_in_memory().unwrap());
        let orchestrator = PipelineOrchestrator::new(
            store,
            Arc::new(Echo),
            Arc::new(Rated(rating)),
            PipelineSettings::new(temp.path()),
        );
        (orchestrator, temp)
    }

    #[tokio::test]
    async fn test_submit_runs_full_pipeline() {
        let (orchestrator, _temp) = orchestrator("False");

        let report = orchestrator
            .submit_prompt(&GenerationRequest::new("Climate talks resume."))
            .await
            .unwrap();

        assert!(report.errors.is_empty());
        assert_eq!(report.state, ArtifactState::Published);
        let processing = report.processing.unwrap();
        assert_eq!(processing.fact_check_status, "False");
        assert!(processing.categories.contains("Environment"));
        assert!(processing.published_content_id.is_some());
    }

    #[tokio::test]
    async fn test_verified_is_withheld() {
        let (orchestrator, _temp) = orchestrator("Verified");

        let report = orchestrator
            .submit_prompt(&GenerationRequest::new("Some claim."))
            .await
            .unwrap();

        assert_eq!(report.state, ArtifactState::Withheld);
        assert_eq!(orchestrator.store().stats().unwrap().published, 0);

        let status = orchestrator.artifact_status(report.artifact.id).await.unwrap();
        assert_eq!(status.run.state, ArtifactState::Withheld);
        assert!(status.processed_content_id.is_some());
        assert!(status.published_content_id.is_none());
    }

    #[tokio::test]
    async fn test_rerun_skips_fact_check() {
        let (orchestrator, _temp) = orchestrator("True");

        let report = orchestrator
            .submit_prompt(&GenerationRequest::new("Body text."))
            .await
            .unwrap();
        let again = orchestrator.on_artifact_created(&report.artifact).await;

        assert_eq!(orchestrator.store().stats().unwrap().fact_checks, 1);
        assert_eq!(orchestrator.store().stats().unwrap().processed, 1);
        assert_eq!(
            again.processing.map(|p| p.processed_content_id),
            report.processing.map(|p| p.processed_content_id)
        );
    }

    #[tokio::test]
    async fn test_status_for_unknown_artifact() {
        let (orchestrator, _temp) = orchestrator("True");

        let err = orchestrator.artifact_status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }
}
