//! Publication stage: materialize publish-ready records.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{Evidence, ProcessedContent, PublishedContent};
use crate::error::PipelineError;
use crate::store::ContentStore;

pub struct PublicationStage {
    store: Arc<ContentStore>,
}

impl PublicationStage {
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    /// Lookup-or-create the published record for a processed article.
    ///
    /// Returns `None` when the article was withheld. Safe to call more than
    /// once: later calls return the stored row unchanged.
    #[instrument(skip(self, processed), fields(processed_id = %processed.id))]
    pub fn publish_if_allowed(
        &self,
        processed: &ProcessedContent,
    ) -> Result<Option<PublishedContent>, PipelineError> {
        if !processed.publish_status.is_published() {
            debug!("Withheld; nothing to publish");
            return Ok(None);
        }

        let artifact = self
            .store
            .artifact(processed.artifact_id)?
            .ok_or_else(|| PipelineError::not_found("Content artifact", processed.artifact_id))?;

        let candidate = PublishedContent::from_processed(processed, &artifact);
        let (published, created) = self.store.publish_once(&candidate)?;

        if created {
            info!(published_id = %published.id, "Published");
        } else {
            debug!(published_id = %published.id, "Already published");
        }
        Ok(Some(published))
    }

    /// Operator evidence override; pins the evidence against re-derivation
    #[instrument(skip(self, evidence))]
    pub fn override_evidence(
        &self,
        published_id: Uuid,
        evidence: &Evidence,
    ) -> Result<PublishedContent, PipelineError> {
        let updated = self.store.override_evidence(published_id, evidence)?;
        info!(published_id = %published_id, "Evidence overridden");
        Ok(updated)
    }
}
