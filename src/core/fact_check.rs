//! Fact-check stage.
//!
//! Queries the fact-check source for a claim and turns the first review
//! into a scored verdict with structured evidence. Failures never leave
//! this module: they degrade to an `Error` verdict with empty evidence.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::adapters::{ClaimReview, FactCheckSource, NewsSource};
use crate::domain::{
    ContentArtifact, Evidence, FactCheckOutcome, FactCheckResult, SupportingDocument,
};
use crate::error::PipelineError;

const UNKNOWN_SOURCE: &str = "Unknown Source";
const NO_SUMMARY: &str = "No summary available";
const SOURCE_DOCUMENT: &str = "Source Document";
const NEWS_DOCUMENT: &str = "Related coverage";

/// Map a textual rating to a verification score (case-insensitive)
pub fn rating_score(rating: &str) -> f64 {
    match rating.trim().to_lowercase().as_str() {
        "true" => 1.0,
        "mostly true" => 0.8,
        "partly true" => 0.5,
        "mostly false" => 0.2,
        "false" => 0.0,
        _ => 0.0,
    }
}

/// Structured evidence for a review
pub fn evidence_from_review(review: &ClaimReview) -> Evidence {
    let url = review.url.clone().unwrap_or_default();
    let supporting_documents = if url.is_empty() {
        Vec::new()
    } else {
        vec![SupportingDocument {
            url: url.clone(),
            title: review.title.clone().unwrap_or_else(|| SOURCE_DOCUMENT.to_string()),
        }]
    };

    Evidence {
        url,
        source: review.publisher.clone().unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
        summary: review.title.clone().unwrap_or_else(|| NO_SUMMARY.to_string()),
        verification_status: review.textual_rating.clone(),
        supporting_documents,
    }
}

pub struct FactCheckStage {
    source: Arc<dyn FactCheckSource>,
    news: Option<Arc<dyn NewsSource>>,
    timeout: Duration,
}

impl FactCheckStage {
    pub fn new(source: Arc<dyn FactCheckSource>, timeout: Duration) -> Self {
        Self {
            source,
            news: None,
            timeout,
        }
    }

    /// Add a secondary source whose articles are appended as supporting documents
    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }

    /// Check a free-standing claim
    pub async fn check(&self, claim: &str) -> FactCheckResult {
        FactCheckResult::new(claim, None, self.outcome(claim).await)
    }

    /// Check an artifact's body, linking the result to the artifact
    pub async fn check_artifact(&self, artifact: &ContentArtifact) -> FactCheckResult {
        let claim = artifact.claim();
        FactCheckResult::new(claim, Some(artifact.id), self.outcome(claim).await)
    }

    #[instrument(skip(self, claim), fields(source = self.source.name(), claim_len = claim.len()))]
    async fn outcome(&self, claim: &str) -> FactCheckOutcome {
        let mut outcome = match self.query(claim).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Fact-check degraded to error verdict: {}", e);
                return FactCheckOutcome::error();
            }
        };

        if let Some(news) = &self.news {
            self.corroborate(news.as_ref(), claim, &mut outcome.evidence).await;
        }

        debug!(rating = %outcome.textual_rating, score = outcome.verification_score, "Fact-check finished");
        outcome
    }

    async fn query(&self, claim: &str) -> Result<FactCheckOutcome, PipelineError> {
        let review = self
            .source
            .search(claim, self.timeout)
            .await
            .map_err(|e| PipelineError::FactCheckUnavailable(format!("{:#}", e)))?;

        Ok(match review {
            Some(review) => FactCheckOutcome {
                verification_score: rating_score(&review.textual_rating),
                evidence: evidence_from_review(&review),
                textual_rating: review.textual_rating,
            },
            None => FactCheckOutcome::unverified(),
        })
    }

    async fn corroborate(&self, news: &dyn NewsSource, claim: &str, evidence: &mut Evidence) {
        match news.search(claim, self.timeout).await {
            Ok(found) => {
                debug!(source_score = found.source_score, urls = found.evidence_urls.len(), "News corroboration");
                evidence
                    .supporting_documents
                    .extend(found.evidence_urls.into_iter().map(|url| SupportingDocument {
                        url,
                        title: NEWS_DOCUMENT.to_string(),
                    }));
            }
            Err(e) => warn!(source = news.name(), "News corroboration failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::adapters::NewsCorroboration;
    use crate::domain::fact_check::{RATING_ERROR, RATING_UNVERIFIED};

    enum Reply {
        Review(&'static str, Option<&'static str>),
        Nothing,
        Fail,
    }

    struct Source(Reply);

    #[async_trait]
    impl FactCheckSource for Source {
        fn name(&self) -> &str {
            "test"
        }

        async fn search(&self, _: &str, _: Duration) -> anyhow::Result<Option<ClaimReview>> {
            match &self.0 {
                Reply::Review(rating, url) => Ok(Some(ClaimReview {
                    textual_rating: rating.to_string(),
                    url: url.map(str::to_string),
                    publisher: None,
                    title: Some("Review title".to_string()),
                })),
                Reply::Nothing => Ok(None),
                Reply::Fail => anyhow::bail!("connection refused"),
            }
        }
    }

    struct News;

    #[async_trait]
    impl NewsSource for News {
        fn name(&self) -> &str {
            "news"
        }

        async fn search(&self, _: &str, _: Duration) -> anyhow::Result<NewsCorroboration> {
            Ok(NewsCorroboration::from_urls(vec!["https://news.example/1".to_string()]))
        }
    }

    fn stage(reply: Reply) -> FactCheckStage {
        FactCheckStage::new(Arc::new(Source(reply)), Duration::from_secs(1))
    }

    #[test]
    fn test_rating_scores() {
        assert_eq!(rating_score("True"), 1.0);
        assert_eq!(rating_score("TRUE"), 1.0);
        assert_eq!(rating_score("Mostly True"), 0.8);
        assert_eq!(rating_score("partly true"), 0.5);
        assert_eq!(rating_score("Mostly False"), 0.2);
        assert_eq!(rating_score("False"), 0.0);
        assert_eq!(rating_score("Pants on Fire"), 0.0);
    }

    #[test]
    fn test_evidence_defaults() {
        let review = ClaimReview {
            textual_rating: "False".to_string(),
            url: None,
            publisher: None,
            title: None,
        };
        let evidence = evidence_from_review(&review);

        assert_eq!(evidence.source, UNKNOWN_SOURCE);
        assert_eq!(evidence.summary, NO_SUMMARY);
        assert_eq!(evidence.verification_status, "False");
        assert!(evidence.supporting_documents.is_empty());
    }

    #[tokio::test]
    async fn test_review_is_scored() {
        let result = stage(Reply::Review("Mostly True", Some("https://r.example"))).check("claim").await;

        assert_eq!(result.textual_rating, "Mostly True");
        assert_eq!(result.verification_score, 0.8);
        assert_eq!(result.evidence.url, "https://r.example");
        assert_eq!(result.evidence.supporting_documents.len(), 1);
        assert!(result.artifact_id.is_none());
    }

    #[tokio::test]
    async fn test_no_review_is_unverified() {
        let result = stage(Reply::Nothing).check("claim").await;

        assert_eq!(result.textual_rating, RATING_UNVERIFIED);
        assert_eq!(result.verification_score, 0.0);
        assert!(result.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_degrades() {
        let result = stage(Reply::Fail).check("claim").await;

        assert_eq!(result.textual_rating, RATING_ERROR);
        assert!(result.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_news_appends_documents_only() {
        let stage = stage(Reply::Review("False", Some("https://r.example"))).with_news(Arc::new(News));
        let artifact = ContentArtifact::new(Uuid::new_v4(), "T.".to_string(), "Body".to_string());

        let result = stage.check_artifact(&artifact).await;
        assert_eq!(result.textual_rating, "False");
        assert_eq!(result.verification_score, 0.0);
        assert_eq!(result.evidence.supporting_documents.len(), 2);
        assert_eq!(result.artifact_id, Some(artifact.id));
        assert_eq!(result.claim, "Body");
    }
}
