//! Processed and published content records.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::artifact::ContentArtifact;
use super::fact_check::Evidence;
use super::modality::DEFAULT_CATEGORY;

/// Gatekeeping outcome for a processed artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Published,
    Withheld,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Withheld => "withheld",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "withheld" => Ok(Self::Withheld),
            other => Err(format!("unknown publish status: {}", other)),
        }
    }
}

/// An artifact after categorization and gatekeeping.
///
/// `fact_check_status`, `composite_score` and `evidence` are copied by value
/// from the fact-check result named by `fact_check_id`, or hold the
/// unverified defaults when no result existed at processing time.
/// `publish_status` is derived from `fact_check_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedContent {
    pub id: Uuid,
    pub artifact_id: Uuid,
    pub fact_check_id: Option<Uuid>,
    pub categories: BTreeSet<String>,
    pub tags: Vec<String>,
    pub fact_check_status: String,
    pub composite_score: f64,
    pub evidence: Evidence,
    pub publish_status: PublishStatus,
    pub processed_at: DateTime<Utc>,
}

/// A publish-ready record.
///
/// Title, body, tags, status and the primary category are copied at creation. Evidence follows the
/// processed record unless an operator set `manually_overridden`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedContent {
    pub id: Uuid,
    pub processed_id: Uuid,
    pub title: String,
    pub body: String,
    pub fact_check_status: String,
    pub evidence: Evidence,
    /// First category of the processed record
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub manually_overridden: bool,
}

impl PublishedContent {
    /// Build the record for a processed artifact
    pub fn from_processed(processed: &ProcessedContent, artifact: &ContentArtifact) -> Self {
        Self {
            id: Uuid::new_v4(),
            processed_id: processed.id,
            title: artifact.title.clone(),
            body: artifact.body.clone(),
            fact_check_status: processed.fact_check_status.clone(),
            evidence: processed.evidence.clone(),
            category: processed
                .categories
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: processed.tags.clone(),
            image_url: None,
            video_url: None,
            published_at: Utc::now(),
            manually_overridden: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_status_round_trip() {
        for status in [PublishStatus::Published, PublishStatus::Withheld] {
            assert_eq!(status.as_str().parse::<PublishStatus>(), Ok(status));
        }
        assert!("pending".parse::<PublishStatus>().is_err());
    }

    #[test]
    fn test_published_copies_processed_fields() {
        let artifact = ContentArtifact::new(
            Uuid::new_v4(),
            "Heat wave.".to_string(),
            "Temperatures climb across Europe.".to_string(),
        );
        let processed = ProcessedContent {
            id: Uuid::new_v4(),
            artifact_id: artifact.id,
            fact_check_id: None,
            categories: BTreeSet::from(["Politics".to_string(), "Environment".to_string()]),
            tags: vec!["Europe".to_string()],
            fact_check_status: "Unverified".to_string(),
            composite_score: 0.0,
            evidence: Evidence {
                url: "https://example.org/check".to_string(),
                ..Default::default()
            },
            publish_status: PublishStatus::Published,
            processed_at: Utc::now(),
        };

        let published = PublishedContent::from_processed(&processed, &artifact);

        assert_eq!(published.processed_id, processed.id);
        assert_eq!(published.title, "Heat wave.");
        assert_eq!(published.evidence, processed.evidence);
        assert_eq!(published.category, "Environment");
        assert_eq!(published.tags, vec!["Europe".to_string()]);
        assert!(!published.manually_overridden);
    }
}
