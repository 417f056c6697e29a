//! Fact-check verdicts and the structured evidence backing them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating recorded when no source returned a verdict
pub const RATING_UNVERIFIED: &str = "Unverified";

/// Rating recorded when the source could not be queried
pub const RATING_ERROR: &str = "Error";

/// Evidence attached to a verdict.
///
/// Always an object with every field present; an empty verdict is an
/// `Evidence::default()`, never null or a bare string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evidence {
    pub url: String,
    pub source: String,
    pub summary: String,
    pub verification_status: String,
    pub supporting_documents: Vec<SupportingDocument>,
}

impl Evidence {
    /// True if no source contributed anything
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
            && self.source.is_empty()
            && self.summary.is_empty()
            && self.verification_status.is_empty()
            && self.supporting_documents.is_empty()
    }
}

/// A document supporting (or refuting) a claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportingDocument {
    pub url: String,
    pub title: String,
}

/// What a fact-check source reports for a claim, before persistence
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckOutcome {
    pub textual_rating: String,
    pub verification_score: f64,
    pub evidence: Evidence,
}

impl FactCheckOutcome {
    /// Outcome when the source had no review for the claim
    pub fn unverified() -> Self {
        Self {
            textual_rating: RATING_UNVERIFIED.to_string(),
            verification_score: 0.0,
            evidence: Evidence::default(),
        }
    }

    /// Outcome when the source failed (transport, status, or parse error)
    pub fn error() -> Self {
        Self {
            textual_rating: RATING_ERROR.to_string(),
            verification_score: 0.0,
            evidence: Evidence::default(),
        }
    }
}

/// A persisted fact-check result.
///
/// Rows are append-only. `artifact_id` links results produced by the
/// pipeline to the artifact they checked; manual checks leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub id: Uuid,
    pub artifact_id: Option<Uuid>,
    pub claim: String,
    pub textual_rating: String,
    pub verification_score: f64,
    pub evidence: Evidence,
    pub created_at: DateTime<Utc>,
}

impl FactCheckResult {
    pub fn new(claim: impl Into<String>, artifact_id: Option<Uuid>, outcome: FactCheckOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact_id,
            claim: claim.into(),
            textual_rating: outcome.textual_rating,
            verification_score: outcome.verification_score,
            evidence: outcome.evidence,
            created_at: Utc::now(),
        }
    }
}
