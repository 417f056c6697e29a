//! Error taxonomy for the content pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::core::safety::SafetyViolation;

/// Errors surfaced by pipeline stages and the store
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The generation capability failed or timed out; the prompt is marked `error`
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// A fact-check source could not be queried. Never returned by the
    /// fact-check stage itself, which degrades to an unverified result.
    #[error("Fact-check source unavailable: {0}")]
    FactCheckUnavailable(String),

    #[error("Content {0} has already been processed")]
    AlreadyProcessed(Uuid),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] SafetyViolation),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Server(String),
}

impl PipelineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Errors caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AlreadyProcessed(_) | Self::NotFound { .. } | Self::Validation(_)
        )
    }
}
