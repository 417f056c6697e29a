//! Core pipeline logic.
//!
//! This module contains:
//! - Stages: generation, fact-check, categorization, gatekeeping, publication
//! - Journal: Append-only per-artifact event logging
//! - Safety: Input limits and timeouts
//! - Orchestrator: Sequences the stages for each artifact

pub mod categorize;
pub mod fact_check;
pub mod gatekeeping;
pub mod generation;
pub mod journal;
pub mod orchestrator;
pub mod publication;
pub mod safety;

// Re-export commonly used types
pub use categorize::{categorize, tag, Categorization, CategorizationStage, KeywordTable};
pub use fact_check::{rating_score, FactCheckStage};
pub use gatekeeping::{decide, GatekeepingPolicy, RatingPolicy};
pub use generation::GenerationStage;
pub use journal::{generate_idempotency_key, hash_input, ArtifactJournal};
pub use orchestrator::{
    ArtifactStatus, PipelineOrchestrator, PipelineReport, PipelineSettings, ProcessingSummary,
};
pub use publication::PublicationStage;
pub use safety::{SafetyLimits, SafetyViolation};
