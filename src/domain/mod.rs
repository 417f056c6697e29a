//! Domain types for the newsgate pipeline.
//!
//! This module contains the core data structures:
//! - Prompt: Client generation requests
//! - Artifact: Generated article content
//! - FactCheck: Verdicts and structured evidence
//! - Processed: Categorized content and its publication record
//! - Events / Run: Journal entries and the per-artifact state derived from them
//! - Modality: Read-only presentation views of published content

pub mod artifact;
pub mod events;
pub mod fact_check;
pub mod modality;
pub mod processed;
pub mod prompt;
pub mod run;

// Re-export commonly used types
pub use artifact::ContentArtifact;
pub use events::{Event, EventType, Stage, StageStatus};
pub use fact_check::{Evidence, FactCheckOutcome, FactCheckResult, SupportingDocument};
pub use modality::{Modality, ModalityView};
pub use processed::{ProcessedContent, PublishStatus, PublishedContent};
pub use prompt::{GenerationRequest, Prompt, PromptStatus};
pub use run::{ArtifactState, PipelineRun};
