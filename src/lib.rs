//! newsgate - AI news pipeline with fact-check gatekeeping
//!
//! Turns a prompt into a generated article, fact-checks it, categorizes
//! and tags it, then decides whether it is published.
//!
//! # Architecture
//!
//! Each article moves through a fixed set of stages:
//! - Generation commits the prompt and its article in one transaction
//! - Fact-checking and categorization then run concurrently
//! - Processing copies the current verdict and applies the gatekeeping policy
//! - Publication creates at most one published record per processed article
//!
//! Stage transitions are journaled per article so the pipeline state can be
//! replayed at any time.
//!
//! # Modules
//!
//! - `adapters`: External capabilities (chat completion, fact-check, news search)
//! - `core`: Stages, journal, limits and the orchestrator
//! - `domain`: Data structures (Prompt, ContentArtifact, FactCheckResult, ...)
//! - `store`: SQLite persistence
//! - `server`: REST API
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Generate an article and run the pipeline
//! newsgate generate "Write about the climate summit"
//!
//! # Check pipeline status
//! newsgate status <artifact-id>
//!
//! # Serve the REST API
//! newsgate serve --bind 127.0.0.1:8000
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod server;
pub mod store;

// Re-export main types at crate root for convenience
pub use core::{PipelineOrchestrator, PipelineReport, PipelineSettings, ProcessingSummary};
pub use domain::{
    ContentArtifact, Evidence, FactCheckResult, GenerationRequest, ProcessedContent, PublishStatus,
    PublishedContent,
};
pub use error::PipelineError;
pub use store::ContentStore;
