//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the capabilities the pipeline
//! treats as opaque: the LLM that writes articles, the fact-check source
//! that rates claims, and an optional news search used for corroboration.

pub mod google_fact_check;
pub mod news_api;
pub mod openai;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use google_fact_check::GoogleFactCheckAdapter;
pub use news_api::NewsApiAdapter;
pub use openai::OpenAiAdapter;

/// Article text returned by a generation capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub title: String,
    pub body: String,
}

impl GeneratedText {
    /// Split raw model output into a headline and body.
    ///
    /// The first sentence (through its period) is the title, the rest is
    /// the body. Output without a sentence break becomes a title with an
    /// empty body.
    pub fn from_completion(content: &str) -> Self {
        let content = content.trim();
        match content.split_once(". ") {
            Some((first, rest)) => Self {
                title: format!("{}.", first),
                body: rest.trim().to_string(),
            },
            None => Self {
                title: content.to_string(),
                body: String::new(),
            },
        }
    }
}

/// The first review a fact-check source holds for a claim
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimReview {
    pub textual_rating: String,
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub title: Option<String>,
}

/// Related coverage found by a news search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsCorroboration {
    pub evidence_urls: Vec<String>,
    /// Share of the three corroboration slots that were filled (0.0-1.0)
    pub source_score: f64,
}

impl NewsCorroboration {
    /// Number of articles kept as evidence
    pub const MAX_URLS: usize = 3;

    pub fn from_urls(urls: Vec<String>) -> Self {
        let evidence_urls: Vec<String> = urls.into_iter().take(Self::MAX_URLS).collect();
        let source_score = evidence_urls.len() as f64 / Self::MAX_URLS as f64;
        Self {
            evidence_urls,
            source_score,
        }
    }
}

/// Capability that writes an article from a prompt
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt_text: &str,
        temperature: f64,
        token_limit: u32,
        timeout: Duration,
    ) -> Result<GeneratedText>;
}

/// Capability that looks up published reviews of a claim
#[async_trait]
pub trait FactCheckSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the source has no review for the claim
    async fn search(&self, claim: &str, timeout: Duration) -> Result<Option<ClaimReview>>;
}

/// Optional secondary source of related news coverage
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, claim: &str, timeout: Duration) -> Result<NewsCorroboration>;
}
