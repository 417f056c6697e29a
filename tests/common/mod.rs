//! Shared test doubles and harness for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use newsgate::adapters::{ClaimReview, ContentGenerator, FactCheckSource, GeneratedText};
use newsgate::core::{PipelineOrchestrator, PipelineSettings};
use newsgate::domain::{ContentArtifact, GenerationRequest, Prompt};
use newsgate::store::ContentStore;
use tempfile::TempDir;

/// Returns the same completion for every prompt, or fails
pub struct FixedGenerator {
    completion: Option<String>,
}

impl FixedGenerator {
    pub fn new(completion: &str) -> Self {
        Self {
            completion: Some(completion.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { completion: None }
    }
}

#[async_trait]
impl ContentGenerator for FixedGenerator {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _: &str, _: f64, _: u32, _: Duration) -> anyhow::Result<GeneratedText> {
        match &self.completion {
            Some(text) => Ok(GeneratedText::from_completion(text)),
            None => anyhow::bail!("upstream quota exceeded"),
        }
    }
}

/// Replies with queued ratings; the last one repeats. `None` means no review.
pub struct ScriptedFactSource {
    ratings: Mutex<VecDeque<Option<String>>>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl ScriptedFactSource {
    pub fn rating(rating: &str) -> Self {
        Self::sequence(&[Some(rating)])
    }

    pub fn no_review() -> Self {
        Self::sequence(&[None])
    }

    pub fn sequence(ratings: &[Option<&str>]) -> Self {
        Self {
            ratings: Mutex::new(ratings.iter().map(|r| r.map(str::to_string)).collect()),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            ratings: Mutex::new(VecDeque::new()),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FactCheckSource for ScriptedFactSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, claim: &str, _: Duration) -> anyhow::Result<Option<ClaimReview>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("connection reset");
        }

        let rating = {
            let mut ratings = self.ratings.lock().unwrap();
            if ratings.len() > 1 {
                ratings.pop_front().flatten()
            } else {
                ratings.front().cloned().flatten()
            }
        };

        Ok(rating.map(|textual_rating| ClaimReview {
            textual_rating,
            url: Some("https://factcheck.example/review".to_string()),
            publisher: Some("Health Feedback".to_string()),
            title: Some(format!("Review of: {}", claim)),
        }))
    }
}

/// Orchestrator over an in-memory store and a temporary journal
pub struct Harness {
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub store: Arc<ContentStore>,
    pub fact_source: Arc<ScriptedFactSource>,
    pub journal: TempDir,
}

impl Harness {
    pub fn new(generator: FixedGenerator, fact_source: ScriptedFactSource) -> Self {
        Self::with_settings(generator, fact_source, |_| {})
    }

    pub fn with_settings<F>(generator: FixedGenerator, fact_source: ScriptedFactSource, adjust: F) -> Self
    where
        F: FnOnce(&mut PipelineSettings),
    {
        let journal = TempDir::new().unwrap();
        let store = Arc::new(ContentStore::open_in_memory().unwrap());
        let fact_source = Arc::new(fact_source);

        let mut settings = PipelineSettings::new(journal.path());
        adjust(&mut settings);

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            store.clone(),
            Arc::new(generator),
            fact_source.clone(),
            settings,
        ));

        Self {
            orchestrator,
            store,
            fact_source,
            journal,
        }
    }

    /// Store an artifact without running the pipeline on it
    pub fn seed_artifact(&self, title: &str, body: &str) -> ContentArtifact {
        let prompt = Prompt::pending(&GenerationRequest::new("seeded"));
        self.store.create_prompt(&prompt).unwrap();
        let artifact = ContentArtifact::new(prompt.id, title.to_string(), body.to_string());
        self.store.commit_generation(&artifact).unwrap();
        artifact
    }
}
