//! Generation stage: prompt in, committed artifact out.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::ContentGenerator;
use crate::core::safety::SafetyLimits;
use crate::domain::{ContentArtifact, GenerationRequest, Prompt, PromptStatus};
use crate::error::PipelineError;
use crate::store::ContentStore;

/// Calls the generation capability and records the outcome.
///
/// The prompt row is written as `pending` before the call and always ends
/// in `completed` (with its artifact) or `error`, including when the
/// `generate` future is dropped before it finishes.
pub struct GenerationStage {
    generator: Arc<dyn ContentGenerator>,
    store: Arc<ContentStore>,
    limits: SafetyLimits,
}

impl GenerationStage {
    pub fn new(generator: Arc<dyn ContentGenerator>, store: Arc<ContentStore>, limits: SafetyLimits) -> Self {
        Self {
            generator,
            store,
            limits,
        }
    }

    #[instrument(skip(self, request), fields(generator = self.generator.name()))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<ContentArtifact, PipelineError> {
        // Rejected requests never reach the prompts table
        self.limits.validate_request(request)?;

        let prompt = Prompt::pending(request);
        self.store.create_prompt(&prompt)?;
        let mut pending = PendingPrompt::new(&self.store, prompt.id);

        let generated = self
            .generator
            .generate(
                &prompt.prompt_text,
                prompt.temperature,
                prompt.token_limit,
                self.limits.stage_timeout(),
            )
            .await;

        let text = match generated {
            Ok(text) => text,
            Err(e) => {
                error!(prompt_id = %prompt.id, "Generation failed: {:#}", e);
                return Err(PipelineError::GenerationFailure(format!("{:#}", e)));
            }
        };

        let artifact = ContentArtifact::new(prompt.id, text.title, text.body);
        if let Err(e) = self.store.commit_generation(&artifact) {
            error!(prompt_id = %prompt.id, "Failed to store artifact: {}", e);
            return Err(e);
        }
        pending.disarm();

        info!(prompt_id = %prompt.id, artifact_id = %artifact.id, "Artifact created");
        Ok(artifact)
    }
}

/// Marks the prompt `error` when dropped while still armed.
///
/// Covers early returns and a `generate` future dropped mid-call.
struct PendingPrompt<'a> {
    store: &'a ContentStore,
    prompt_id: Uuid,
    armed: bool,
}

impl<'a> PendingPrompt<'a> {
    fn new(store: &'a ContentStore, prompt_id: Uuid) -> Self {
        Self {
            store,
            prompt_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingPrompt<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(prompt_id = %self.prompt_id, "Generation did not complete; marking prompt as error");
        if let Err(e) = self.store.mark_prompt(self.prompt_id, PromptStatus::Error) {
            error!(prompt_id = %self.prompt_id, "Failed to mark prompt as error: {}", e);
        }
    }
}
