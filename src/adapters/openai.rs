//! OpenAI-compatible chat completion adapter.
//!
//! Endpoint: POST /v1/chat/completions
//! Auth: Bearer token

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use super::{ContentGenerator, GeneratedText};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful news generator.";

/// Chat completion client
pub struct OpenAiAdapter {
    endpoint: String,
    api_key: String,
    model: String,
    system_prompt: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from the OPENAI_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable required")?;
        Ok(Self::new(api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    async fn complete(&self, prompt_text: &str, temperature: f64, token_limit: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt_text,
                },
            ],
            temperature,
            max_tokens: token_limit,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach generation endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Generation endpoint error ({}): {}", status, text.trim());
        }

        let body: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .context("Chat completion returned no content")
    }
}

#[async_trait]
impl ContentGenerator for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt_text: &str,
        temperature: f64,
        token_limit: u32,
        step_timeout: Duration,
    ) -> Result<GeneratedText> {
        let content = timeout(step_timeout, self.complete(prompt_text, temperature, token_limit))
            .await
            .with_context(|| format!("Generation timed out after {:?}", step_timeout))??;

        Ok(GeneratedText::from_completion(&content))
    }
}
