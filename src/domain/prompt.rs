//! Prompts submitted by clients for article generation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generation request as received from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Missing text deserializes as empty and is rejected by validation
    #[serde(default)]
    pub prompt_text: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_token_limit")]
    pub token_limit: u32,
}

fn default_temperature() -> f64 {
    0.7
}
fn default_token_limit() -> u32 {
    256
}

impl GenerationRequest {
    /// Create a request with default temperature and token limit
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            temperature: default_temperature(),
            token_limit: default_token_limit(),
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_token_limit(mut self, token_limit: u32) -> Self {
        self.token_limit = token_limit;
        self
    }
}

/// A persisted prompt.
///
/// Text and generation parameters are fixed at creation; only `status`
/// moves, and only once (`pending` to `completed` or `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub prompt_text: String,
    pub temperature: f64,
    pub token_limit: u32,
    pub status: PromptStatus,
    pub created_at: DateTime<Utc>,
}

impl Prompt {
    /// Create a new pending prompt from a request
    pub fn pending(request: &GenerationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_text: request.prompt_text.clone(),
            temperature: request.temperature,
            token_limit: request.token_limit,
            status: PromptStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Generation status of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
    Pending,
    Completed,
    Error,
}

impl PromptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown prompt status: {}", other)),
        }
    }
}
