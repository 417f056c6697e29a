//! Input limits enforced before work reaches a stage.
//!
//! Prevents bad or oversized requests through configurable limits on:
//! - Prompt text size and generation parameters
//! - Article body size handed to categorization
//! - Timeouts on external calls

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::GenerationRequest;

/// Highest temperature accepted by the generation capability
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Input limits for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Maximum prompt size in bytes (default: 16KB)
    #[serde(default = "default_max_prompt_bytes")]
    pub max_prompt_bytes: u64,

    /// Maximum token limit a prompt may request (default: 4096)
    #[serde(default = "default_max_token_limit")]
    pub max_token_limit: u32,

    /// Maximum article body size for categorization (default: 1MB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Timeout for each external call in seconds (default: 30)
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_seconds: u64,
}

fn default_max_prompt_bytes() -> u64 {
    16 * 1024
}
fn default_max_token_limit() -> u32 {
    4096
}
fn default_max_body_bytes() -> u64 {
    1024 * 1024
}
fn default_stage_timeout() -> u64 {
    30
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_prompt_bytes: default_max_prompt_bytes(),
            max_token_limit: default_max_token_limit(),
            max_body_bytes: default_max_body_bytes(),
            stage_timeout_seconds: default_stage_timeout(),
        }
    }
}

impl SafetyLimits {
    /// Timeout applied to generation and fact-check calls
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_seconds)
    }

    /// Validate a generation request before any row is written
    pub fn validate_request(&self, request: &GenerationRequest) -> Result<(), SafetyViolation> {
        if request.prompt_text.trim().is_empty() {
            return Err(SafetyViolation::EmptyPrompt);
        }

        let size = request.prompt_text.len() as u64;
        if size > self.max_prompt_bytes {
            return Err(SafetyViolation::MaxPromptBytes {
                actual: size,
                limit: self.max_prompt_bytes,
            });
        }

        if !(0.0..=MAX_TEMPERATURE).contains(&request.temperature) {
            return Err(SafetyViolation::TemperatureOutOfRange {
                value: request.temperature,
            });
        }

        if request.token_limit == 0 || request.token_limit > self.max_token_limit {
            return Err(SafetyViolation::TokenLimitOutOfRange {
                value: request.token_limit,
                limit: self.max_token_limit,
            });
        }

        Ok(())
    }

    /// Validate an article body before categorization
    pub fn validate_body(&self, body: &str) -> Result<(), SafetyViolation> {
        let size = body.len() as u64;
        if size > self.max_body_bytes {
            return Err(SafetyViolation::MaxBodyBytes {
                actual: size,
                limit: self.max_body_bytes,
            });
        }
        Ok(())
    }

    /// Validate a claim submitted for manual fact-checking
    pub fn validate_claim(&self, claim: &str) -> Result<(), SafetyViolation> {
        if claim.trim().is_empty() {
            return Err(SafetyViolation::EmptyClaim);
        }
        self.validate_body(claim)
    }
}

/// Limit violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SafetyViolation {
    /// Reported as invalid input (HTTP 400) rather than as a generation
    /// failure: the request is refused before any prompt row exists.
    #[error("Prompt text is required")]
    EmptyPrompt,

    #[error("Claim is required")]
    EmptyClaim,

    #[error("Maximum prompt bytes exceeded: {actual} > {limit}")]
    MaxPromptBytes { actual: u64, limit: u64 },

    #[error("Temperature must be between 0.0 and 2.0, got {value}")]
    TemperatureOutOfRange { value: f64 },

    #[error("Token limit must be between 1 and {limit}, got {value}")]
    TokenLimitOutOfRange { value: u32, limit: u32 },

    #[error("Maximum body bytes exceeded: {actual} > {limit}")]
    MaxBodyBytes { actual: u64, limit: u64 },
}
