//! Articles produced by the generation stage.
//!
//! An artifact is created once per successful generation and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated article owned by its prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentArtifact {
    /// Unique identifier (also the public "news article" id)
    pub id: Uuid,

    /// The prompt this article was generated from
    pub prompt_id: Uuid,

    /// Headline
    pub title: String,

    /// Article text; also the claim submitted for fact-checking
    pub body: String,

    /// When the artifact was created
    pub created_at: DateTime<Utc>,
}

impl ContentArtifact {
    /// Create a new artifact for a prompt
    pub fn new(prompt_id: Uuid, title: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_id,
            title,
            body,
            created_at: Utc::now(),
        }
    }

    /// The claim text handed to fact-check sources
    pub fn claim(&self) -> &str {
        &self.body
    }

    /// Size of the body in bytes (for limit checks)
    pub fn body_bytes(&self) -> u64 {
        self.body.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_creation() {
        let prompt_id = Uuid::new_v4();
        let artifact = ContentArtifact::new(
            prompt_id,
            "Rates hold steady.".to_string(),
            "The central bank kept rates unchanged.".to_string(),
        );

        assert_eq!(artifact.prompt_id, prompt_id);
        assert_eq!(artifact.claim(), "The central bank kept rates unchanged.");
        assert_eq!(artifact.body_bytes(), 38);
    }
}
