//! Read-only presentation views over published content.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fact_check::Evidence;
use super::processed::PublishedContent;

/// Sentinel category for content matching no keyword
pub const DEFAULT_CATEGORY: &str = "General";

/// Video summaries are cut to this many characters
const SUMMARY_CHARS: usize = 280;

/// Presentation modalities for published content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    #[default]
    Written,
    WrittenImage,
    Video,
}

/// A published record rendered for one modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityView {
    pub published_id: Uuid,
    pub modality: Modality,
    pub title: String,
    pub body: String,
    pub category: String,
    pub fact_check_status: String,
    pub evidence: Evidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ModalityView {
    /// Render a published record
    pub fn render(published: &PublishedContent, modality: Modality) -> Self {
        let (image_url, video_url, summary) = match modality {
            Modality::Written => (None, None, None),
            Modality::WrittenImage => (published.image_url.clone(), None, None),
            Modality::Video => (
                None,
                published.video_url.clone(),
                Some(summarize(&published.body)),
            ),
        };

        Self {
            published_id: published.id,
            modality,
            title: published.title.clone(),
            body: published.body.clone(),
            category: published.category.clone(),
            fact_check_status: published.fact_check_status.clone(),
            evidence: published.evidence.clone(),
            image_url,
            video_url,
            summary,
        }
    }
}

fn summarize(body: &str) -> String {
    if body.chars().count() <= SUMMARY_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(SUMMARY_CHARS).collect();
    format!("{}...", cut.trim_end())
}
