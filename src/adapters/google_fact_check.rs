//! Google Fact Check Tools adapter.
//!
//! Endpoint: GET /v1alpha1/claims:search?query=...&key=...

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use super::{ClaimReview, FactCheckSource};

pub const DEFAULT_ENDPOINT: &str = "https://factchecktools.googleapis.com/v1alpha1/claims:search";

pub struct GoogleFactCheckAdapter {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    claims: Vec<Claim>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claim {
    #[serde(default)]
    claim_review: Vec<Review>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Review {
    #[serde(default)]
    textual_rating: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<Publisher>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    #[serde(default)]
    name: Option<String>,
}

impl SearchResponse {
    /// First review of the first claim, if any
    fn into_first_review(self) -> Option<ClaimReview> {
        let review = self.claims.into_iter().next()?.claim_review.into_iter().next()?;
        Some(ClaimReview {
            textual_rating: review
                .textual_rating
                .unwrap_or_else(|| crate::domain::fact_check::RATING_UNVERIFIED.to_string()),
            url: review.url.filter(|u| !u.is_empty()),
            publisher: review.publisher.and_then(|p| p.name),
            title: review.title,
        })
    }
}

impl GoogleFactCheckAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from the GOOGLE_FACT_CHECK_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_FACT_CHECK_API_KEY")
            .context("GOOGLE_FACT_CHECK_API_KEY environment variable required")?;
        Ok(Self::new(api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn query(&self, claim: &str) -> Result<SearchResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", claim), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach fact-check endpoint")?
            .error_for_status()
            .context("Fact-check endpoint returned an error status")?;

        response
            .json()
            .await
            .context("Failed to parse fact-check response")
    }
}

#[async_trait]
impl FactCheckSource for GoogleFactCheckAdapter {
    fn name(&self) -> &str {
        "google_fact_check"
    }

    async fn search(&self, claim: &str, step_timeout: Duration) -> Result<Option<ClaimReview>> {
        let response = timeout(step_timeout, self.query(claim))
            .await
            .with_context(|| format!("Fact-check query timed out after {:?}", step_timeout))??;

        Ok(response.into_first_review())
    }
}
