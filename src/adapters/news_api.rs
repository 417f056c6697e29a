//! NewsAPI adapter for related coverage.
//!
//! Endpoint: GET /v2/everything?q=...&sortBy=relevancy&pageSize=5
//! Auth: Bearer token

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use super::{NewsCorroboration, NewsSource};

pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_PAGE_SIZE: u32 = 5;

pub struct NewsApiAdapter {
    endpoint: String,
    api_key: String,
    page_size: u32,
    client: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    url: Option<String>,
}

impl EverythingResponse {
    fn into_corroboration(self) -> NewsCorroboration {
        let urls = self
            .articles
            .into_iter()
            .filter_map(|a| a.url)
            .filter(|u| !u.is_empty())
            .collect();
        NewsCorroboration::from_urls(urls)
    }
}

impl NewsApiAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
            client: reqwest::Client::new(),
        }
    }

    /// Create from the NEWS_API_KEY environment variable
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("NEWS_API_KEY").context("NEWS_API_KEY environment variable required")?;
        Ok(Self::new(api_key))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    async fn query(&self, claim: &str) -> Result<EverythingResponse> {
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[
                ("q", claim),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach news endpoint")?
            .error_for_status()
            .context("News endpoint returned an error status")?;

        response.json().await.context("Failed to parse news response")
    }
}

#[async_trait]
impl NewsSource for NewsApiAdapter {
    fn name(&self) -> &str {
        "news_api"
    }

    async fn search(&self, claim: &str, step_timeout: Duration) -> Result<NewsCorroboration> {
        let response = timeout(step_timeout, self.query(claim))
            .await
            .with_context(|| format!("News query timed out after {:?}", step_timeout))??;

        Ok(response.into_corroboration())
    }
}
