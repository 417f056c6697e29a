//! REST surface over the pipeline orchestrator.

pub mod error;
pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::PipelineOrchestrator;

pub use error::{ApiError, ErrorResponse};

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/generate", post(routes::generate).get(routes::list_generated))
        .route("/fact-check", post(routes::fact_check))
        .route("/process/:content_id", post(routes::process))
        .route("/published/:id", get(routes::published))
        .route(
            "/published/:id/evidence",
            get(routes::get_evidence).put(routes::put_evidence),
        )
        .route("/news/:id/evidence", get(routes::article_evidence))
        .route("/categories/:processed_id", get(routes::categories))
        .route("/artifacts/:id/status", get(routes::artifact_status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(orchestrator: Arc<PipelineOrchestrator>, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!("Listening on http://{}", bind);
    axum::serve(listener, router(AppState::new(orchestrator)))
        .await
        .context("Server error")
}
