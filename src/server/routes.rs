//! Request handlers.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/generate` | POST | Generate an article and run the pipeline |
//! | `/generate` | GET | List generated articles, newest first |
//! | `/fact-check` | POST | Fact-check a free-standing claim |
//! | `/process/:content_id` | POST | Process an article (once) |
//! | `/published/:id` | GET | Published record in a modality view |
//! | `/published/:id/evidence` | GET, PUT | Inspect or override evidence |
//! | `/news/:id/evidence` | GET | Evidence for an article |
//! | `/categories/:processed_id` | GET | Categories of a processed article |
//! | `/artifacts/:id/status` | GET | Replayed pipeline state |

use std::collections::BTreeSet;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{ArtifactStatus, PipelineReport, ProcessingSummary};
use crate::domain::{ContentArtifact, Evidence, FactCheckResult, GenerationRequest, Modality, ModalityView};
use crate::error::PipelineError;
use crate::store::StoreStats;

use super::error::ApiError;
use super::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    pub claim: String,
}

#[derive(Debug, Deserialize)]
pub struct ModalityQuery {
    #[serde(default)]
    pub modality: Modality,
}

#[derive(Debug, Deserialize)]
pub struct EvidenceUpdate {
    pub evidence: Option<Evidence>,
}

#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub published_content_id: Uuid,
    pub evidence: Evidence,
    pub manually_overridden: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub processed_content_id: Uuid,
    pub categories: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stats: StoreStats,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.orchestrator.store().stats()?;
    Ok(Json(HealthResponse { status: "ok", stats }))
}

/// POST /generate
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PipelineReport>), ApiError> {
    let Json(request) = payload?;

    // Detached so a client disconnect cannot cancel generation mid-flight
    let orchestrator = state.orchestrator.clone();
    let report = tokio::spawn(async move { orchestrator.submit_prompt(&request).await })
        .await
        .map_err(|e| PipelineError::Server(format!("Generation task failed: {}", e)))??;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /generate
pub async fn list_generated(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContentArtifact>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.orchestrator.recent_artifacts(limit)?))
}

/// POST /fact-check
pub async fn fact_check(
    State(state): State<AppState>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<Json<FactCheckResult>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.orchestrator.manual_fact_check(&request.claim).await?))
}

/// POST /process/:content_id
pub async fn process(
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ProcessingSummary>), ApiError> {
    let summary = state.orchestrator.process_content(content_id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /published/:id
pub async fn published(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ModalityQuery>,
) -> Result<Json<ModalityView>, ApiError> {
    Ok(Json(state.orchestrator.published_view(id, query.modality)?))
}

/// GET /published/:id/evidence
pub async fn get_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvidenceResponse>, ApiError> {
    let published = state.orchestrator.published(id)?;
    Ok(Json(EvidenceResponse {
        published_content_id: published.id,
        evidence: published.evidence,
        manually_overridden: published.manually_overridden,
    }))
}

/// PUT /published/:id/evidence
pub async fn put_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<EvidenceUpdate>, JsonRejection>,
) -> Result<Json<EvidenceResponse>, ApiError> {
    let Json(update) = payload?;
    let evidence = update
        .evidence
        .ok_or_else(|| ApiError::bad_request("Evidence data is required"))?;

    let published = state.orchestrator.override_evidence(id, &evidence)?;
    Ok(Json(EvidenceResponse {
        published_content_id: published.id,
        evidence: published.evidence,
        manually_overridden: published.manually_overridden,
    }))
}

/// GET /news/:id/evidence
pub async fn article_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Evidence>, ApiError> {
    Ok(Json(state.orchestrator.evidence_for_article(id)?))
}

/// GET /categories/:processed_id
pub async fn categories(
    State(state): State<AppState>,
    Path(processed_id): Path<Uuid>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state.orchestrator.categories(processed_id)?;
    Ok(Json(CategoriesResponse {
        processed_content_id: processed_id,
        categories,
    }))
}

/// GET /artifacts/:id/status
pub async fn artifact_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtifactStatus>, ApiError> {
    Ok(Json(state.orchestrator.artifact_status(id).await?))
}
