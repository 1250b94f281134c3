//! Axum route handlers for the gen-ai and recommendation APIs.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::matching::models::{AnalysisOutcome, CoverLetterOptions, JobPosting, MatchResult};
use crate::state::AppState;

const DEFAULT_TOP_K: i64 = 10;
const DOCUMENT_KEY_HEADER: &str = "x-document-key";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCvRequest {
    pub cv_text: Option<String>,
    pub cv_url: Option<String>,
    pub job_description: String,
    pub user_id: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCvResponse {
    /// `None` when the model output could not be parsed.
    pub relevance_score: Option<u8>,
    pub matched_skills: Vec<String>,
    pub gap_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub explanation: Option<String>,
    pub skill_scores: BTreeMap<String, u8>,
    pub parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub processing_time_seconds: f64,
    pub model: String,
}

impl AnalyzeCvResponse {
    fn from_outcome(
        outcome: AnalysisOutcome,
        cv_id: Option<String>,
        job_id: Option<String>,
        processing_time_seconds: f64,
        model: String,
    ) -> Self {
        match outcome {
            AnalysisOutcome::Parsed(report) => Self {
                relevance_score: Some(report.relevance_score),
                matched_skills: report.matched_skills,
                gap_skills: report.gap_skills,
                suggestions: report.suggestions,
                explanation: report.explanation,
                skill_scores: report.skill_scores,
                parsed: true,
                cv_id: report.cv_id,
                job_id: report.job_id,
                processing_time_seconds,
                model,
            },
            // Legacy fallback: the raw model text is surfaced as the only suggestion.
            AnalysisOutcome::Unparsed { raw_text, .. } => Self {
                relevance_score: None,
                matched_skills: Vec::new(),
                gap_skills: Vec::new(),
                suggestions: vec![raw_text],
                explanation: None,
                skill_scores: BTreeMap::new(),
                parsed: false,
                cv_id,
                job_id,
                processing_time_seconds,
                model,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub cv_text: Option<String>,
    pub cv_url: Option<String>,
    pub job_description: String,
    pub current_date: Option<String>,
    pub specific_request: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCvEmbeddingRequest {
    pub user_id: String,
    pub cv_text: Option<String>,
    pub cv_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub user_id: String,
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub job_id: String,
    pub score: f32,
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<MatchResult> for RecommendationItem {
    fn from(m: MatchResult) -> Self {
        Self {
            job_id: m.job_id,
            score: m.score,
            rank: m.rank,
            title: m.title,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IngestJobsRequest {
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Serialize)]
pub struct IngestJobsResponse {
    pub ingested: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub cv_count: usize,
    pub job_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /gen-ai/analyze-cv
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeCvRequest>, JsonRejection>,
) -> Result<Json<AnalyzeCvResponse>, AppError> {
    let Json(request) = body?;
    let started = Instant::now();

    let cv_text = state
        .cv_loader
        .resolve(request.cv_text, request.cv_url)
        .await?;
    let outcome = state
        .pipeline
        .analyze_cv_against_job(
            &cv_text,
            &request.job_description,
            request.user_id.clone(),
            request.job_id.clone(),
        )
        .await?;

    let elapsed = started.elapsed().as_secs_f64();
    info!("CV analysis completed in {:.2}s", elapsed);

    Ok(Json(AnalyzeCvResponse::from_outcome(
        outcome,
        request.user_id,
        request.job_id,
        (elapsed * 100.0).round() / 100.0,
        state.pipeline.model_name().to_string(),
    )))
}

/// POST /gen-ai/generate-cover-letter
///
/// Responds with the PDF itself. When an archive is configured the stored
/// object key is returned in `x-document-key`.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    body: Result<Json<CoverLetterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body?;

    let cv_text = state
        .cv_loader
        .resolve(request.cv_text, request.cv_url)
        .await?;
    let options = CoverLetterOptions {
        current_date: request.current_date,
        specific_request: request.specific_request,
    };
    let pdf = state
        .pipeline
        .generate_cover_letter(&cv_text, &request.job_description, &options)
        .await?;

    let document_key = match &state.archive {
        Some(archive) => match archive.store_pdf(pdf.clone()).await {
            Ok(key) => {
                info!("Archived cover letter as {}", key);
                Some(key)
            }
            Err(e) => {
                warn!("Cover letter archive failed: {}", e);
                None
            }
        },
        None => None,
    };

    let mut response = (
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cover_letter.pdf\"",
            ),
        ],
        Bytes::from(pdf),
    )
        .into_response();
    if let Some(value) = document_key.and_then(|k| HeaderValue::from_str(&k).ok()) {
        response.headers_mut().insert(DOCUMENT_KEY_HEADER, value);
    }
    Ok(response)
}

/// POST /recommendation/store-cv-embedding
pub async fn handle_store_cv_embedding(
    State(state): State<AppState>,
    body: Result<Json<StoreCvEmbeddingRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(request) = body?;

    let cv_text = state
        .cv_loader
        .resolve(request.cv_text, request.cv_url)
        .await?;
    state
        .pipeline
        .store_cv_embedding(&request.user_id, &cv_text)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /recommendation/get-job-recommendations?userId=..&topK=..
pub async fn handle_get_job_recommendations(
    State(state): State<AppState>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Result<Json<Vec<RecommendationItem>>, AppError> {
    let Query(query) = query?;

    let results = state
        .pipeline
        .recommend_jobs(&query.user_id, query.top_k.unwrap_or(DEFAULT_TOP_K))
        .await?;

    Ok(Json(results.into_iter().map(RecommendationItem::from).collect()))
}

/// POST /recommendation/ingest-jobs
pub async fn handle_ingest_jobs(
    State(state): State<AppState>,
    body: Result<Json<IngestJobsRequest>, JsonRejection>,
) -> Result<Json<IngestJobsResponse>, AppError> {
    let Json(request) = body?;
    let ingested = state.pipeline.ingest_jobs(&request.jobs).await?;
    Ok(Json(IngestJobsResponse { ingested }))
}

/// GET /recommendation/status
pub async fn handle_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.pipeline.status().await?;
    Ok(Json(StatusResponse {
        status: "ok",
        cv_count: status.cv_count,
        job_count: status.job_count,
    }))
}
