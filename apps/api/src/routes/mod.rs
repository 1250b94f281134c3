pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Gen-AI API
        .route("/gen-ai/analyze-cv", post(handlers::handle_analyze_cv))
        .route(
            "/gen-ai/generate-cover-letter",
            post(handlers::handle_generate_cover_letter),
        )
        // Recommendation API
        .route(
            "/recommendation/store-cv-embedding",
            post(handlers::handle_store_cv_embedding),
        )
        .route(
            "/recommendation/get-job-recommendations",
            get(handlers::handle_get_job_recommendations),
        )
        .route(
            "/recommendation/ingest-jobs",
            post(handlers::handle_ingest_jobs),
        )
        .route("/recommendation/status", get(handlers::handle_status))
        .with_state(state)
}
