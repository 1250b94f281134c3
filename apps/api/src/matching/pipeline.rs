use std::sync::Arc;

use chrono::{Local, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::embedding::{Embedder, EmbeddingTask};
use crate::errors::AppError;
use crate::llm_client::{strip_code_fences, TextGenerator};
use crate::matching::analysis::parse_analysis;
use crate::matching::job_text;
use crate::matching::models::{
    AnalysisOutcome, CoverLetterOptions, CvProfile, JobPosting, MatchResult, StoreStatus,
};
use crate::matching::prompts;
use crate::render::{DocumentRenderer, LetterDocument};
use crate::vector_store::VectorStore;

const COVER_LETTER_TITLE: &str = "Cover Letter";

/// Orchestrates the embedding, vector-store, generative and rendering clients.
///
/// Every operation runs within one request and makes its provider calls
/// sequentially. Nothing is retried or cached.
#[derive(Clone)]
pub struct MatchingPipeline {
    embedder: Arc<dyn Embedder>,
    cv_store: Arc<dyn VectorStore>,
    job_store: Arc<dyn VectorStore>,
    generator: Arc<dyn TextGenerator>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl MatchingPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        cv_store: Arc<dyn VectorStore>,
        job_store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            embedder,
            cv_store,
            job_store,
            generator,
            renderer,
        }
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    /// Embeds the CV and replaces the user's stored vector.
    pub async fn store_cv_embedding(
        &self,
        user_id: &str,
        cv_text: &str,
    ) -> Result<CvProfile, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::Validation("userId cannot be empty".to_string()));
        }
        if cv_text.trim().is_empty() {
            return Err(AppError::Validation("cvText cannot be empty".to_string()));
        }

        let embedding = self
            .embedder
            .embed(cv_text, EmbeddingTask::RetrievalQuery)
            .await?;
        let profile = CvProfile {
            user_id: user_id.to_string(),
            text: cv_text.trim().to_string(),
            embedding,
        };
        self.cv_store
            .upsert(profile.to_record(&Utc::now().to_rfc3339()))
            .await?;

        info!(
            "Stored CV embedding for user {} ({} dims, {}) in '{}'",
            user_id,
            profile.embedding.len(),
            self.embedder.model_name(),
            self.cv_store.name()
        );
        Ok(profile)
    }

    /// The `top_k` nearest jobs to the user's stored CV, in the store's order.
    pub async fn recommend_jobs(
        &self,
        user_id: &str,
        top_k: i64,
    ) -> Result<Vec<MatchResult>, AppError> {
        if top_k <= 0 {
            return Err(AppError::Validation(format!(
                "topK must be a positive integer, got {top_k}"
            )));
        }
        let top_k = usize::try_from(top_k)
            .map_err(|_| AppError::Validation(format!("topK {top_k} is too large")))?;
        let user_id = user_id.trim();

        let cv = self
            .cv_store
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No CV embedding stored for user {user_id}")))?;

        let points = self.job_store.query(&cv.vector, top_k).await?;
        let results: Vec<MatchResult> = points
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, point)| MatchResult {
                cv_id: user_id.to_string(),
                title: point
                    .metadata
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                job_id: point.id,
                score: point.score,
                rank: i + 1,
            })
            .collect();

        info!(
            "Recommended {} jobs for user {} (top_k {})",
            results.len(),
            user_id,
            top_k
        );
        Ok(results)
    }

    /// Asks the model for a gap analysis of one CV against one job description.
    pub async fn analyze_cv_against_job(
        &self,
        cv_text: &str,
        job_description: &str,
        cv_id: Option<String>,
        job_id: Option<String>,
    ) -> Result<AnalysisOutcome, AppError> {
        require_text("cvText", cv_text)?;
        require_text("jobDescription", job_description)?;

        let raw = self
            .generator
            .generate(
                &prompts::analysis_prompt(cv_text.trim(), job_description.trim()),
                &prompts::analysis_system(),
            )
            .await?;

        let outcome = parse_analysis(&raw, cv_id, job_id);
        match &outcome {
            AnalysisOutcome::Parsed(report) => info!(
                "CV analysis parsed: score {}, {} matched, {} gaps",
                report.relevance_score,
                report.matched_skills.len(),
                report.gap_skills.len()
            ),
            AnalysisOutcome::Unparsed { reason, .. } => {
                warn!("CV analysis output did not match schema: {}", reason)
            }
        }
        Ok(outcome)
    }

    /// Generates a cover letter and renders it to PDF bytes.
    pub async fn generate_cover_letter(
        &self,
        cv_text: &str,
        job_description: &str,
        options: &CoverLetterOptions,
    ) -> Result<Vec<u8>, AppError> {
        require_text("cvText", cv_text)?;
        require_text("jobDescription", job_description)?;

        let current_date = options
            .current_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Local::now().format("%d %B %Y").to_string());

        let letter = self
            .generator
            .generate(
                &prompts::cover_letter_prompt(
                    cv_text.trim(),
                    job_description.trim(),
                    &current_date,
                    options.specific_request.as_deref(),
                ),
                &prompts::cover_letter_system(),
            )
            .await?;

        let document = LetterDocument::from_text(COVER_LETTER_TITLE, strip_code_fences(&letter));
        let renderer = Arc::clone(&self.renderer);
        let pdf = tokio::task::spawn_blocking(move || renderer.render(&document))
            .await
            .map_err(anyhow::Error::from)??;

        info!("Rendered cover letter ({} bytes)", pdf.len());
        Ok(pdf)
    }

    /// Embeds and upserts job postings into the job collection. All postings are
    /// validated before the first provider call.
    pub async fn ingest_jobs(&self, postings: &[JobPosting]) -> Result<usize, AppError> {
        if postings.is_empty() {
            return Err(AppError::Validation("jobs cannot be empty".to_string()));
        }
        for posting in postings {
            job_text::validate(posting)?;
        }

        for posting in postings {
            let text = job_text::embedding_text(posting);
            let vector = self
                .embedder
                .embed(&text, EmbeddingTask::RetrievalDocument)
                .await?;
            self.job_store
                .upsert(job_text::to_record(posting, text, vector))
                .await?;
        }

        info!(
            "Ingested {} job postings into '{}'",
            postings.len(),
            self.job_store.name()
        );
        Ok(postings.len())
    }

    pub async fn status(&self) -> Result<StoreStatus, AppError> {
        self.cv_store.heartbeat().await?;
        self.job_store.heartbeat().await?;
        Ok(StoreStatus {
            cv_count: self.cv_store.count().await?,
            job_count: self.job_store.count().await?,
        })
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PdfRenderer;
    use crate::test_support::{
        fixture, job_corpus, FailingRenderer, HashingEmbedder, ScriptedGenerator, UnavailableStore,
    };
    use crate::vector_store::MemoryStore;
    use std::collections::HashSet;

    const ANALYSIS_JSON: &str = r#"{"relevance_score": 81, "matched_skills": ["Go"],
        "gap_skills": ["Kubernetes"], "suggestions": ["Add the gRPC project"]}"#;

    const LETTER: &str = "14 October 2026\n\nDear Hiring Manager,\n\n\
        I build distributed systems in Go.\n\nSincerely,\nAlex";

    async fn seeded(generator: ScriptedGenerator) -> crate::test_support::Fixture {
        let fx = fixture(generator);
        fx.pipeline.ingest_jobs(&job_corpus()).await.unwrap();
        fx
    }

    #[tokio::test]
    async fn test_store_then_recommend_end_to_end() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        fx.pipeline
            .store_cv_embedding("u1", "Senior backend engineer, Go, distributed systems")
            .await
            .unwrap();

        let results = fx.pipeline.recommend_jobs("u1", 3).await.unwrap();

        let corpus: HashSet<String> = job_corpus().into_iter().map(|j| j.job_id).collect();
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(results.iter().all(|r| corpus.contains(&r.job_id)));
        assert_eq!(results[0].job_id, "job-backend-go");
        assert_eq!(results[0].title.as_deref(), Some("Senior Backend Engineer"));
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_recommend_returns_at_most_top_k() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        fx.pipeline.store_cv_embedding("u1", "Python").await.unwrap();

        assert_eq!(fx.pipeline.recommend_jobs("u1", 1).await.unwrap().len(), 1);
        assert_eq!(fx.pipeline.recommend_jobs("u1", 50).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_restoring_cv_reflects_only_latest_text() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        fx.pipeline
            .store_cv_embedding("u1", "Go backend engineer for distributed systems")
            .await
            .unwrap();
        fx.pipeline
            .store_cv_embedding(
                "u1",
                "Data scientist training machine learning models with Python and statistics",
            )
            .await
            .unwrap();

        let results = fx.pipeline.recommend_jobs("u1", 5).await.unwrap();
        assert_eq!(results[0].job_id, "job-data-scientist");
        assert_eq!(fx.cv_store.count().await.unwrap(), 1);

        let ids: HashSet<_> = results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids.len(), results.len());
    }

    #[tokio::test]
    async fn test_recommend_without_stored_cv_is_not_found() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        let err = fx.pipeline.recommend_jobs("ghost", 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_positive_top_k_is_validation_error() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        fx.pipeline.store_cv_embedding("u1", "Go").await.unwrap();
        for top_k in [0, -3] {
            let err = fx.pipeline.recommend_jobs("u1", top_k).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_store_rejects_empty_text_before_embedding() {
        let fx = fixture(ScriptedGenerator::replying(""));
        let err = fx.pipeline.store_cv_embedding("u1", "  \n").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fx.embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_text() {
        let fx = fixture(ScriptedGenerator::replying(""));
        let text = "a".repeat(crate::embedding::MAX_INPUT_CHARS + 1);
        let err = fx.pipeline.store_cv_embedding("u1", &text).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fx.cv_store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_error() {
        let pipeline = MatchingPipeline::new(
            Arc::new(HashingEmbedder::new()),
            Arc::new(UnavailableStore),
            Arc::new(MemoryStore::new("jobs")),
            Arc::new(ScriptedGenerator::replying("")),
            Arc::new(PdfRenderer::new()),
        );
        let err = pipeline.store_cv_embedding("u1", "Go").await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(matches!(pipeline.status().await, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_analysis_with_empty_job_description_skips_provider() {
        let fx = fixture(ScriptedGenerator::replying(ANALYSIS_JSON));
        let err = fx
            .pipeline
            .analyze_cv_against_job("Go developer", "   ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fx.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analysis_parses_report_and_sends_both_texts() {
        let fx = fixture(ScriptedGenerator::replying(ANALYSIS_JSON));
        let outcome = fx
            .pipeline
            .analyze_cv_against_job("Go developer", "Backend role", Some("u1".into()), None)
            .await
            .unwrap();

        let AnalysisOutcome::Parsed(report) = outcome else {
            panic!("expected parsed report");
        };
        assert_eq!(report.relevance_score, 81);
        assert_eq!(report.cv_id.as_deref(), Some("u1"));

        let prompts = fx.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Go developer"));
        assert!(prompts[0].contains("Backend role"));
    }

    #[tokio::test]
    async fn test_analysis_falls_back_to_raw_text() {
        let fx = fixture(ScriptedGenerator::replying("Looks like a good fit."));
        let outcome = fx
            .pipeline
            .analyze_cv_against_job("Go developer", "Backend role", None, None)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AnalysisOutcome::Unparsed { ref raw_text, .. } if raw_text == "Looks like a good fit."
        ));
    }

    #[tokio::test]
    async fn test_analysis_provider_failure_is_generation_error() {
        let fx = fixture(ScriptedGenerator::failing("quota exceeded"));
        let err = fx
            .pipeline
            .analyze_cv_against_job("Go developer", "Backend role", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(ref m) if m.contains("quota exceeded")));
    }

    #[tokio::test]
    async fn test_cover_letter_renders_pdf_with_given_date() {
        let fx = fixture(ScriptedGenerator::replying(LETTER));
        let options = CoverLetterOptions {
            current_date: Some("14 October 2026".into()),
            specific_request: Some("Mention remote work".into()),
        };
        let pdf = fx
            .pipeline
            .generate_cover_letter("Go developer", "Backend role", &options)
            .await
            .unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        let prompts = fx.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("14 October 2026"));
        assert!(prompts[0].contains("Mention remote work"));
    }

    #[tokio::test]
    async fn test_cover_letter_render_failure_is_render_error() {
        let pipeline = MatchingPipeline::new(
            Arc::new(HashingEmbedder::new()),
            Arc::new(MemoryStore::new("cvs")),
            Arc::new(MemoryStore::new("jobs")),
            Arc::new(ScriptedGenerator::replying(LETTER)),
            Arc::new(FailingRenderer),
        );
        let err = pipeline
            .generate_cover_letter("Go developer", "Backend role", &CoverLetterOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }

    #[tokio::test]
    async fn test_ingest_validates_every_posting_first() {
        let fx = fixture(ScriptedGenerator::replying(""));
        let mut jobs = job_corpus();
        jobs[3].description = String::new();

        let err = fx.pipeline.ingest_jobs(&jobs).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(fx.job_store.count().await.unwrap(), 0);
        assert!(matches!(
            fx.pipeline.ingest_jobs(&[]).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_status_counts_both_collections() {
        let fx = seeded(ScriptedGenerator::replying("")).await;
        fx.pipeline.store_cv_embedding("u1", "Go").await.unwrap();
        let status = fx.pipeline.status().await.unwrap();
        assert_eq!(status, StoreStatus { cv_count: 1, job_count: 5 });
    }
}
