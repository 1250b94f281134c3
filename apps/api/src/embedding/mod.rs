//! Text embedding via an external provider.
//!
//! The pipeline depends only on the `Embedder` trait; `GeminiEmbedder` is the
//! production backend.

use async_trait::async_trait;
use thiserror::Error;

mod gemini;

pub use gemini::GeminiEmbedder;

/// A vector embedding: fixed-length float array, dimension set by the model.
pub type Embedding = Vec<f32>;

/// Inputs longer than this are rejected before reaching the provider.
pub const MAX_INPUT_CHARS: usize = 20_000;

/// Which side of a retrieval the text is embedded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// CVs, the query side of a job search.
    RetrievalQuery,
    /// Job postings at ingestion time.
    RetrievalDocument,
}

impl EmbeddingTask {
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            EmbeddingTask::RetrievalQuery => "RETRIEVAL_QUERY",
            EmbeddingTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("text is {chars} characters, limit is {limit}")]
    InputTooLarge { chars: usize, limit: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned an empty vector")]
    EmptyVector,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Embedding, EmbeddingError>;

    fn model_name(&self) -> &str;
}

/// Trims the text and enforces the non-empty / size limits shared by all backends.
pub fn validate_input(text: &str) -> Result<&str, EmbeddingError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }
    let chars = text.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(EmbeddingError::InputTooLarge {
            chars,
            limit: MAX_INPUT_CHARS,
        });
    }
    Ok(text)
}
