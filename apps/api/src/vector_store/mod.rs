//! Vector storage backends.
//!
//! One `VectorStore` instance wraps one similarity-search collection. The
//! recommendation pipeline holds two: CV embeddings (keyed by user id) and
//! job-posting embeddings (keyed by job id).
//!
//! Ordering contract: `query` returns results sorted by descending score, as
//! ranked by the backend. Callers must not re-rank.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::embedding::Embedding;

mod chroma;
mod memory;

pub use chroma::ChromaCollection;
pub use memory::MemoryStore;

/// Scalar metadata attached to a stored vector.
pub type Metadata = Map<String, Value>;

/// A vector as written to and read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Embedding,
    pub document: Option<String>,
    pub metadata: Metadata,
}

/// A single similarity-search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    /// Similarity score, higher is more similar. Range is backend-defined.
    pub score: f32,
    pub metadata: Metadata,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("vector store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed vector store response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the record with the same id.
    async fn upsert(&self, record: VectorRecord) -> Result<(), StoreError>;

    /// Fetch a record (including its vector) by id.
    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, StoreError>;

    /// Top-k nearest records to `vector`, highest score first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Cheap liveness probe of the backend.
    async fn heartbeat(&self) -> Result<(), StoreError>;

    fn name(&self) -> &str;
}
