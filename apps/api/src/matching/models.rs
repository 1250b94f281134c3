use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::Embedding;
use crate::vector_store::{Metadata, VectorRecord};

/// A user's CV and the embedding derived from its latest text.
#[derive(Debug, Clone, PartialEq)]
pub struct CvProfile {
    pub user_id: String,
    pub text: String,
    pub embedding: Embedding,
}

impl CvProfile {
    /// The record stored in the CV collection. One record per user; re-storing replaces it.
    pub fn to_record(&self, updated_at: &str) -> VectorRecord {
        let mut metadata = Metadata::new();
        metadata.insert("updated_at".to_string(), Value::from(updated_at));
        metadata.insert("chars".to_string(), Value::from(self.text.chars().count()));
        VectorRecord {
            id: self.user_id.clone(),
            vector: self.embedding.clone(),
            document: Some(self.text.clone()),
            metadata,
        }
    }
}

/// A job posting as submitted for ingestion into the job collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub job_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// One ranked recommendation. Computed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub cv_id: String,
    pub job_id: String,
    pub score: f32,
    /// 1-based position in the store's ordering.
    pub rank: usize,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub cv_id: Option<String>,
    pub job_id: Option<String>,
    /// 0..=100
    pub relevance_score: u8,
    pub matched_skills: Vec<String>,
    pub gap_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub explanation: Option<String>,
    pub skill_scores: BTreeMap<String, u8>,
}

/// Result of mapping model output onto `AnalysisReport`.
///
/// `Unparsed` keeps the raw model text so callers can still show something
/// when the model ignored the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Parsed(AnalysisReport),
    Unparsed { raw_text: String, reason: String },
}

/// Optional inputs threaded into the cover-letter prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverLetterOptions {
    /// Date printed on the letter. Today when absent.
    pub current_date: Option<String>,
    pub specific_request: Option<String>,
}

/// Entry counts for both collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub cv_count: usize,
    pub job_count: usize,
}
