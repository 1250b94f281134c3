//! In-process fakes for the provider traits. Test builds only.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::embedding::{validate_input, Embedder, Embedding, EmbeddingError, EmbeddingTask};
use crate::llm_client::{LlmError, TextGenerator};
use crate::matching::archive::{ArchiveError, DocumentArchive};
use crate::matching::cv_source::CvLoader;
use crate::matching::models::JobPosting;
use crate::matching::MatchingPipeline;
use crate::render::{DocumentRenderer, LetterDocument, PdfRenderer, RenderError};
use crate::state::AppState;
use crate::vector_store::{MemoryStore, ScoredPoint, StoreError, VectorRecord, VectorStore};

const DIMENSIONS: usize = 256;

/// Deterministic bag-of-words embedder: each lowercase token bumps one hashed bucket.
pub struct HashingEmbedder {
    pub calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str, _task: EmbeddingTask) -> Result<Embedding, EmbeddingError> {
        let text = validate_input(text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0_f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1)
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % DIMENSIONS] += 1.0;
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

/// Replies with a fixed result and records every prompt it receives.
pub struct ScriptedGenerator {
    reply: Result<String, String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(LlmError::Api {
                status: 503,
                message: message.clone(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted-test"
    }
}

/// A store whose backend is always down.
pub struct UnavailableStore;

#[async_trait]
impl VectorStore for UnavailableStore {
    async fn upsert(&self, _record: VectorRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<VectorRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<ScoredPoint>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn heartbeat(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

pub struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn render(&self, _document: &LetterDocument) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Pdf("font table missing".to_string()))
    }
}

/// Records archived documents in memory.
#[derive(Default)]
pub struct MemoryArchive {
    pub stored: Mutex<Vec<usize>>,
}

#[async_trait]
impl DocumentArchive for MemoryArchive {
    async fn store_pdf(&self, bytes: Vec<u8>) -> Result<String, ArchiveError> {
        let mut stored = self.stored.lock().unwrap();
        stored.push(bytes.len());
        Ok(format!("generated_cover_letter/test-{}.pdf", stored.len()))
    }
}

pub struct Fixture {
    pub pipeline: MatchingPipeline,
    pub embedder: Arc<HashingEmbedder>,
    pub generator: Arc<ScriptedGenerator>,
    pub cv_store: Arc<MemoryStore>,
    pub job_store: Arc<MemoryStore>,
}

pub fn fixture(generator: ScriptedGenerator) -> Fixture {
    let embedder = Arc::new(HashingEmbedder::new());
    let generator = Arc::new(generator);
    let cv_store = Arc::new(MemoryStore::new("cv_embeddings"));
    let job_store = Arc::new(MemoryStore::new("job_desc_req_documents"));
    let pipeline = MatchingPipeline::new(
        embedder.clone(),
        cv_store.clone(),
        job_store.clone(),
        generator.clone(),
        Arc::new(PdfRenderer::new()),
    );
    Fixture {
        pipeline,
        embedder,
        generator,
        cv_store,
        job_store,
    }
}

pub fn job_corpus() -> Vec<JobPosting> {
    let job = |id: &str, title: &str, description: &str, requirements: &[&str]| JobPosting {
        job_id: id.to_string(),
        title: Some(title.to_string()),
        description: description.to_string(),
        requirements: requirements.iter().map(|r| r.to_string()).collect(),
    };
    vec![
        job(
            "job-backend-go",
            "Senior Backend Engineer",
            "Design distributed systems and backend services in Go",
            &["Go", "distributed systems", "gRPC"],
        ),
        job(
            "job-data-scientist",
            "Data Scientist",
            "Train machine learning models with Python and statistics",
            &["Python", "machine learning", "statistics"],
        ),
        job(
            "job-frontend",
            "Frontend Developer",
            "Build React interfaces with TypeScript and CSS",
            &["React", "TypeScript", "CSS"],
        ),
        job(
            "job-devops",
            "DevOps Engineer",
            "Operate Kubernetes clusters and Terraform pipelines",
            &["Kubernetes", "Terraform", "AWS"],
        ),
        job(
            "job-designer",
            "Product Designer",
            "Create Figma prototypes and run user research",
            &["Figma", "user research"],
        ),
    ]
}

pub fn test_state(fixture: &Fixture, archive: Option<Arc<dyn DocumentArchive>>) -> AppState {
    AppState {
        pipeline: Arc::new(fixture.pipeline.clone()),
        cv_loader: CvLoader::new(Duration::from_secs(1)).unwrap(),
        archive,
    }
}
