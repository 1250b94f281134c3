mod config;
mod embedding;
mod errors;
mod llm_client;
mod matching;
mod render;
mod routes;
mod state;
mod vector_store;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, VectorStoreBackend};
use crate::embedding::GeminiEmbedder;
use crate::llm_client::GeminiClient;
use crate::matching::archive::{DocumentArchive, S3Archive};
use crate::matching::cv_source::CvLoader;
use crate::matching::MatchingPipeline;
use crate::render::PdfRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::{ChromaCollection, MemoryStore, VectorStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireOn API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.http_timeout_secs);

    // Initialize provider clients
    let generator = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.generation_model.clone(),
        timeout,
    )?;
    let embedder = GeminiEmbedder::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.embedding_model.clone(),
        timeout,
    )?;
    info!(
        "Gemini clients initialized (generation: {}, embedding: {})",
        config.generation_model, config.embedding_model
    );

    // Initialize vector store collections
    let (cv_store, job_store) = build_stores(&config, timeout)?;
    info!(
        "Vector store: {:?} (collections '{}', '{}')",
        config.vector_store,
        cv_store.name(),
        job_store.name()
    );

    // Initialize optional document archive
    let archive: Option<Arc<dyn DocumentArchive>> = match &config.archive {
        Some(archive_config) => {
            info!("Document archive enabled (bucket: {})", archive_config.bucket);
            let archive: Arc<dyn DocumentArchive> =
                Arc::new(S3Archive::from_config(archive_config).await);
            Some(archive)
        }
        None => {
            info!("Document archive disabled");
            None
        }
    };

    let pipeline = MatchingPipeline::new(
        Arc::new(embedder),
        cv_store,
        job_store,
        Arc::new(generator),
        Arc::new(PdfRenderer::new()),
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        cv_loader: CvLoader::new(timeout)?,
        archive,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs the CV and job collections for the configured backend.
fn build_stores(
    config: &Config,
    timeout: Duration,
) -> Result<(Arc<dyn VectorStore>, Arc<dyn VectorStore>)> {
    match config.vector_store {
        VectorStoreBackend::Chroma => {
            let url = config.chroma_url();
            let cvs: Arc<dyn VectorStore> =
                Arc::new(ChromaCollection::new(&url, &config.cv_collection, timeout)?);
            let jobs: Arc<dyn VectorStore> =
                Arc::new(ChromaCollection::new(&url, &config.job_collection, timeout)?);
            Ok((cvs, jobs))
        }
        VectorStoreBackend::Memory => {
            let cvs: Arc<dyn VectorStore> = Arc::new(MemoryStore::new(config.cv_collection.clone()));
            let jobs: Arc<dyn VectorStore> =
                Arc::new(MemoryStore::new(config.job_collection.clone()));
            Ok((cvs, jobs))
        }
    }
}
