#[cfg(test)]
use std::collections::HashMap;

use anyhow::{bail, Context, Result};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Which vector store backend the recommendation collections live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorStoreBackend {
    Chroma,
    /// In-process store, lost on restart. For local development only.
    Memory,
}

/// Optional S3-compatible archive for generated documents.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub generation_model: String,
    pub embedding_model: String,
    pub vector_store: VectorStoreBackend,
    pub chroma_host: String,
    pub chroma_port: u16,
    pub cv_collection: String,
    pub job_collection: String,
    pub archive: Option<ArchiveConfig>,
    pub http_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            gemini_api_key: require(&lookup, "GEMINI_API_KEY")?,
            gemini_base_url: var("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            generation_model: var("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            embedding_model: var("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            vector_store: parse_backend(&var("VECTOR_STORE", "chroma"))?,
            chroma_host: var("CHROMA_SERVER_HOST", "localhost"),
            chroma_port: var("CHROMA_SERVER_PORT", "8000")
                .parse::<u16>()
                .context("CHROMA_SERVER_PORT must be a valid port number")?,
            cv_collection: var("CV_COLLECTION", "cv_embeddings"),
            job_collection: var("JOB_COLLECTION", "job_desc_req_documents"),
            archive: archive_config(&lookup),
            http_timeout_secs: var("HTTP_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            port: var("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }

    /// Builds the config from a fixed set of variables.
    #[cfg(test)]
    pub fn from_map(vars: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    pub fn chroma_url(&self) -> String {
        format!("http://{}:{}", self.chroma_host, self.chroma_port)
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_backend(raw: &str) -> Result<VectorStoreBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "chroma" => Ok(VectorStoreBackend::Chroma),
        "memory" => Ok(VectorStoreBackend::Memory),
        other => bail!("VECTOR_STORE must be 'chroma' or 'memory', got '{other}'"),
    }
}

/// The archive is enabled only when a bucket and both credentials are present.
fn archive_config<F>(lookup: &F) -> Option<ArchiveConfig>
where
    F: Fn(&str) -> Option<String>,
{
    Some(ArchiveConfig {
        bucket: lookup("S3_BUCKET")?,
        endpoint: lookup("S3_ENDPOINT"),
        region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        access_key_id: lookup("AWS_ACCESS_KEY_ID")?,
        secret_access_key: lookup("AWS_SECRET_ACCESS_KEY")?,
    })
}
