//! Optional archive of generated documents in S3-compatible storage.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ArchiveConfig;

pub const COVER_LETTER_PREFIX: &str = "generated_cover_letter";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive upload failed: {0}")]
    Upload(String),
}

#[async_trait]
pub trait DocumentArchive: Send + Sync {
    /// Stores a PDF and returns its object key.
    async fn store_pdf(&self, bytes: Vec<u8>) -> Result<String, ArchiveError>;
}

pub fn cover_letter_key(id: Uuid) -> String {
    format!("{COVER_LETTER_PREFIX}/{id}.pdf")
}

pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    /// Builds a client for MinIO (custom endpoint, path-style) or AWS.
    pub async fn from_config(config: &ArchiveConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "hireon-static",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl DocumentArchive for S3Archive {
    async fn store_pdf(&self, bytes: Vec<u8>) -> Result<String, ArchiveError> {
        let key = cover_letter_key(Uuid::new_v4());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("application/pdf")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ArchiveError::Upload(e.to_string()))?;
        Ok(key)
    }
}
