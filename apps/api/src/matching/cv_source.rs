//! Resolves CV text from a request: inline `cvText` or a downloadable `cvUrl`.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::errors::AppError;

/// Largest CV document accepted from `cvUrl`.
pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

/// Downloads CV documents and extracts their text.
#[derive(Clone)]
pub struct CvLoader {
    client: Client,
}

impl CvLoader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Inline text wins over a URL. Blank inline text with no URL is a validation
    /// error; neither field present is an unprocessable request.
    pub async fn resolve(
        &self,
        cv_text: Option<String>,
        cv_url: Option<String>,
    ) -> Result<String, AppError> {
        match (cv_text, cv_url) {
            (Some(text), _) if !text.trim().is_empty() => Ok(text),
            (_, Some(url)) if !url.trim().is_empty() => self.load(url.trim()).await,
            (Some(_), _) | (_, Some(_)) => {
                Err(AppError::Validation("cvText cannot be empty".to_string()))
            }
            (None, None) => Err(AppError::UnprocessableEntity(
                "missing field `cvText` (or `cvUrl`)".to_string(),
            )),
        }
    }

    pub async fn load(&self, url: &str) -> Result<String, AppError> {
        let url = Url::parse(url)
            .map_err(|e| AppError::Validation(format!("cvUrl is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "cvUrl scheme '{}' is not supported",
                url.scheme()
            )));
        }

        debug!("Downloading CV from {}", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::CvSource(format!("CV download failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::CvSource(format!(
                "CV download returned status {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(declared) = response.content_length() {
            ensure_within_limit(declared)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AppError::CvSource(format!("CV download failed: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            ensure_within_limit(bytes.len() as u64)?;
        }

        let text = extract_text(content_type.as_deref(), bytes).await?;
        info!("Loaded CV from {} ({} chars)", url, text.chars().count());
        Ok(text)
    }
}

async fn extract_text(content_type: Option<&str>, bytes: Vec<u8>) -> Result<String, AppError> {
    let text = if is_pdf(content_type, &bytes) {
        // pdf-extract can panic on malformed input; a panicked task is an unreadable PDF.
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| AppError::UnprocessableEntity(format!("CV PDF is unreadable: {e}")))?
            .map_err(|e| AppError::UnprocessableEntity(format!("CV PDF is unreadable: {e}")))?
    } else {
        String::from_utf8(bytes).map_err(|_| {
            AppError::UnprocessableEntity("CV document is neither PDF nor UTF-8 text".to_string())
        })?
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "CV document contains no text".to_string(),
        ));
    }
    Ok(text.to_string())
}

fn ensure_within_limit(len: u64) -> Result<(), AppError> {
    if len > MAX_CV_BYTES as u64 {
        return Err(AppError::UnprocessableEntity(format!(
            "CV document exceeds the {MAX_CV_BYTES}-byte limit"
        )));
    }
    Ok(())
}

fn is_pdf(content_type: Option<&str>, bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
        || content_type.is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/pdf"))
}
