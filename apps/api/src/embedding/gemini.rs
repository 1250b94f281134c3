use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{validate_input, Embedder, Embedding, EmbeddingError, EmbeddingTask};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: [EmbedPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Gemini `embedContent` client.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url,
            model,
        })
    }

    fn request_body<'a>(&self, text: &'a str, task: EmbeddingTask) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: [EmbedPart { text }],
            },
            task_type: task.as_provider_str(),
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Embedding, EmbeddingError> {
        let text = validate_input(text)?;

        let response = self
            .client
            .post(format!(
                "{}/models/{}:embedContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(text, task))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbedContentResponse = response.json().await?;
        let values = into_values(parsed)?;
        debug!(
            "Embedding created: model={}, task={:?}, dimension={}",
            self.model,
            task,
            values.len()
        );
        Ok(values)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn into_values(response: EmbedContentResponse) -> Result<Embedding, EmbeddingError> {
    response
        .embedding
        .map(|e| e.values)
        .filter(|v| !v.is_empty())
        .ok_or(EmbeddingError::EmptyVector)
}
