//! Chroma REST (v1) collection adapter.
//!
//! The collection is created on first use with cosine space; Chroma's cosine
//! distance `d` is reported as score `1 - d`, keeping Chroma's ordering.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::info;

use super::{Metadata, ScoredPoint, StoreError, VectorRecord, VectorStore};

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    ids: [&'a str; 1],
    embeddings: [&'a [f32]; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    metadatas: Option<[&'a Metadata; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    documents: Option<[&'a str; 1]>,
}

#[derive(Debug, Default, Deserialize)]
struct GetResponse {
    #[serde(default)]
    ids: Vec<String>,
    embeddings: Option<Vec<Vec<f32>>>,
    documents: Option<Vec<Option<String>>>,
    metadatas: Option<Vec<Option<Metadata>>>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    distances: Option<Vec<Vec<f32>>>,
    metadatas: Option<Vec<Vec<Option<Metadata>>>>,
}

/// A single Chroma collection, resolved lazily by name.
pub struct ChromaCollection {
    client: Client,
    base_url: String,
    name: String,
    id: OnceCell<String>,
}

impl ChromaCollection {
    pub fn new(base_url: &str, name: &str, timeout: Duration) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            name: name.to_string(),
            id: OnceCell::new(),
        })
    }

    /// Resolves (get-or-create) the collection id once per process.
    async fn collection_id(&self) -> Result<&str, StoreError> {
        let id = self
            .id
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(format!("{}/api/v1/collections", self.base_url))
                    .json(&json!({
                        "name": self.name,
                        "metadata": {"hnsw:space": "cosine"},
                        "get_or_create": true,
                    }))
                    .send()
                    .await
                    .map_err(unavailable)?;
                let info: CollectionInfo = check(response).await?.json().await?;
                info!("Resolved Chroma collection '{}' -> {}", self.name, info.id);
                Ok::<_, StoreError>(info.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn post(&self, action: &str, body: &impl Serialize) -> Result<Response, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/{}",
                self.base_url, id, action
            ))
            .json(body)
            .send()
            .await
            .map_err(unavailable)?;
        check(response).await
    }
}

#[async_trait]
impl VectorStore for ChromaCollection {
    async fn upsert(&self, record: VectorRecord) -> Result<(), StoreError> {
        // Chroma rejects empty metadata maps, so omit them entirely.
        let body = UpsertRequest {
            ids: [record.id.as_str()],
            embeddings: [record.vector.as_slice()],
            metadatas: (!record.metadata.is_empty()).then_some([&record.metadata]),
            documents: record.document.as_deref().map(|d| [d]),
        };
        self.post("upsert", &body).await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, StoreError> {
        let body = json!({
            "ids": [id],
            "include": ["embeddings", "documents", "metadatas"],
        });
        let response: GetResponse = self.post("get", &body).await?.json().await?;
        first_record(response)
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>, StoreError> {
        let body = json!({
            "query_embeddings": [vector],
            "n_results": top_k,
            "include": ["distances", "metadatas"],
        });
        let response: QueryResponse = self.post("query", &body).await?.json().await?;
        scored_points(response)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .get(format!("{}/api/v1/collections/{}/count", self.base_url, id))
            .send()
            .await
            .map_err(unavailable)?;
        Ok(check(response).await?.json::<usize>().await?)
    }

    async fn heartbeat(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(format!("{}/api/v1/heartbeat", self.base_url))
            .send()
            .await
            .map_err(unavailable)?;
        check(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(StoreError::Api {
        status: status.as_u16(),
        message,
    })
}

fn first_record(response: GetResponse) -> Result<Option<VectorRecord>, StoreError> {
    let Some(id) = response.ids.into_iter().next() else {
        return Ok(None);
    };
    let vector = response
        .embeddings
        .and_then(|e| e.into_iter().next())
        .ok_or_else(|| StoreError::Malformed(format!("record '{id}' has no embedding")))?;
    let document = response.documents.and_then(|d| d.into_iter().next().flatten());
    let metadata = response
        .metadatas
        .and_then(|m| m.into_iter().next().flatten())
        .unwrap_or_default();

    Ok(Some(VectorRecord {
        id,
        vector,
        document,
        metadata,
    }))
}

fn scored_points(response: QueryResponse) -> Result<Vec<ScoredPoint>, StoreError> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .ok_or_else(|| StoreError::Malformed("query response has no distances".to_string()))?;
    if distances.len() != ids.len() {
        return Err(StoreError::Malformed(format!(
            "{} ids but {} distances",
            ids.len(),
            distances.len()
        )));
    }
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    Ok(ids
        .into_iter()
        .zip(distances)
        .map(|(id, distance)| ScoredPoint {
            id,
            score: 1.0 - distance,
            metadata: metadatas.next().flatten().unwrap_or_default(),
        })
        .collect())
}
