use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ScoredPoint, StoreError, VectorRecord, VectorStore};

/// In-memory vector store for development and testing.
///
/// Uses brute-force cosine similarity search. Suitable for small corpora;
/// production deployments use a real vector database.
pub struct MemoryStore {
    name: String,
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, record: VectorRecord) -> Result<(), StoreError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<VectorRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPoint>, StoreError> {
        let records = self.records.read().await;

        let mut results: Vec<ScoredPoint> = records
            .values()
            .map(|record| ScoredPoint {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        // Ties broken by id so repeated queries return the same order.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(top_k);
        Ok(results)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }

    async fn heartbeat(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Mismatched dimensions and zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Metadata;

    fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            vector,
            document: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_and_opposite() {
        let a = vec![1.0, 0.0];
        assert!(cosine_similarity(&a, &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_returns_descending_scores() {
        let store = MemoryStore::new("jobs");
        store.upsert(record("far", vec![0.0, 1.0, 0.0])).await.unwrap();
        store.upsert(record("close", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.upsert(record("medium", vec![0.5, 0.5, 0.0])).await.unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 3).await.unwrap();

        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["close", "medium", "far"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_query_respects_top_k() {
        let store = MemoryStore::new("jobs");
        for (i, v) in [[1.0, 0.0], [0.9, 0.1], [0.8, 0.2]].into_iter().enumerate() {
            store.upsert(record(&i.to_string(), v.to_vec())).await.unwrap();
        }

        assert_eq!(store.query(&[1.0, 0.0], 2).await.unwrap().len(), 2);
        assert_eq!(store.query(&[1.0, 0.0], 100).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryStore::new("cvs");
        store.upsert(record("u1", vec![1.0, 0.0])).await.unwrap();
        store.upsert(record("u1", vec![0.0, 1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get("u1").await.unwrap().unwrap().vector, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_get_missing_and_empty_query() {
        let store = MemoryStore::new("cvs");
        assert!(store.get("nobody").await.unwrap().is_none());
        assert!(store.query(&[1.0], 5).await.unwrap().is_empty());
    }
}
