//! In-memory vector store for testing and development.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::error::{ExtractionError, Result};
use crate::traits::store::{cosine_distance, nearest, VectorStore};
use crate::types::chunk::{EmbeddedChunk, SearchResult};

#[derive(Default)]
struct CollectionData {
    ids: HashSet<String>,
    records: Vec<EmbeddedChunk>,
}

/// Chunks held in process memory, lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every collection.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(&self, collection: &str, records: Vec<EmbeddedChunk>) -> Result<()> {
        super::check_batch_ids(&records)?;

        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = records
            .iter()
            .find(|r| data.ids.contains(&r.chunk.document_id))
        {
            return Err(ExtractionError::DuplicateDocument {
                id: existing.chunk.document_id.clone(),
            });
        }

        for record in records {
            data.ids.insert(record.chunk.document_id.clone());
            data.records.push(record);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, embedding: &[f32], n: usize) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(data) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let scored = data
            .records
            .iter()
            .map(|r| SearchResult {
                text: r.chunk.text.clone(),
                metadata: r.chunk.metadata.clone(),
                distance: cosine_distance(embedding, &r.embedding),
            })
            .collect();
        Ok(nearest(scored, n))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|d| d.records.len())
            .unwrap_or(0))
    }

    async fn delete_website(&self, collection: &str, website: &str) -> Result<usize> {
        let mut collections = self.collections.write().await;
        let Some(data) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = data.records.len();
        data.records.retain(|r| r.chunk.metadata.website != website);
        data.ids = data
            .records
            .iter()
            .map(|r| r.chunk.document_id.clone())
            .collect();
        Ok(before - data.records.len())
    }

    async fn replace_website(
        &self,
        collection: &str,
        website: &str,
        records: Vec<EmbeddedChunk>,
    ) -> Result<usize> {
        super::check_batch_ids(&records)?;

        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();

        let kept: HashSet<&str> = data
            .records
            .iter()
            .filter(|r| r.chunk.metadata.website != website)
            .map(|r| r.chunk.document_id.as_str())
            .collect();
        if let Some(existing) = records
            .iter()
            .find(|r| kept.contains(r.chunk.document_id.as_str()))
        {
            return Err(ExtractionError::DuplicateDocument {
                id: existing.chunk.document_id.clone(),
            });
        }

        let before = data.records.len();
        data.records.retain(|r| r.chunk.metadata.website != website);
        let removed = before - data.records.len();
        data.records.extend(records);
        data.ids = data
            .records
            .iter()
            .map(|r| r.chunk.document_id.clone())
            .collect();
        Ok(removed)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .await
            .iter()
            .filter(|(_, d)| !d.records.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::embedded_chunk;

    #[tokio::test]
    async fn test_query_orders_by_distance() {
        let store = MemoryStore::new();
        store
            .add(
                "c",
                vec![
                    embedded_chunk("far", "https://a.com", vec![0.0, 1.0]),
                    embedded_chunk("near", "https://a.com", vec![1.0, 0.1]),
                    embedded_chunk("exact", "https://a.com", vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let results = store.query("c", &[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(ids, vec!["exact text", "near text"]);
        assert!(results[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_duplicate_ids_reject_whole_batch() {
        let store = MemoryStore::new();
        store
            .add("c", vec![embedded_chunk("a", "https://a.com", vec![1.0])])
            .await
            .unwrap();

        let err = store
            .add(
                "c",
                vec![
                    embedded_chunk("b", "https://a.com", vec![1.0]),
                    embedded_chunk("a", "https://a.com", vec![1.0]),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::DuplicateDocument { id } if id == "a"));
        assert_eq!(store.count("c").await.unwrap(), 1);

        let err = store
            .add(
                "c",
                vec![
                    embedded_chunk("x", "https://a.com", vec![1.0]),
                    embedded_chunk("x", "https://a.com", vec![1.0]),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::DuplicateDocument { .. }));
    }

    #[tokio::test]
    async fn test_delete_website_and_collections() {
        let store = MemoryStore::new();
        store
            .add(
                "c",
                vec![
                    embedded_chunk("a1", "https://a.com", vec![1.0]),
                    embedded_chunk("b1", "https://b.com", vec![1.0]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(store.delete_website("c", "https://a.com").await.unwrap(), 1);
        assert_eq!(store.count("c").await.unwrap(), 1);
        assert_eq!(store.count("missing").await.unwrap(), 0);
        assert_eq!(store.list_collections().await.unwrap(), vec!["c".to_string()]);

        // the deleted id can be written again
        store
            .add("c", vec![embedded_chunk("a1", "https://a.com", vec![1.0])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_replace_website_swaps_only_that_site() {
        let store = MemoryStore::new();
        store
            .add(
                "c",
                vec![
                    embedded_chunk("a1", "https://a.com", vec![1.0]),
                    embedded_chunk("a2", "https://a.com", vec![1.0]),
                    embedded_chunk("b1", "https://b.com", vec![1.0]),
                ],
            )
            .await
            .unwrap();

        let removed = store
            .replace_website("c", "https://a.com", vec![embedded_chunk("a1", "https://a.com", vec![0.5])])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("c").await.unwrap(), 2);

        // colliding with another site's id leaves everything in place
        let err = store
            .replace_website("c", "https://a.com", vec![embedded_chunk("b1", "https://a.com", vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::DuplicateDocument { id } if id == "b1"));
        assert_eq!(store.count("c").await.unwrap(), 2);
    }
}
