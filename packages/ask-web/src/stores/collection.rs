//! A named collection bound to an embedder.

use std::sync::Arc;
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::traits::ai::Embedder;
use crate::traits::store::VectorStore;
use crate::types::chunk::{CollectionStats, ContentChunk, EmbeddedChunk, SearchResult};

/// Store + embedder + collection name.
///
/// Everything the pipeline writes or retrieves goes through one of these,
/// so chunk text and query text are always embedded by the same model.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    name: String,
}

impl Collection {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, name: impl Into<String>) -> Self {
        Self {
            store,
            embedder,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, chunks: Vec<ContentChunk>) -> Result<Vec<EmbeddedChunk>> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(ExtractionError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect())
    }

    /// Embed and insert chunks in one store write. Returns how many were added.
    pub async fn add(&self, chunks: Vec<ContentChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let records = self.embed(chunks).await?;
        let count = records.len();

        debug!(collection = %self.name, chunks = count, "Writing chunks");
        self.store.add(&self.name, records).await?;
        Ok(count)
    }

    /// The `n` chunks nearest to `text`.
    pub async fn query(&self, text: &str, n: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(text).await?;
        self.store.query(&self.name, &embedding, n).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count(&self.name).await
    }

    pub async fn stats(&self) -> Result<CollectionStats> {
        Ok(CollectionStats {
            collection_name: self.name.clone(),
            total_chunks: self.count().await?,
        })
    }

    /// Embed `chunks`, then swap them in for everything stored from
    /// `website` in one store call. Returns `(removed, added)`.
    ///
    /// If embedding or the write fails, the old chunks stay.
    pub async fn replace_website(&self, website: &str, chunks: Vec<ContentChunk>) -> Result<(usize, usize)> {
        let records = self.embed(chunks).await?;
        let added = records.len();

        debug!(collection = %self.name, website = %website, chunks = added, "Replacing chunks");
        let removed = self.store.replace_website(&self.name, website, records).await?;
        Ok((removed, added))
    }

    /// Remove all chunks scraped from `website`.
    pub async fn delete_website(&self, website: &str) -> Result<usize> {
        self.store.delete_website(&self.name, website).await
    }
}
