//! Vector store trait over named collections.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::chunk::{EmbeddedChunk, SearchResult};

/// Persistent nearest-neighbour index of content chunks.
///
/// Collections are created on first write. Document ids are unique per
/// collection: an `add` that repeats an id (within the batch or against
/// stored rows) fails without writing anything.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert a batch of embedded chunks.
    async fn add(&self, collection: &str, records: Vec<EmbeddedChunk>) -> Result<()>;

    /// Up to `n` chunks closest to `embedding`, nearest first.
    async fn query(&self, collection: &str, embedding: &[f32], n: usize) -> Result<Vec<SearchResult>>;

    /// Number of chunks in a collection (0 if it does not exist).
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Remove every chunk whose metadata names `website`. Returns how many went.
    async fn delete_website(&self, collection: &str, website: &str) -> Result<usize>;

    /// Swap a website's chunks for `records` atomically: either the old
    /// chunks are gone and all of `records` are stored, or nothing changes.
    /// Returns how many old chunks were removed.
    async fn replace_website(
        &self,
        collection: &str,
        website: &str,
        records: Vec<EmbeddedChunk>,
    ) -> Result<usize>;

    /// Names of collections holding at least one chunk.
    async fn list_collections(&self) -> Result<Vec<String>>;
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Cosine distance, `1 - similarity`. Lower is closer.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Sort scored results nearest first and keep `n`.
pub(crate) fn nearest(mut results: Vec<SearchResult>, n: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(n);
    results
}
