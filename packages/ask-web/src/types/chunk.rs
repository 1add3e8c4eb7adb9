//! Content chunks and vector search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored alongside every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// URL of the page the chunk came from
    pub url: String,

    /// Title of that page
    pub title: String,

    /// Website the scrape was started from
    pub website: String,

    /// Position of the chunk's word window within the page
    pub chunk_index: usize,

    /// Images that contributed text to the page
    pub image_count: usize,

    /// Capture time of the scrape batch
    pub timestamp: DateTime<Utc>,
}

/// A bounded window of page text, the unit written to and read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Unique id across the store's lifetime
    pub document_id: String,

    /// Chunk text (words joined by single spaces)
    pub text: String,

    /// Source page metadata
    pub metadata: ChunkMetadata,
}

impl ContentChunk {
    /// Build the document id for a chunk.
    ///
    /// Website, page index and chunk index are unique within one batch; the
    /// capture time in microseconds separates repeated scrapes of a site.
    pub fn document_id(
        website: &str,
        page_index: usize,
        chunk_index: usize,
        captured_at: DateTime<Utc>,
    ) -> String {
        format!(
            "{}_{}_{}_{}",
            website,
            page_index,
            chunk_index,
            captured_at.timestamp_micros()
        )
    }
}

/// A chunk paired with its embedding, ready for a vector store.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: ContentChunk,
    pub embedding: Vec<f32>,
}

/// One match returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Stored chunk text
    pub text: String,

    /// Stored chunk metadata
    pub metadata: ChunkMetadata,

    /// Cosine distance to the query (0.0 = identical direction)
    pub distance: f32,
}

impl SearchResult {
    /// `1 - distance`, shown to users as a relevance score.
    pub fn relevance(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Size information for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection_name: String,
    pub total_chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_id_layout() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        assert_eq!(
            ContentChunk::document_id("https://ex.com", 2, 1, at),
            "https://ex.com_2_1_1700000000123456"
        );
    }

    #[test]
    fn test_relevance() {
        let result = SearchResult {
            text: "text".into(),
            metadata: ChunkMetadata {
                url: "https://ex.com".into(),
                title: "Ex".into(),
                website: "https://ex.com".into(),
                chunk_index: 0,
                image_count: 0,
                timestamp: Utc::now(),
            },
            distance: 0.25,
        };
        assert!((result.relevance() - 0.75).abs() < f32::EPSILON);
    }
}
