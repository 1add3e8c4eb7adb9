//! Fixed-size word windows over page content.

use chrono::{DateTime, Utc};

use crate::types::chunk::{ChunkMetadata, ContentChunk};
use crate::types::config::RetrievalConfig;
use crate::types::page::PageRecord;

/// Splits pages into non-overlapping windows of `window` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window: usize,
    min_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl Chunker {
    pub fn new(window: usize, min_chars: usize) -> Self {
        Self {
            window: window.max(1),
            min_chars,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.chunk_words, config.min_chunk_chars)
    }

    /// Chunks for one page.
    ///
    /// `chunk_index` is the window position, so a window dropped for being
    /// too short leaves a gap in the indices.
    pub fn chunk_page(
        &self,
        page: &PageRecord,
        page_index: usize,
        website: &str,
        captured_at: DateTime<Utc>,
    ) -> Vec<ContentChunk> {
        let words: Vec<&str> = page.content.split_whitespace().collect();

        words
            .chunks(self.window)
            .enumerate()
            .filter_map(|(chunk_index, window)| {
                let text = window.join(" ");
                if text.trim().chars().count() < self.min_chars {
                    return None;
                }
                Some(ContentChunk {
                    document_id: ContentChunk::document_id(website, page_index, chunk_index, captured_at),
                    text,
                    metadata: ChunkMetadata {
                        url: page.url.clone(),
                        title: page.title.clone(),
                        website: website.to_string(),
                        chunk_index,
                        image_count: page.image_count,
                        timestamp: captured_at,
                    },
                })
            })
            .collect()
    }
}
