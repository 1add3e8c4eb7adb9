//! Chunk a scrape batch and write it to the store.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::Result;
use crate::stores::Collection;
use crate::types::page::PageRecord;

use crate::types::chunk::ContentChunk;

use super::chunk::Chunker;

fn chunk_pages(pages: &[PageRecord], website: &str, chunker: &Chunker) -> Vec<ContentChunk> {
    let captured_at = Utc::now();
    pages
        .iter()
        .enumerate()
        .flat_map(|(page_index, page)| chunker.chunk_page(page, page_index, website, captured_at))
        .collect()
}

/// Chunk every page with one capture time and write all chunks in a single
/// `add`. Returns the number of chunks written.
///
/// A batch that produces no chunks is not an error: it is logged and the
/// store is left untouched.
pub async fn write_pages(
    collection: &Collection,
    pages: &[PageRecord],
    website: &str,
    chunker: &Chunker,
) -> Result<usize> {
    let chunks = chunk_pages(pages, website, chunker);
    if chunks.is_empty() {
        warn!(website = %website, pages = pages.len(), "No chunks to store");
        return Ok(0);
    }

    let written = collection.add(chunks).await?;
    info!(
        website = %website,
        pages = pages.len(),
        chunks = written,
        collection = %collection.name(),
        "Stored content chunks"
    );
    Ok(written)
}

/// Like [`write_pages`], but the new chunks take the place of everything
/// previously stored for `website`.
///
/// The swap happens only after the whole batch is embedded, in one store
/// call. An empty batch keeps the old chunks.
pub async fn replace_pages(
    collection: &Collection,
    pages: &[PageRecord],
    website: &str,
    chunker: &Chunker,
) -> Result<usize> {
    let chunks = chunk_pages(pages, website, chunker);
    if chunks.is_empty() {
        warn!(website = %website, pages = pages.len(), "No chunks to store, keeping previous ones");
        return Ok(0);
    }

    let (removed, written) = collection.replace_website(website, chunks).await?;
    info!(
        website = %website,
        pages = pages.len(),
        removed,
        chunks = written,
        collection = %collection.name(),
        "Replaced content chunks"
    );
    Ok(written)
}
