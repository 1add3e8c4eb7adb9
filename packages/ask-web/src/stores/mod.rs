//! Vector store implementations.
//!
//! - [`MemoryStore`]: in-process, for tests and one-shot runs
//! - `SqliteStore`: file-backed persistence (feature `sqlite`)
//!
//! Both search by brute-force cosine distance. [`Collection`] binds a store
//! to an embedder and a collection name.

pub mod collection;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use collection::Collection;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use std::collections::HashSet;

use crate::error::{ExtractionError, Result};
use crate::types::chunk::EmbeddedChunk;

/// Reject a batch that repeats an id internally.
pub(crate) fn check_batch_ids(records: &[EmbeddedChunk]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.chunk.document_id.as_str()) {
            return Err(ExtractionError::DuplicateDocument {
                id: record.chunk.document_id.clone(),
            });
        }
    }
    Ok(())
}
