//! SQLite vector store.
//!
//! Chunks live in one table keyed by `(collection, id)`. Embeddings are
//! little-endian `f32` BLOBs; similarity is computed in Rust since SQLite
//! has no vector index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::{ExtractionError, Result};
use crate::traits::store::{cosine_distance, nearest, VectorStore};
use crate::types::chunk::{ChunkMetadata, EmbeddedChunk, SearchResult};
use crate::types::config::StorageConfig;

fn storage_error(e: sqlx::Error) -> ExtractionError {
    ExtractionError::Storage(Box::new(e))
}

/// File-backed store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - ephemeral
    /// - `sqlite://./ask_web.db?mode=rwc` - file, created if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(storage_error)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Open the database named by a [`StorageConfig`].
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        Self::new(&config.database_url()).await
    }

    /// In-memory database (for testing). One connection, so every query
    /// sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(storage_error)?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                website TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                image_count INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_website ON chunks(collection, website)")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ChunkRow {
    text: String,
    url: String,
    title: String,
    website: String,
    chunk_index: i64,
    image_count: i64,
    timestamp: DateTime<Utc>,
    embedding: Vec<u8>,
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Insert every record on `conn`. A repeated id fails with
/// [`ExtractionError::DuplicateDocument`]; the caller's transaction then
/// rolls back on drop.
async fn insert_records(
    conn: &mut SqliteConnection,
    collection: &str,
    records: &[EmbeddedChunk],
) -> Result<()> {
    for record in records {
        let chunk = &record.chunk;
        let inserted = sqlx::query(
            r#"
            INSERT INTO chunks
                (collection, id, text, url, title, website, chunk_index, image_count, timestamp, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(&chunk.document_id)
        .bind(&chunk.text)
        .bind(&chunk.metadata.url)
        .bind(&chunk.metadata.title)
        .bind(&chunk.metadata.website)
        .bind(chunk.metadata.chunk_index as i64)
        .bind(chunk.metadata.image_count as i64)
        .bind(chunk.metadata.timestamp)
        .bind(encode_embedding(&record.embedding))
        .execute(&mut *conn)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(ExtractionError::DuplicateDocument {
                    id: chunk.document_id.clone(),
                });
            }
            Err(e) => return Err(storage_error(e)),
        }
    }
    Ok(())
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add(&self, collection: &str, records: Vec<EmbeddedChunk>) -> Result<()> {
        super::check_batch_ids(&records)?;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        insert_records(&mut tx, collection, &records).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    async fn query(&self, collection: &str, embedding: &[f32], n: usize) -> Result<Vec<SearchResult>> {
        let rows: Vec<ChunkRow> = sqlx::query_as(
            r#"
            SELECT text, url, title, website, chunk_index, image_count, timestamp, embedding
            FROM chunks WHERE collection = ?
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let scored = rows
            .into_iter()
            .map(|row| SearchResult {
                distance: cosine_distance(embedding, &decode_embedding(&row.embedding)),
                text: row.text,
                metadata: ChunkMetadata {
                    url: row.url,
                    title: row.title,
                    website: row.website,
                    chunk_index: row.chunk_index.max(0) as usize,
                    image_count: row.image_count.max(0) as usize,
                    timestamp: row.timestamp,
                },
            })
            .collect();
        Ok(nearest(scored, n))
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunks WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(count.max(0) as usize)
    }

    async fn delete_website(&self, collection: &str, website: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = ? AND website = ?")
            .bind(collection)
            .bind(website)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected() as usize)
    }

    async fn replace_website(
        &self,
        collection: &str,
        website: &str,
        records: Vec<EmbeddedChunk>,
    ) -> Result<usize> {
        super::check_batch_ids(&records)?;

        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        let deleted = sqlx::query("DELETE FROM chunks WHERE collection = ? AND website = ?")
            .bind(collection)
            .bind(website)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        insert_records(&mut tx, collection, &records).await?;
        tx.commit().await.map_err(storage_error)?;
        Ok(deleted.rows_affected() as usize)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT collection FROM chunks ORDER BY collection")
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
