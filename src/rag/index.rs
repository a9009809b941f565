//! SQLite-backed vector index.
//!
//! In-process persistent store using SQLite for chunk rows and
//! brute-force cosine similarity for search. Entries are append-only
//! within an ingest run and read-only at query time; single-writer
//! discipline is assumed for the persistence directory.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::chunker::Chunk;
use crate::errors::ApiError;

pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    /// Opens (or creates) the index under the given persistence
    /// directory. The directory is fixed for the life of the value.
    pub async fn open(persist_dir: &Path) -> Result<Self, ApiError> {
        std::fs::create_dir_all(persist_dir).map_err(ApiError::store)?;
        Self::with_path(persist_dir.join("index.db")).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::store)?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL,
                sequence_index INTEGER NOT NULL,
                start_offset INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::store)?;

        Ok(())
    }

    /// Appends chunks with their embedding vectors in one transaction.
    ///
    /// Append is the only supported ingest-time mutation; there is no
    /// update or delete path, so re-ingestion adds new rows.
    pub async fn upsert(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<(), ApiError> {
        if chunks.len() != vectors.len() {
            return Err(ApiError::Store(format!(
                "chunk/vector count mismatch: {} vs {}",
                chunks.len(),
                vectors.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::store)?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            let blob = serialize_embedding(vector);
            sqlx::query(
                "INSERT INTO chunks (chunk_id, content, source, sequence_index, start_offset, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(chunk.sequence_index as i64)
            .bind(chunk.start_offset as i64)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::store)?;
        }

        tx.commit().await.map_err(ApiError::store)?;
        Ok(())
    }

    /// Returns up to `k` chunks ordered by decreasing cosine
    /// similarity; ties keep insertion order. With fewer than `k`
    /// entries, all of them come back.
    pub async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>, ApiError> {
        let rows = sqlx::query(
            "SELECT content, source, sequence_index, start_offset, embedding
             FROM chunks
             ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::store)?;

        let mut scored: Vec<(Chunk, f32)> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = deserialize_embedding(&embedding_bytes);
                let score = cosine_similarity(query_embedding, &stored);
                (row_to_chunk(row), score)
            })
            .collect();

        // Stable sort over rowid order: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.max(1));

        Ok(scored)
    }

    pub async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::store)?;
        Ok(count as usize)
    }
}

fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Chunk {
    let sequence_index: i64 = row.get("sequence_index");
    let start_offset: i64 = row.get("start_offset");
    Chunk {
        content: row.get("content"),
        source: row.get("source"),
        sequence_index: sequence_index as usize,
        start_offset: start_offset as usize,
    }
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_index() -> (SqliteVectorIndex, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let index = SqliteVectorIndex::open(dir.path()).await.unwrap();
        (index, dir)
    }

    fn make_chunk(content: &str, source: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: source.to_string(),
            sequence_index: 0,
            start_offset: 0,
        }
    }

    #[tokio::test]
    async fn upsert_and_search() {
        let (index, _dir) = test_index().await;

        let chunks = vec![
            make_chunk("the sky is blue", "a.md"),
            make_chunk("grass is green", "b.md"),
        ];
        let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        index.upsert(&chunks, &vectors).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 2);

        let results = index.search(&[1.0, 0.0, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.source, "a.md");
        assert!(results[0].1 > 0.99);
    }

    #[tokio::test]
    async fn search_returns_at_most_k() {
        let (index, _dir) = test_index().await;

        let chunks: Vec<Chunk> = (0..5)
            .map(|i| make_chunk(&format!("chunk {}", i), "doc.md"))
            .collect();
        let vectors: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32, 1.0]).collect();
        index.upsert(&chunks, &vectors).await.unwrap();

        let results = index.search(&[1.0, 1.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn search_returns_all_when_fewer_than_k() {
        let (index, _dir) = test_index().await;

        let chunks = vec![make_chunk("only one", "doc.md")];
        index.upsert(&chunks, &[vec![1.0, 0.0]]).await.unwrap();

        let results = index.search(&[0.5, 0.5], 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let (index, _dir) = test_index().await;

        let chunks = vec![
            make_chunk("first inserted", "a.md"),
            make_chunk("second inserted", "b.md"),
            make_chunk("third inserted", "c.md"),
        ];
        // Identical vectors: all scores tie.
        let vectors = vec![vec![1.0, 0.0]; 3];
        index.upsert(&chunks, &vectors).await.unwrap();

        let results = index.search(&[1.0, 0.0], 3).await.unwrap();
        let sources: Vec<&str> = results.iter().map(|(c, _)| c.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "b.md", "c.md"]);
    }

    #[tokio::test]
    async fn append_only_reingestion_adds_rows() {
        let (index, _dir) = test_index().await;

        let chunks = vec![make_chunk("same chunk", "doc.md")];
        index.upsert(&chunks, &[vec![1.0]]).await.unwrap();
        index.upsert(&chunks, &[vec![1.0]]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mismatched_lengths_rejected() {
        let (index, _dir) = test_index().await;

        let chunks = vec![make_chunk("chunk", "doc.md")];
        let result = index.upsert(&chunks, &[]).await;
        assert!(matches!(result, Err(ApiError::Store(_))));
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn index_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = SqliteVectorIndex::open(dir.path()).await.unwrap();
            index
                .upsert(&[make_chunk("durable", "doc.md")], &[vec![1.0, 2.0]])
                .await
                .unwrap();
        }

        let reopened = SqliteVectorIndex::open(dir.path()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let results = reopened.search(&[1.0, 2.0], 1).await.unwrap();
        assert_eq!(results[0].0.content, "durable");
    }
}
