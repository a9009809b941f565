//! Shared ingest pipeline: documents -> chunks -> embeddings -> index.

use crate::errors::ApiError;
use crate::llm::LlmProvider;

use super::chunker::{Chunk, Chunker, Document};
use super::index::SqliteVectorIndex;

/// Embedding requests are batched to keep request bodies bounded.
const EMBED_BATCH: usize = 64;

#[derive(Debug)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Chunks, embeds, and indexes a corpus.
///
/// Fails without touching the index when the corpus is empty or
/// produces no chunks, and aborts on the first embedding error so a
/// failed run never leaves partially embedded batches behind the
/// current transaction boundary.
pub async fn ingest_documents(
    documents: &[Document],
    chunker: &Chunker,
    provider: &dyn LlmProvider,
    index: &SqliteVectorIndex,
) -> Result<IngestReport, ApiError> {
    if documents.is_empty() {
        return Err(ApiError::EmptyCorpus(
            "no documents to ingest".to_string(),
        ));
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    for document in documents {
        chunks.extend(chunker.split_document(document));
    }

    if chunks.is_empty() {
        return Err(ApiError::EmptyCorpus(
            "documents produced no chunks".to_string(),
        ));
    }

    tracing::info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "embedding corpus"
    );

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH) {
        let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embedded = provider.embed_documents(&inputs).await?;
        if embedded.len() != batch.len() {
            return Err(ApiError::Provider(format!(
                "embedding count mismatch: requested {}, received {}",
                batch.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded);
    }

    index.upsert(&chunks, &vectors).await?;

    Ok(IngestReport {
        documents: documents.len(),
        chunks: chunks.len(),
    })
}
