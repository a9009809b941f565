use std::sync::Arc;

use crate::errors::ApiError;
use crate::llm::LlmProvider;

use super::chunker::Chunk;
use super::index::SqliteVectorIndex;

/// Maps a question to its top-k most similar chunks.
pub struct Retriever {
    provider: Arc<dyn LlmProvider>,
    index: Arc<SqliteVectorIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(provider: Arc<dyn LlmProvider>, index: Arc<SqliteVectorIndex>, top_k: usize) -> Self {
        Self {
            provider,
            index,
            top_k,
        }
    }

    /// Embeds the question and returns the nearest chunks in
    /// decreasing similarity order. Fewer than `top_k` chunks come
    /// back when the index is smaller than `top_k`.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Chunk>, ApiError> {
        let query_embedding = self.provider.embed_query(question).await?;
        let scored = self.index.search(&query_embedding, self.top_k).await?;

        tracing::debug!(
            question_len = question.len(),
            hits = scored.len(),
            "retrieved context chunks"
        );

        Ok(scored.into_iter().map(|(chunk, _)| chunk).collect())
    }
}
