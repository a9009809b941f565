//! Shared application state for the query server.

use std::sync::Arc;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::llm::{provider_from_settings, LlmProvider};
use crate::rag::{AnswerComposer, Retriever, SqliteVectorIndex};

pub struct AppState {
    pub retriever: Retriever,
    pub composer: AnswerComposer,
}

impl AppState {
    /// Wires the provider, index, retriever and composer from settings.
    /// The index must already contain ingested chunks; an empty index
    /// only surfaces at query time as empty retrieval results.
    pub async fn initialize(settings: &Settings) -> Result<Self, ApiError> {
        let provider = provider_from_settings(settings);
        let index = Arc::new(SqliteVectorIndex::open(&settings.persist_dir).await?);

        tracing::info!(
            provider = provider.name(),
            indexed_chunks = index.count().await?,
            "application state ready"
        );

        Ok(Self::with_components(provider, index, settings.top_k))
    }

    pub fn with_components(
        provider: Arc<dyn LlmProvider>,
        index: Arc<SqliteVectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever: Retriever::new(provider.clone(), index, top_k),
            composer: AnswerComposer::new(provider),
        }
    }
}
