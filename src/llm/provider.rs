use async_trait::async_trait;

use super::types::ChatMessage;
use crate::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai", "local")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// chat completion (non-streaming)
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ApiError>;

    /// embed a batch of document texts, one vector per input
    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    /// embed a single query text
    async fn embed_query(&self, input: &str) -> Result<Vec<f32>, ApiError> {
        let inputs = [input.to_string()];
        let mut vectors = self.embed_documents(&inputs).await?;
        vectors
            .pop()
            .ok_or_else(|| ApiError::Provider("empty embedding response".to_string()))
    }
}
