//! Deterministic in-process provider for tests.

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::ChatMessage;
use crate::errors::ApiError;

const DIMENSIONS: usize = 16;

/// Test provider with hash-bucket embeddings and an echoing chat model.
///
/// Embeddings are a bag-of-words projection into a fixed number of
/// buckets, so identical text always embeds identically and texts
/// sharing words score higher than unrelated ones. `chat` echoes the
/// last user message so tests can assert on the assembled prompt.
pub struct MockProvider;

fn bucket(word: &str) -> usize {
    word.bytes().fold(0usize, |acc, b| {
        acc.wrapping_mul(31).wrapping_add(b as usize)
    }) % DIMENSIONS
}

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        vector[bucket(word)] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ApiError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(format!("ANSWER based on:\n{}", last_user))
    }

    async fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(inputs.iter().map(|text| embed_text(text)).collect())
    }
}

/// Provider that fails every call, for abort-path tests.
pub struct FailingProvider;

#[async_trait]
impl LlmProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String, ApiError> {
        Err(ApiError::Provider("backend unreachable".to_string()))
    }

    async fn embed_documents(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Err(ApiError::Provider("backend unreachable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_deterministic() {
        let a = embed_text("The sky is blue");
        let b = embed_text("The sky is blue");
        assert_eq!(a, b);
    }

    #[test]
    fn different_texts_differ() {
        let a = embed_text("the sky is blue");
        let b = embed_text("completely unrelated words here");
        assert_ne!(a, b);
    }
}
