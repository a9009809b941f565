//! Prompt assembly and answer generation.

use std::sync::Arc;

use crate::errors::ApiError;
use crate::llm::{ChatMessage, LlmProvider};

use super::chunker::Chunk;

pub const SYSTEM_PROMPT: &str = "You are a helpful technical assistant. \
Use the context to answer. Cite sources as [source: <path or url>]. \
If unsure, say so.";

/// Renders retrieved chunks as a context block, one chunk per entry,
/// each prefixed with its source tag.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[source: {}]\n{}", chunk.source, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_messages(question: &str, chunks: &[Chunk]) -> Vec<ChatMessage> {
    let context = format_context(chunks);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(&format!(
            "Question: {}\n\nContext:\n{}\n\nAnswer with citations.",
            question, context
        )),
    ]
}

pub struct AnswerComposer {
    provider: Arc<dyn LlmProvider>,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Sends the assembled prompt to the chat model and returns its
    /// answer text verbatim. Citations are not validated against the
    /// provided chunks.
    pub async fn compose(&self, question: &str, chunks: &[Chunk]) -> Result<String, ApiError> {
        let messages = build_messages(question, chunks);
        self.provider.chat(&messages).await
    }
}
