//! Language-model backends.
//!
//! One provider serves both embedding and chat so that query-time
//! vectors always come from the same model configuration that built
//! the index. Selection happens exactly once, from [`Settings`].

mod local;
mod openai;
mod provider;
mod types;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

pub use local::LocalServerProvider;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use types::ChatMessage;

use crate::config::Settings;

/// Builds the provider chosen by configuration.
///
/// A configured local model server wins over the hosted API; the same
/// instance must be reused for ingest and query within a process.
pub fn provider_from_settings(settings: &Settings) -> Arc<dyn LlmProvider> {
    match &settings.local_model_base_url {
        Some(base_url) => Arc::new(LocalServerProvider::new(
            base_url.clone(),
            settings.llm_model.clone(),
            settings.embedding_model.clone(),
        )),
        None => Arc::new(OpenAiProvider::new(
            settings.openai_api_key.clone(),
            settings.llm_model.clone(),
            settings.embedding_model.clone(),
        )),
    }
}
