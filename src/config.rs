//! Environment-sourced settings.
//!
//! Every knob is read once at process start; the embedding/chat
//! provider selection derived from these values must stay identical
//! between ingest and query runs, so nothing here is re-read per call.

use std::env;
use std::path::PathBuf;

use crate::errors::ApiError;

/// Runtime configuration for the ingest and query pipelines.
#[derive(Debug, Clone)]
pub struct Settings {
    /// API key for the hosted provider (unused when a local server is set).
    pub openai_api_key: String,
    /// Chat model identifier.
    pub llm_model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Base URL of a local OpenAI-compatible model server. Presence
    /// switches the provider from hosted to local.
    pub local_model_base_url: Option<String>,
    /// Directory holding the persisted vector index.
    pub persist_dir: PathBuf,
    /// Directory scanned by the local document loader.
    pub docs_dir: PathBuf,
    /// File extension the loader accepts (without the dot).
    pub docs_extension: String,
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters of overlap between adjacent chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Seed URL for the web crawler.
    pub crawl_seed_url: String,
    /// Absolute URL prefix a crawled link must match to stay in scope.
    pub crawl_allow_prefix: String,
    /// Page budget per crawl invocation.
    pub crawl_max_pages: usize,
    /// Link depth beyond which pages are not enqueued.
    pub crawl_max_depth: usize,
    /// Concurrent fetches per batch; also the per-host ceiling since
    /// the crawl is prefix-scoped to a single host.
    pub crawl_concurrency: usize,
    /// Timeout for outbound HTTP requests, in seconds.
    pub request_timeout_secs: u64,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// Port the query server binds to.
    pub port: u16,
}

impl Settings {
    /// Loads settings from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();

        let settings = Self {
            openai_api_key: env_or("OPENAI_API_KEY", ""),
            llm_model: env_or("LLM_MODEL", "gpt-4o-mini"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            local_model_base_url: env::var("LOCAL_MODEL_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            persist_dir: PathBuf::from(env_or("PERSIST_DIR", "./data/db")),
            docs_dir: PathBuf::from(env_or("DOCS_DIR", "./data/docs")),
            docs_extension: env_or("DOCS_EXTENSION", "md"),
            chunk_size: env_parse("CHUNK_SIZE", 800)?,
            chunk_overlap: env_parse("CHUNK_OVERLAP", 120)?,
            top_k: env_parse("TOP_K", 4)?,
            crawl_seed_url: env_or(
                "CRAWL_SEED_URL",
                "https://www.quicknode.com/docs/streams/getting-started",
            ),
            crawl_allow_prefix: env_or(
                "CRAWL_ALLOW_PREFIX",
                "https://www.quicknode.com/docs/streams/",
            ),
            crawl_max_pages: env_parse("CRAWL_MAX_PAGES", 100)?,
            crawl_max_depth: env_parse("CRAWL_MAX_DEPTH", 4)?,
            crawl_concurrency: env_parse("CRAWL_CONCURRENCY", 8)?,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 20)?,
            log_dir: PathBuf::from(env_or("LOG_DIR", "./data/logs")),
            port: env_parse("PORT", 8000)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.chunk_size == 0 {
            return Err(ApiError::BadRequest("CHUNK_SIZE must be at least 1".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ApiError::BadRequest(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(ApiError::BadRequest("TOP_K must be at least 1".into()));
        }
        if self.crawl_concurrency == 0 {
            return Err(ApiError::BadRequest(
                "CRAWL_CONCURRENCY must be at least 1".into(),
            ));
        }
        if self.crawl_max_pages == 0 {
            return Err(ApiError::BadRequest(
                "CRAWL_MAX_PAGES must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ApiError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid value for {}: {}", name, raw))),
        _ => Ok(default),
    }
}
