//! Retrieval-augmented generation core.
//!
//! This module provides:
//! - `Chunker`: splits documents into overlapping chunks
//! - `SqliteVectorIndex`: persistent nearest-neighbor store
//! - `Retriever`: question -> top-k chunks
//! - `AnswerComposer`: chunks + question -> cited answer
//! - `ingest_documents`: the shared ingest pipeline

mod chunker;
mod composer;
mod index;
mod ingest;
mod retriever;

pub use chunker::{Chunk, Chunker, Document};
pub use composer::{build_messages, format_context, AnswerComposer, SYSTEM_PROMPT};
pub use index::SqliteVectorIndex;
pub use ingest::{ingest_documents, IngestReport};
pub use retriever::Retriever;
