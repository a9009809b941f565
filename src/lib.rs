pub mod config;
pub mod errors;
pub mod evals;
pub mod guard;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
