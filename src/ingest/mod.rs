//! Corpus acquisition: local files and the web crawler.

mod crawler;
mod loader;

pub use crawler::{CrawlConfig, Crawler};
pub use loader::load_directory;
