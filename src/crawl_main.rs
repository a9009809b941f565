//! Crawls a documentation site into the vector index.

use anyhow::Context;

use docsqa::config::Settings;
use docsqa::ingest::{CrawlConfig, Crawler};
use docsqa::llm::provider_from_settings;
use docsqa::logging;
use docsqa::rag::{ingest_documents, Chunker, SqliteVectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load settings")?;
    logging::init(&settings);

    let crawler = Crawler::new(CrawlConfig::from_settings(&settings))
        .context("failed to build crawler")?;
    let documents = crawler.crawl().await.context("crawl failed")?;
    if documents.is_empty() {
        anyhow::bail!("No pages discovered; check CRAWL_SEED_URL and CRAWL_ALLOW_PREFIX.");
    }

    let provider = provider_from_settings(&settings);
    let index = SqliteVectorIndex::open(&settings.persist_dir)
        .await
        .context("failed to open vector index")?;
    let chunker = Chunker::new(settings.chunk_size, settings.chunk_overlap);

    let report = ingest_documents(&documents, &chunker, provider.as_ref(), &index)
        .await
        .context("ingest failed")?;

    tracing::info!(
        pages = report.documents,
        chunks = report.chunks,
        index = %settings.persist_dir.display(),
        "crawl ingest complete"
    );
    println!(
        "Crawled {} pages into {} chunks at {}",
        report.documents,
        report.chunks,
        settings.persist_dir.display()
    );

    Ok(())
}
