//! Ingests local documents into the vector index.

use anyhow::Context;

use docsqa::config::Settings;
use docsqa::ingest::load_directory;
use docsqa::llm::provider_from_settings;
use docsqa::logging;
use docsqa::rag::{ingest_documents, Chunker, SqliteVectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load settings")?;
    logging::init(&settings);

    let documents = load_directory(&settings.docs_dir, &settings.docs_extension)
        .context("failed to load documents")?;
    // Checked before the index is opened so a failed run never leaves
    // an empty database behind.
    if documents.is_empty() {
        anyhow::bail!(
            "no .{} files found under {}; check DOCS_DIR and DOCS_EXTENSION",
            settings.docs_extension,
            settings.docs_dir.display()
        );
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
        documents = report.documents,
        chunks = report.chunks,
        index = %settings.persist_dir.display(),
        "ingest complete"
    );
    println!(
        "Ingested {} documents as {} chunks into {}",
        report.documents,
        report.chunks,
        settings.persist_dir.display()
    );

    Ok(())
}
