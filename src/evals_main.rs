//! Runs the evaluation harness against the current index.
//!
//! Usage: evals [dataset.jsonl] [out_dir]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use docsqa::config::Settings;
use docsqa::evals::{load_evalset, run_evalset, write_report};
use docsqa::llm::provider_from_settings;
use docsqa::logging;
use docsqa::rag::{AnswerComposer, Retriever, SqliteVectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load settings")?;
    logging::init(&settings);

    let mut args = std::env::args().skip(1);
    let evalset_path = PathBuf::from(args.next().unwrap_or_else(|| "evals/dataset.jsonl".into()));
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "evals/out".into()));

    let records = load_evalset(&evalset_path).context("failed to load evalset")?;

    let provider = provider_from_settings(&settings);
    let index = Arc::new(
        SqliteVectorIndex::open(&settings.persist_dir)
            .await
            .context("failed to open vector index")?,
    );
    if index.count().await? == 0 {
        anyhow::bail!(
            "index at {} is empty; run ingest or crawl first",
            settings.persist_dir.display()
        );
    }

    let retriever = Retriever::new(provider.clone(), index, settings.top_k);
    let composer = AnswerComposer::new(provider.clone());

    let report = run_evalset(&records, &retriever, &composer, provider)
        .await
        .context("evaluation run failed")?;
    write_report(&report, &out_dir).context("failed to write report")?;

    println!(
        "Evaluated {} questions. faithfulness={:.3} answer_relevancy={:.3} context_precision={:.3}",
        report.results.len(),
        report.mean.faithfulness,
        report.mean.answer_relevancy,
        report.mean.context_precision
    );
    println!("Reports written to {}", out_dir.display());

    Ok(())
}
