//! Offline evaluation harness.
//!
//! Runs a JSONL evalset through the full retrieve-and-compose path,
//! asks the chat model to judge each answer, and writes per-question
//! and aggregate metrics as CSV and Markdown.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::llm::{ChatMessage, LlmProvider};
use crate::rag::{format_context, AnswerComposer, Retriever};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    pub question: String,
    pub ground_truth: String,
}

/// Scores on a 0.0 to 1.0 scale, as judged by the chat model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvalScore {
    pub faithfulness: f64,
    pub answer_relevancy: f64,
    pub context_precision: f64,
}

#[derive(Debug)]
pub struct EvalResult {
    pub question: String,
    pub answer: String,
    pub score: EvalScore,
}

#[derive(Debug)]
pub struct EvalReport {
    pub results: Vec<EvalResult>,
    pub mean: EvalScore,
}

const JUDGE_SYSTEM_PROMPT: &str = "You are a strict evaluation judge for a \
document question-answering system. Respond with a single JSON object and \
nothing else: {\"faithfulness\": <0..1>, \"answer_relevancy\": <0..1>, \
\"context_precision\": <0..1>}. faithfulness: is the answer supported by \
the context. answer_relevancy: does the answer address the question. \
context_precision: is the retrieved context relevant to the ground truth.";

/// Reads one `EvalRecord` per line, skipping blank lines. A malformed
/// line fails the whole load so a typo cannot silently shrink the set.
pub fn load_evalset(path: &Path) -> Result<Vec<EvalRecord>, ApiError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        ApiError::BadRequest(format!("cannot read evalset {}: {}", path.display(), err))
    })?;

    let mut records = Vec::new();
    for (number, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: EvalRecord = serde_json::from_str(line).map_err(|err| {
            ApiError::BadRequest(format!(
                "evalset line {} is not a valid record: {}",
                number + 1,
                err
            ))
        })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "evalset {} contains no records",
            path.display()
        )));
    }
    Ok(records)
}

/// Runs every record through retrieval, composition, and judging.
pub async fn run_evalset(
    records: &[EvalRecord],
    retriever: &Retriever,
    composer: &AnswerComposer,
    judge: Arc<dyn LlmProvider>,
) -> Result<EvalReport, ApiError> {
    let mut results = Vec::with_capacity(records.len());

    for record in records {
        let chunks = retriever.retrieve(&record.question).await?;
        let answer = composer.compose(&record.question, &chunks).await?;
        let context = format_context(&chunks);

        let verdict = judge
            .chat(&[
                ChatMessage::system(JUDGE_SYSTEM_PROMPT),
                ChatMessage::user(&format!(
                    "Question: {}\n\nGround truth: {}\n\nContext:\n{}\n\nAnswer:\n{}",
                    record.question, record.ground_truth, context, answer
                )),
            ])
            .await?;

        let score = parse_verdict(&verdict).unwrap_or_else(|| {
            tracing::warn!(
                question = %record.question,
                "judge verdict was not parseable, scoring zero"
            );
            EvalScore::default()
        });

        tracing::info!(
            question = %record.question,
            faithfulness = score.faithfulness,
            answer_relevancy = score.answer_relevancy,
            context_precision = score.context_precision,
            "evaluated question"
        );

        results.push(EvalResult {
            question: record.question.clone(),
            answer,
            score,
        });
    }

    let mean = mean_score(&results);
    Ok(EvalReport { results, mean })
}

/// Extracts the first JSON object from the verdict text. Models often
/// wrap JSON in prose or code fences, so this scans for braces rather
/// than parsing the whole reply.
fn parse_verdict(verdict: &str) -> Option<EvalScore> {
    let start = verdict.find('{')?;
    let end = verdict.rfind('}')?;
    if end <= start {
        return None;
    }
    let score: EvalScore = serde_json::from_str(&verdict[start..=end]).ok()?;

    let in_range = |v: f64| (0.0..=1.0).contains(&v);
    if in_range(score.faithfulness)
        && in_range(score.answer_relevancy)
        && in_range(score.context_precision)
    {
        Some(score)
    } else {
        None
    }
}

fn mean_score(results: &[EvalResult]) -> EvalScore {
    if results.is_empty() {
        return EvalScore::default();
    }
    let n = results.len() as f64;
    EvalScore {
        faithfulness: results.iter().map(|r| r.score.faithfulness).sum::<f64>() / n,
        answer_relevancy: results.iter().map(|r| r.score.answer_relevancy).sum::<f64>() / n,
        context_precision: results
            .iter()
            .map(|r| r.score.context_precision)
            .sum::<f64>()
            / n,
    }
}

/// Writes `metrics.csv` and `metrics.md` into `out_dir`.
pub fn write_report(report: &EvalReport, out_dir: &Path) -> Result<(), ApiError> {
    std::fs::create_dir_all(out_dir).map_err(ApiError::internal)?;
    let timestamp = chrono::Utc::now().to_rfc3339();

    let mut csv = String::from("question,faithfulness,answer_relevancy,context_precision\n");
    for result in &report.results {
        csv.push_str(&format!(
            "{},{:.3},{:.3},{:.3}\n",
            csv_field(&result.question),
            result.score.faithfulness,
            result.score.answer_relevancy,
            result.score.context_precision,
        ));
    }
    std::fs::write(out_dir.join("metrics.csv"), csv).map_err(ApiError::internal)?;

    let mut md = format!(
        "# Evaluation report\n\nGenerated: {}\nQuestions: {}\n\n\
         | Metric | Mean |\n|---|---|\n\
         | Faithfulness | {:.3} |\n\
         | Answer relevancy | {:.3} |\n\
         | Context precision | {:.3} |\n\n\
         ## Per question\n\n\
         | Question | Faithfulness | Answer relevancy | Context precision |\n\
         |---|---|---|---|\n",
        timestamp,
        report.results.len(),
        report.mean.faithfulness,
        report.mean.answer_relevancy,
        report.mean.context_precision,
    );
    for result in &report.results {
        md.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} |\n",
            result.question.replace('|', "\\|"),
            result.score.faithfulness,
            result.score.answer_relevancy,
            result.score.context_precision,
        ));
    }
    std::fs::write(out_dir.join("metrics.md"), md).map_err(ApiError::internal)?;

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
