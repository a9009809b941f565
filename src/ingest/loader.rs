//! Local document loader.

use std::path::Path;

use crate::errors::ApiError;
use crate::rag::Document;

/// Recursively loads every file with the given extension under `dir`.
///
/// Sources are the file paths as found during the walk; results are
/// sorted by source so runs are deterministic regardless of directory
/// iteration order. Unreadable or non-UTF-8 files are skipped with a
/// warning rather than failing the run.
pub fn load_directory(dir: &Path, extension: &str) -> Result<Vec<Document>, ApiError> {
    if !dir.is_dir() {
        return Err(ApiError::EmptyCorpus(format!(
            "docs directory not found: {}",
            dir.display()
        )));
    }

    let mut documents = Vec::new();
    walk(dir, extension, &mut documents)?;
    documents.sort_by(|a, b| a.source.cmp(&b.source));

    tracing::info!(
        dir = %dir.display(),
        count = documents.len(),
        "loaded local documents"
    );

    Ok(documents)
}

fn walk(dir: &Path, extension: &str, out: &mut Vec<Document>) -> Result<(), ApiError> {
    let entries = std::fs::read_dir(dir).map_err(ApiError::store)?;

    for entry in entries {
        let entry = entry.map_err(ApiError::store)?;
        let path = entry.path();

        if path.is_dir() {
            walk(&path, extension, out)?;
            continue;
        }

        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => out.push(Document {
                content,
                source: path.display().to_string(),
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
            }
        }
    }

    Ok(())
}
