//! Document chunking.
//!
//! Splits text recursively by a priority list of separators (paragraph
//! break, line break, sentence punctuation, space, character), merging
//! the smallest units that fit the chunk budget. Separators stay
//! attached to the preceding unit, so chunk contents are verbatim
//! slices of the source text and concatenating them (minus overlap)
//! reconstructs the document exactly.

use serde::{Deserialize, Serialize};

/// A loaded source text with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    /// Filesystem path or URL the content came from.
    pub source: String,
}

/// An overlapping slice of a document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    /// Source of the parent document.
    pub source: String,
    /// Position of this chunk within its document.
    pub sequence_index: usize,
    /// Character offset of the chunk start in the original text.
    pub start_offset: usize,
}

/// Separator priority, coarsest first. The empty level is hard
/// character slicing.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// `chunk_overlap` must be smaller than `chunk_size` (enforced by
    /// `Settings::validate`).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        debug_assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Splits a document into ordered, overlapping chunks.
    ///
    /// Empty documents produce no chunks. Every chunk after the first
    /// restarts `chunk_overlap` characters before the prior chunk's
    /// end (clamped at the document start), and no chunk exceeds
    /// `chunk_size` characters.
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.content.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        // Merge budget excludes the overlap so the final chunk length
        // stays within chunk_size after the overlap is prepended.
        let budget = self.chunk_size - self.chunk_overlap;

        let mut atoms = Vec::new();
        atomize(&chars, 0, chars.len(), 0, budget, &mut atoms);

        let merged = merge_atoms(&atoms, budget);

        merged
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| {
                let overlapped_start = if i == 0 {
                    start
                } else {
                    start.saturating_sub(self.chunk_overlap)
                };
                Chunk {
                    content: chars[overlapped_start..end].iter().collect(),
                    source: document.source.clone(),
                    sequence_index: i,
                    start_offset: overlapped_start,
                }
            })
            .collect()
    }
}

/// Recursively splits `[start, end)` into pieces no longer than
/// `budget` characters, descending the separator priority list and
/// falling back to hard slicing when no separator helps.
fn atomize(
    chars: &[char],
    start: usize,
    end: usize,
    level: usize,
    budget: usize,
    out: &mut Vec<(usize, usize)>,
) {
    if end - start <= budget {
        out.push((start, end));
        return;
    }

    if level >= SEPARATORS.len() {
        let mut piece_start = start;
        while piece_start < end {
            let piece_end = (piece_start + budget).min(end);
            out.push((piece_start, piece_end));
            piece_start = piece_end;
        }
        return;
    }

    let separator: Vec<char> = SEPARATORS[level].chars().collect();
    let pieces = split_keeping_separator(chars, start, end, &separator);

    if pieces.len() == 1 {
        atomize(chars, start, end, level + 1, budget, out);
        return;
    }

    for (piece_start, piece_end) in pieces {
        atomize(chars, piece_start, piece_end, level + 1, budget, out);
    }
}

/// Splits on every separator occurrence, keeping the separator
/// attached to the preceding piece so no characters are lost.
fn split_keeping_separator(
    chars: &[char],
    start: usize,
    end: usize,
    separator: &[char],
) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut piece_start = start;
    let mut i = start;

    while i + separator.len() <= end {
        if chars[i..i + separator.len()] == *separator {
            let piece_end = i + separator.len();
            pieces.push((piece_start, piece_end));
            piece_start = piece_end;
            i = piece_end;
        } else {
            i += 1;
        }
    }

    if piece_start < end {
        pieces.push((piece_start, end));
    }
    pieces
}

/// Greedily merges adjacent atoms while the merged span fits `budget`.
fn merge_atoms(atoms: &[(usize, usize)], budget: usize) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in atoms {
        if let Some(last) = merged.last_mut() {
            if end - last.0 <= budget {
                last.1 = end;
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}
