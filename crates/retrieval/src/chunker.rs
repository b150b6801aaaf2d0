//! Overlapping document chunker with boundary-aware splitting.
//!
//! Splits each page into chunks of at most `chunk_size` characters,
//! repeating the trailing `overlap` characters at the start of the next
//! chunk so context survives the cut. Cut points prefer a paragraph
//! boundary, then a sentence boundary, then a hard character cutoff.

use crate::document::Document;
use crate::types::{Chunk, ChunkMetadata};
use docqa_core::{AppError, AppResult};

/// Splits parsed documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker with the given character budget and overlap.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] unless `0 <= overlap < chunk_size`;
    /// misconfiguration is reported here, not at split time.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Validation(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(AppError::Validation(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Split a document into chunks, page by page.
    ///
    /// Chunks never span pages. An empty document yields zero chunks.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (page_index, page) in document.pages.iter().enumerate() {
            for (start, end, text) in self.split_page(page) {
                let position = chunks.len();
                chunks.push(Chunk {
                    text,
                    metadata: ChunkMetadata {
                        source: document.name.clone(),
                        page: page_index + 1,
                        position,
                        char_range: (start, end),
                    },
                });
            }
        }

        tracing::debug!(
            document = %document.name,
            chunk_count = chunks.len(),
            "Chunked document"
        );

        chunks
    }

    /// Split one page; returns (start_char, end_char, text) triples.
    ///
    /// Text is never trimmed: together the ranges cover every character
    /// of the page, overlapping by at most `self.overlap`.
    fn split_page(&self, page: &str) -> Vec<(usize, usize, String)> {
        // Byte offset of each character, plus a one-past-end sentinel, so
        // character-budget arithmetic can slice on byte boundaries.
        let mut offsets: Vec<usize> = page.char_indices().map(|(i, _)| i).collect();
        offsets.push(page.len());
        let total_chars = offsets.len() - 1;

        let mut out = Vec::new();
        let mut start = 0usize;

        while start < total_chars {
            let end = if total_chars - start <= self.chunk_size {
                total_chars
            } else {
                self.find_break(page, &offsets, start)
            };

            let text = page[offsets[start]..offsets[end]].to_string();
            if !text.is_empty() {
                out.push((start, end, text));
            }

            if end == total_chars {
                break;
            }

            // Step back by the overlap, guaranteeing forward progress even
            // when a boundary produced a chunk shorter than the overlap.
            start = if end > start + self.overlap {
                end - self.overlap
            } else {
                end
            };
        }

        out
    }

    /// Pick the cut point for a chunk starting at `start` (char index).
    ///
    /// Preference order: last paragraph boundary in the window, last
    /// sentence boundary, hard cutoff at the character budget.
    fn find_break(&self, page: &str, offsets: &[usize], start: usize) -> usize {
        let hard_end = start + self.chunk_size;
        let window = &page[offsets[start]..offsets[hard_end]];

        if let Some(idx) = window.rfind("\n\n") {
            let end = char_index_of(offsets, offsets[start] + idx + 2);
            if end > start {
                return end;
            }
        }

        if let Some(idx) = rfind_sentence_break(window) {
            let end = char_index_of(offsets, offsets[start] + idx);
            if end > start {
                return end;
            }
        }

        hard_end
    }
}

/// Map a byte offset (always a char boundary here) back to a char index.
fn char_index_of(offsets: &[usize], byte: usize) -> usize {
    offsets.partition_point(|&b| b < byte)
}

/// Byte offset one past the last sentence terminator+whitespace pair.
fn rfind_sentence_break(window: &str) -> Option<usize> {
    let mut best = None;
    let mut iter = window.char_indices().peekable();

    while let Some((_, ch)) = iter.next() {
        if matches!(ch, '.' | '!' | '?') {
            if let Some(&(next_idx, next_ch)) = iter.peek() {
                if next_ch.is_whitespace() {
                    best = Some(next_idx + next_ch.len_utf8());
                }
            }
        }
    }

    best
}
