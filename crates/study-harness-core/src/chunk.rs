//! Paragraph-aware, word-budgeted text chunker with overlap.
//!
//! Splits extracted document text into [`Chunk`]s of at most
//! `chunk_size` words. Paragraphs are kept whole where possible, and
//! consecutive chunks share a tail of `overlap` words so that context at a
//! chunk boundary is not lost to downstream retrieval.
//!
//! # Algorithm
//!
//! 1. Normalize line endings (`\r\n` and `\r` become `\n`).
//! 2. Split on runs of one or more newlines; trim each paragraph and drop
//!    the empty ones (whitespace-only lines never form a paragraph).
//! 3. Accumulate paragraphs into a buffer while the word count fits.
//! 4. When the next paragraph would overflow a non-empty buffer, flush the
//!    buffer as a chunk and seed the next one with the flushed chunk's last
//!    `overlap` words, followed by the paragraph.
//! 5. A single paragraph longer than `chunk_size` flushes the buffer and is
//!    cut alone into windows of `chunk_size` words, advancing by
//!    `chunk_size - overlap` words each time.
//! 6. Indices are assigned in emission order starting at 0.
//!
//! # Example
//!
//! ```rust
//! use study_harness_core::chunk::{chunk_text, ChunkOptions};
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", &ChunkOptions::default()).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].index, 0);
//! assert_eq!(chunks[0].content, "Hello world.\n\nSecond paragraph.");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Chunk;

/// Default word budget per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default number of words repeated at the start of the next chunk.
pub const DEFAULT_OVERLAP: usize = 50;

/// Separator placed between paragraphs that share a chunk.
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Word budget and overlap for [`chunk_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Maximum words per chunk. Must be positive.
    pub chunk_size: usize,
    /// Words carried over between consecutive chunks. Must be below `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkOptions {
    /// Build validated options.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        let options = Self {
            chunk_size,
            overlap,
        };
        options.validate()?;
        Ok(options)
    }

    /// Reject parameters that would make windowing stall.
    ///
    /// An overlap equal to or larger than the chunk size leaves a window
    /// step of zero, which would never consume the text.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidParameter(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidParameter(format!(
                "overlap ({}) must be less than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split text into overlapping, word-budgeted chunks.
///
/// Returns an empty vector for empty or whitespace-only text. Chunk
/// indices are contiguous: `0, 1, 2, …, N-1`, and every chunk's content is
/// non-empty.
///
/// # Guarantees
///
/// - The last `overlap` words of every accumulated chunk open the next
///   one, so a seeded chunk may hold up to `chunk_size + overlap` words.
///   Unseeded chunks and paragraph windows hold at most `chunk_size`.
/// - Identical inputs produce identical output.
///
/// # Errors
///
/// [`Error::InvalidParameter`] if `chunk_size` is 0 or `overlap >= chunk_size`.
pub fn chunk_text(text: &str, options: &ChunkOptions) -> Result<Vec<Chunk>> {
    options.validate()?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let normalized = normalize_line_endings(text);
    let mut pieces: Vec<String> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();
    let mut buffer_words = 0usize;

    for paragraph in paragraphs(&normalized) {
        let words: Vec<&str> = paragraph.split_whitespace().collect();

        if words.len() > options.chunk_size {
            if !buffer.is_empty() {
                pieces.push(buffer.join(PARAGRAPH_SEPARATOR));
                buffer.clear();
                buffer_words = 0;
            }
            pieces.extend(word_windows(&words, options));
            continue;
        }

        if !buffer.is_empty() && buffer_words + words.len() > options.chunk_size {
            let flushed = buffer.join(PARAGRAPH_SEPARATOR);
            let seed = overlap_tail(&flushed, options.overlap);
            pieces.push(flushed);
            buffer.clear();
            buffer_words = 0;
            if !seed.is_empty() {
                buffer_words = seed.split_whitespace().count();
                buffer.push(seed);
            }
        }

        buffer_words += words.len();
        buffer.push(paragraph.to_string());
    }

    if !buffer.is_empty() {
        pieces.push(buffer.join(PARAGRAPH_SEPARATOR));
    }

    // No paragraph survived splitting; window over the whole text instead.
    if pieces.is_empty() && !normalized.trim().is_empty() {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        pieces = word_windows(&words, options);
    }

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk::new(index, content))
        .collect())
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Paragraphs are delimited by one or more consecutive newlines.
fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

/// The last `n` whitespace-delimited words of `text`, joined by spaces.
fn overlap_tail(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}

/// Fixed-size word windows advancing by `chunk_size - overlap`.
///
/// The final window may be shorter; windowing stops once a window reaches
/// the end of the input.
fn word_windows(words: &[&str], options: &ChunkOptions) -> Vec<String> {
    let mut windows = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + options.chunk_size).min(words.len());
        windows.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += options.step();
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(chunk_size: usize, overlap: usize) -> ChunkOptions {
        ChunkOptions::new(chunk_size, overlap).unwrap()
    }

    fn numbered_words(prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("{}{}", prefix, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", &ChunkOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_whitespace_only_text() {
        let chunks = chunk_text("   \n\n  ", &ChunkOptions::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", &ChunkOptions::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].page_number, 0);
        assert_eq!(chunks[0].content, "Hello, world!");
    }

    #[test]
    fn test_paragraphs_joined_with_blank_line() {
        let text = "First paragraph.\nSecond paragraph.\n\n\nThird paragraph.";
        let chunks = chunk_text(text, &ChunkOptions::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "First paragraph.\n\nSecond paragraph.\n\nThird paragraph."
        );
    }

    #[test]
    fn test_crlf_and_blank_lines_normalized() {
        let text = "Alpha beta\r\n   \r\n\r\n\t\r\nGamma delta\rEpsilon";
        let chunks = chunk_text(text, &ChunkOptions::default()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Alpha beta\n\nGamma delta\n\nEpsilon");
    }

    #[test]
    fn test_single_long_paragraph_windows() {
        let text = numbered_words("w", 25);
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        assert_eq!(chunks.len(), 4);

        let starts: Vec<&str> = chunks
            .iter()
            .map(|c| c.content.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(starts, vec!["w0", "w7", "w14", "w21"]);

        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert!(c.word_count() <= 10);
        }
        assert_eq!(chunks[3].content, "w21 w22 w23 w24");
    }

    #[test]
    fn test_window_stops_at_end_of_paragraph() {
        // 17 words: windows at 0 and 7; the second reaches the end.
        let text = numbered_words("w", 17);
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].word_count(), 10);
    }

    #[test]
    fn test_overlap_seeds_next_chunk() {
        let text = "a1 a2 a3 a4\nb1 b2 b3 b4\nc1 c2 c3 c4";
        let chunks = chunk_text(text, &opts(10, 3)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a1 a2 a3 a4\n\nb1 b2 b3 b4");
        assert_eq!(chunks[1].content, "b2 b3 b4\n\nc1 c2 c3 c4");

        let prev: Vec<&str> = chunks[0].content.split_whitespace().collect();
        let next: Vec<&str> = chunks[1].content.split_whitespace().collect();
        assert_eq!(&prev[prev.len() - 3..], &next[..3]);
    }

    #[test]
    fn test_full_overlap_kept_before_large_paragraph() {
        let text = format!("a1 a2 a3 a4\n{}", numbered_words("b", 9));
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a1 a2 a3 a4");
        assert!(chunks[1].content.starts_with("a2 a3 a4\n\nb0"));
        assert_eq!(chunks[1].word_count(), 12);
    }

    #[test]
    fn test_full_overlap_kept_when_paragraph_fills_budget() {
        let text = format!("a1 a2 a3 a4\n{}", numbered_words("b", 10));
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[1].content,
            format!("a2 a3 a4\n\n{}", numbered_words("b", 10))
        );
        assert_eq!(chunks[1].word_count(), 13);
    }

    #[test]
    fn test_seed_counts_toward_budget() {
        // Seed (3) + c (4) = 7; d (4) would make 11 and flushes again.
        let text = format!(
            "{}\n{}\n{}\n{}",
            numbered_words("a", 8),
            numbered_words("c", 4),
            numbered_words("d", 4),
            numbered_words("e", 1)
        );
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents[1], "a5 a6 a7\n\nc0 c1 c2 c3");
        assert_eq!(contents[2], "c1 c2 c3\n\nd0 d1 d2 d3\n\ne0");
    }

    #[test]
    fn test_zero_overlap_has_no_seed() {
        let text = "a1 a2 a3\nb1 b2 b3";
        let chunks = chunk_text(text, &opts(4, 0)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "a1 a2 a3");
        assert_eq!(chunks[1].content, "b1 b2 b3");
    }

    #[test]
    fn test_oversized_paragraph_flushes_buffer_first() {
        let text = format!("short intro\n{}\ntail words", numbered_words("w", 12));
        let chunks = chunk_text(&text, &opts(10, 2)).unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents[0], "short intro");
        assert!(contents[1].starts_with("w0 "));
        assert!(contents[2].starts_with("w8 "));
        // The buffer after a windowed paragraph starts fresh, without a seed.
        assert_eq!(*contents.last().unwrap(), "tail words");
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
        }
    }

    #[test]
    fn test_word_budget_respected() {
        let text = (0..40)
            .map(|i| numbered_words(&format!("p{}_", i), 1 + (i * 7) % 9))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text(&text, &opts(10, 3)).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.word_count() <= 13, "chunk {} has {} words", c.index, c.word_count());
            assert!(!c.content.trim().is_empty());
        }
        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].content.split_whitespace().collect();
            let next: Vec<&str> = pair[1].content.split_whitespace().collect();
            assert_eq!(&prev[prev.len() - 3..], &next[..3]);
        }
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = (0..50)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text(&text, &opts(10, 2)).unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i, "Index mismatch at position {}", i);
        }
    }

    #[test]
    fn test_multibyte_utf8_words() {
        let text = "┌── naïve café ──┐\nüber straße 日本語 テキスト";
        let chunks = chunk_text(text, &opts(3, 1)).unwrap();
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(!c.content.is_empty());
            assert!(c.word_count() <= 3);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha one two\n\nBeta three four\n\nGamma five six\n\nDelta seven";
        let c1 = chunk_text(text, &opts(5, 1)).unwrap();
        let c2 = chunk_text(text, &opts(5, 1)).unwrap();
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            ChunkOptions::new(0, 0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ChunkOptions::new(10, 10),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ChunkOptions::new(10, 25),
            Err(Error::InvalidParameter(_))
        ));

        let bad = ChunkOptions {
            chunk_size: 5,
            overlap: 5,
        };
        assert!(matches!(
            chunk_text("some text", &bad),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected_even_for_empty_text() {
        let bad = ChunkOptions {
            chunk_size: 0,
            overlap: 0,
        };
        assert!(chunk_text("", &bad).is_err());
    }

    #[test]
    fn test_default_options() {
        let o = ChunkOptions::default();
        assert_eq!(o.chunk_size, 500);
        assert_eq!(o.overlap, 50);
    }
}
