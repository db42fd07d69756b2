//! Lexical relevance ranking of chunks against a free-text query.
//!
//! No index and no external ranking service: every chunk is scored on the
//! fly from literal word and substring matches, so the ranker works on
//! whatever chunk sequence the caller loaded from storage.
//!
//! # Scoring
//!
//! For each significant query token `w` (lowercased, longer than two
//! characters, not a stop word):
//!
//! 1. `EXACT_MATCH_WEIGHT` per whole-word occurrence of `w`.
//! 2. `PARTIAL_MATCH_WEIGHT` per substring occurrence that is not a
//!    whole-word occurrence (`max(0, substring − exact)`).
//!
//! Then, per chunk:
//!
//! 3. Coverage bonus of `COVERAGE_BONUS_WEIGHT × found` when more than one
//!    distinct token occurs anywhere in the chunk.
//! 4. Divide by `sqrt(word_count)` (at least 1) so long chunks do not win on
//!    size alone.
//! 5. Multiply by `1 − (position / total) × POSITION_DECAY`, a mild
//!    preference for chunks earlier in the document.
//!
//! Chunks scoring ≤ 0 are dropped. Ordering is score (desc), matched token
//! count (desc), chunk index (asc).
//!
//! # Example
//!
//! ```rust
//! use study_harness_core::models::Chunk;
//! use study_harness_core::relevance::find_relevant_chunks;
//!
//! let chunks = vec![
//!     Chunk::new(0, "The mitochondria is the powerhouse of the cell"),
//!     Chunk::new(1, "Photosynthesis occurs in the chloroplast of plant cells"),
//! ];
//! let ranked = find_relevant_chunks(&chunks, "mitochondria cell", 1).unwrap();
//! assert_eq!(ranked.len(), 1);
//! assert_eq!(ranked[0].chunk.index, 0);
//! ```

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{Chunk, ScoredChunk};

/// Words that carry no discriminative meaning for ranking.
pub const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "and", "or", "but", "in", "with", "to", "for",
    "of", "as", "by", "this", "that", "it",
];

/// Tokens with this many characters or fewer are ignored.
pub const MAX_IGNORED_TOKEN_LEN: usize = 2;

/// Points per whole-word occurrence of a query token.
pub const EXACT_MATCH_WEIGHT: f64 = 3.0;

/// Points per substring-only occurrence of a query token.
pub const PARTIAL_MATCH_WEIGHT: f64 = 1.5;

/// Points per distinct token found, applied when more than one is found.
pub const COVERAGE_BONUS_WEIGHT: f64 = 2.0;

/// Largest fractional penalty applied to the last chunk of a document.
pub const POSITION_DECAY: f64 = 0.1;

/// Default number of chunks returned for conversational chat.
pub const DEFAULT_MAX_CHUNKS: usize = 3;

/// Lowercase, split, and filter a query down to its significant tokens.
///
/// Repeated tokens are kept once, in first-occurrence order.
pub fn significant_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query.to_lowercase().split_whitespace() {
        if token.chars().count() <= MAX_IGNORED_TOKEN_LEN || STOP_WORDS.contains(&token) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// A query token with its compiled whole-word pattern.
struct TokenMatcher {
    token: String,
    whole_word: Regex,
}

impl TokenMatcher {
    fn new(token: String) -> Result<Self> {
        let pattern = format!(r"\b{}\b", regex::escape(&token));
        let whole_word = Regex::new(&pattern).map_err(|e| {
            Error::InvalidParameter(format!("query token {:?} is not matchable: {}", token, e))
        })?;
        Ok(Self { token, whole_word })
    }
}

/// Score one lowercased chunk. Returns the raw score and the number of
/// distinct tokens found as substrings.
fn raw_score(content: &str, matchers: &[TokenMatcher]) -> (f64, usize) {
    let mut score = 0.0;
    let mut found = 0usize;

    for m in matchers {
        let exact = m.whole_word.find_iter(content).count();
        let substring = content.matches(m.token.as_str()).count();
        score += exact as f64 * EXACT_MATCH_WEIGHT;
        score += substring.saturating_sub(exact) as f64 * PARTIAL_MATCH_WEIGHT;
        if substring > 0 {
            found += 1;
        }
    }

    if found > 1 {
        score += COVERAGE_BONUS_WEIGHT * found as f64;
    }

    (score, found)
}

struct Candidate {
    position: usize,
    index: usize,
    score: f64,
    raw_score: f64,
    matched_words: usize,
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(b.matched_words.cmp(&a.matched_words))
        .then(a.index.cmp(&b.index))
}

/// Return the `max_chunks` chunks most relevant to `query`.
///
/// - Empty `chunks` or a blank `query` yields an empty vector.
/// - A query with no significant tokens yields the first `max_chunks`
///   chunks in their original order, unscored.
/// - Fewer than `max_chunks` results are returned when fewer chunks score
///   above zero; the result is never padded.
///
/// # Errors
///
/// [`Error::InvalidChunk`] if any chunk's content is empty after trimming.
pub fn find_relevant_chunks(
    chunks: &[Chunk],
    query: &str,
    max_chunks: usize,
) -> Result<Vec<ScoredChunk>> {
    if chunks.is_empty() || query.trim().is_empty() {
        return Ok(Vec::new());
    }

    if let Some(bad) = chunks.iter().find(|c| c.content.trim().is_empty()) {
        return Err(Error::InvalidChunk { index: bad.index });
    }

    let tokens = significant_tokens(query);
    if tokens.is_empty() {
        return Ok(chunks
            .iter()
            .take(max_chunks)
            .cloned()
            .map(ScoredChunk::unscored)
            .collect());
    }

    let matchers = tokens
        .into_iter()
        .map(TokenMatcher::new)
        .collect::<Result<Vec<_>>>()?;

    let total = chunks.len() as f64;
    let mut candidates: Vec<Candidate> = chunks
        .iter()
        .enumerate()
        .filter_map(|(position, chunk)| {
            let content = chunk.content.to_lowercase();
            let (raw, matched_words) = raw_score(&content, &matchers);
            let word_count = content.split_whitespace().count().max(1) as f64;
            let normalized = raw / word_count.sqrt();
            let position_factor = 1.0 - (position as f64 / total) * POSITION_DECAY;
            let score = normalized * position_factor;
            (score > 0.0).then_some(Candidate {
                position,
                index: chunk.index,
                score,
                raw_score: raw,
                matched_words,
            })
        })
        .collect();

    candidates.sort_by(compare_candidates);
    candidates.truncate(max_chunks);

    Ok(candidates
        .into_iter()
        .map(|c| ScoredChunk {
            chunk: chunks[c.position].clone(),
            score: Some(c.score),
            raw_score: Some(c.raw_score),
            matched_words: Some(c.matched_words),
        })
        .collect())
}
