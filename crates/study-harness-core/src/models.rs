//! Core data models used throughout Study Harness.
//!
//! These types represent the documents, chunks, ranked chunks, and chat
//! turns that flow between the ingestion pipeline, the ranker, and the
//! storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bounded segment of a document's extracted text.
///
/// Indices are contiguous from 0 within a document and define its reading
/// order. `page_number` is always 0: the chunker receives flat text with no
/// page markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub content: String,
    pub index: usize,
    #[serde(default)]
    pub page_number: u32,
}

impl Chunk {
    pub fn new(index: usize, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            index,
            page_number: 0,
        }
    }

    /// Whitespace-delimited word count of the content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// A chunk ranked against one query.
///
/// Only meaningful for the query that produced it and never persisted. The
/// scoring fields are `None` when the ranker fell back to returning chunks
/// in document order because the query had no significant words.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_words: Option<usize>,
}

impl ScoredChunk {
    pub fn unscored(chunk: Chunk) -> Self {
        Self {
            chunk,
            score: None,
            raw_score: None,
            matched_words: None,
        }
    }
}

/// Processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Ready,
    Failed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An uploaded study document and its chunk sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub file_size: u64,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub content_hash: String,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl Document {
    pub fn is_ready(&self) -> bool {
        self.status == DocumentStatus::Ready
    }
}

/// Difficulty label attached to flashcards and quiz questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a per-document conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Indices of the chunks handed to the oracle for this turn.
    #[serde(default)]
    pub relevant_chunks: Vec<usize>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            relevant_chunks: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, relevant_chunks: Vec<usize>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            relevant_chunks,
        }
    }
}
