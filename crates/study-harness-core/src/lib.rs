//! # Study Harness Core
//!
//! Pure, I/O-free logic for Study Harness: data models, the overlapping
//! paragraph chunker, the lexical relevance ranker, prompt construction,
//! and parsers for AI-generated flashcards and quizzes.
//!
//! This crate contains no tokio, HTTP, filesystem, or logging
//! dependencies. Every public function is deterministic given its inputs.

pub mod chunk;
pub mod error;
pub mod flashcards;
pub mod models;
pub mod prompts;
pub mod quiz;
pub mod relevance;

pub use error::{Error, Result};
