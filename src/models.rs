//! Data models shared by ingestion, storage, and the assistant, re-exported
//! from `study-harness-core`.

pub use study_harness_core::flashcards::{Flashcard, FlashcardSet};
pub use study_harness_core::models::*;
pub use study_harness_core::quiz::{Quiz, QuizQuestion, UserAnswer};
