//! Prompt construction for the generative-text oracle.
//!
//! Every prompt is plain text. Retrieval-backed prompts (chat, concept
//! explanation) receive a context window built by [`join_context`] from
//! ranked chunks; whole-document prompts (summary, flashcards, quiz)
//! receive the extracted text cut to a character budget.

use crate::models::ScoredChunk;

/// Separator between chunks inside a context window.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Default character budget for whole-document prompts.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 15_000;

/// Concatenate ranked chunk contents, in ranked order, separated by a blank line.
pub fn join_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn chat_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context from a document, answer the user's question.\n\
         If the answer is not in the context, say so.\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Answer:",
        context, question
    )
}

pub fn explain_concept_prompt(concept: &str, context: &str) -> String {
    format!(
        "Explain the concept of \"{}\" based on the following context.\n\
         Provide a clear, educational explanation that is easy to understand.\n\
         Include examples if relevant.\n\n\
         Context:\n{}",
        concept, context
    )
}

pub fn summary_prompt(text: &str, max_chars: usize) -> String {
    format!(
        "Provide a concise summary of the following text, highlighting the key concepts, \
         main ideas, and important points.\nKeep the summary clear and structured.\n\n\
         Text:\n{}",
        truncate_chars(text, max_chars)
    )
}

pub fn flashcards_prompt(text: &str, count: usize, max_chars: usize) -> String {
    format!(
        "Generate exactly {} educational flashcards from the following text.\n\n\
         Format each flashcard as:\n\
         Q: [clear, specific question]\n\
         A: [concise, accurate answer]\n\
         D: [difficulty level: easy, medium, hard]\n\n\
         Separate each flashcard with \"---\"\n\n\
         Text:\n{}",
        count,
        truncate_chars(text, max_chars)
    )
}

pub fn quiz_prompt(text: &str, num_questions: usize, max_chars: usize) -> String {
    format!(
        "Generate exactly {} multiple choice questions from the following text.\n\n\
         Format each question as:\n\
         Q: [question]\n\
         A) [option]\n\
         B) [option]\n\
         C) [option]\n\
         D) [option]\n\
         C: [letter of the correct option]\n\
         E: [brief explanation]\n\
         D: [difficulty level: easy, medium, hard]\n\n\
         Separate each question with \"---\"\n\n\
         Text:\n{}",
        num_questions,
        truncate_chars(text, max_chars)
    )
}
