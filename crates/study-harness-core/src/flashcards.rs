//! Flashcard parsing and review bookkeeping.
//!
//! The oracle is asked (see [`crate::prompts::flashcards_prompt`]) to emit
//! cards in a line-oriented format, separated by `---`:
//!
//! ```text
//! Q: What organelle produces ATP?
//! A: The mitochondrion.
//! D: easy
//! ---
//! Q: ...
//! ```
//!
//! [`parse_flashcards`] is lenient: unknown lines are ignored, a missing or
//! unrecognized difficulty becomes `medium`, and cards missing either the
//! question or the answer are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Difficulty;

/// Separator between cards in oracle output.
pub const CARD_SEPARATOR: &str = "---";

/// A question/answer pair parsed from oracle output, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

/// A stored flashcard with review state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub review_count: u32,
    pub is_starred: bool,
}

impl From<GeneratedCard> for Flashcard {
    fn from(card: GeneratedCard) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: card.question,
            answer: card.answer,
            difficulty: card.difficulty,
            last_reviewed: None,
            review_count: 0,
            is_starred: false,
        }
    }
}

/// All cards generated from one document in one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: String,
    pub document_id: String,
    pub cards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    pub fn new(document_id: impl Into<String>, cards: Vec<GeneratedCard>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            cards: cards.into_iter().map(Flashcard::from).collect(),
            created_at: Utc::now(),
        }
    }

    /// Record a review of one card. Returns `None` if the card is not in the set.
    pub fn review(&mut self, card_id: &str, at: DateTime<Utc>) -> Option<&Flashcard> {
        let card = self.cards.iter_mut().find(|c| c.id == card_id)?;
        card.review_count += 1;
        card.last_reviewed = Some(at);
        Some(card)
    }

    /// Flip the starred flag of one card. Returns the new flag.
    pub fn toggle_star(&mut self, card_id: &str) -> Option<bool> {
        let card = self.cards.iter_mut().find(|c| c.id == card_id)?;
        card.is_starred = !card.is_starred;
        Some(card.is_starred)
    }

    pub fn reviewed_count(&self) -> usize {
        self.cards.iter().filter(|c| c.review_count > 0).count()
    }

    pub fn starred_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_starred).count()
    }
}

/// Parse oracle output into cards.
pub fn parse_flashcards(raw: &str) -> Vec<GeneratedCard> {
    raw.split(CARD_SEPARATOR)
        .filter(|block| !block.trim().is_empty())
        .filter_map(parse_card)
        .collect()
}

fn parse_card(block: &str) -> Option<GeneratedCard> {
    let mut question = String::new();
    let mut answer = String::new();
    let mut difficulty = Difficulty::default();

    for line in block.trim().lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Q:") {
            question = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("A:") {
            answer = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("D:") {
            if let Ok(d) = rest.parse() {
                difficulty = d;
            }
        }
    }

    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(GeneratedCard {
        question,
        answer,
        difficulty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Q: What is ATP?\nA: The energy currency of the cell.\nD: easy\n---\n\
        Q: Where does glycolysis occur?\nA: In the cytoplasm.\nD: HARD\n---\n\
        Q: Orphan question without answer\nD: medium\n---\n\
        Q: What is osmosis?\nA: Diffusion of water.\nD: impossible\n---\n";

    #[test]
    fn test_parse_flashcards() {
        let cards = parse_flashcards(SAMPLE);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].question, "What is ATP?");
        assert_eq!(cards[0].answer, "The energy currency of the cell.");
        assert_eq!(cards[0].difficulty, Difficulty::Easy);
        assert_eq!(cards[1].difficulty, Difficulty::Hard);
        assert_eq!(cards[2].difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_parse_ignores_preamble_and_blank_output() {
        assert!(parse_flashcards("").is_empty());
        assert!(parse_flashcards("Sure! Here are your cards:\n---\n").is_empty());
    }

    #[test]
    fn test_review_and_star() {
        let mut set = FlashcardSet::new("doc-1", parse_flashcards(SAMPLE));
        let id = set.cards[1].id.clone();
        let now = Utc::now();

        let card = set.review(&id, now).unwrap();
        assert_eq!(card.review_count, 1);
        assert_eq!(card.last_reviewed, Some(now));
        set.review(&id, now).unwrap();
        assert_eq!(set.cards[1].review_count, 2);
        assert_eq!(set.reviewed_count(), 1);

        assert_eq!(set.toggle_star(&id), Some(true));
        assert_eq!(set.starred_count(), 1);
        assert_eq!(set.toggle_star(&id), Some(false));
        assert_eq!(set.starred_count(), 0);

        assert!(set.review("missing", now).is_none());
        assert!(set.toggle_star("missing").is_none());
    }
}
