//! Multiple-choice quiz parsing and grading.
//!
//! Oracle output is a `---`-separated list of question blocks:
//!
//! ```text
//! Q: Which organelle performs photosynthesis?
//! A) Mitochondrion
//! B) Chloroplast
//! C) Ribosome
//! D) Nucleus
//! C: B
//! E: Chloroplasts contain chlorophyll.
//! D: easy
//! ```
//!
//! `C:` may name the correct option by letter or by its full text. Blocks
//! without exactly four options or with an unresolvable answer are dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Difficulty;

/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

const OPTION_LABELS: [char; OPTIONS_PER_QUESTION] = ['A', 'B', 'C', 'D'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Text of the correct option; always one of `options`.
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    pub difficulty: Difficulty,
}

/// One graded answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_index: usize,
    pub selected_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub user_answers: Vec<UserAnswer>,
    /// Percentage of correct answers, set on submission.
    pub score: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("quiz already submitted")]
    AlreadySubmitted,
    #[error("question index {0} is out of range")]
    UnknownQuestion(usize),
}

impl Quiz {
    pub fn new(
        document_id: impl Into<String>,
        document_title: &str,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            title: format!("Quiz for {}", document_title),
            questions,
            user_answers: Vec::new(),
            score: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Grade `(question_index, selected option text)` pairs and record the
    /// result. Unanswered questions count as wrong.
    pub fn submit(
        &mut self,
        answers: &[(usize, String)],
        at: DateTime<Utc>,
    ) -> Result<u32, QuizError> {
        if self.is_completed() {
            return Err(QuizError::AlreadySubmitted);
        }

        let mut graded = Vec::with_capacity(answers.len());
        for (question_index, selected) in answers {
            let question = self
                .questions
                .get(*question_index)
                .ok_or(QuizError::UnknownQuestion(*question_index))?;
            graded.push(UserAnswer {
                question_index: *question_index,
                selected_answer: selected.clone(),
                is_correct: selected.trim() == question.correct_answer,
            });
        }

        let correct = graded.iter().filter(|a| a.is_correct).count();
        let score = percentage(correct, self.questions.len());

        self.user_answers = graded;
        self.score = Some(score);
        self.completed_at = Some(at);
        Ok(score)
    }
}

fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// Parse oracle output into questions.
pub fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    raw.split("---")
        .filter(|block| !block.trim().is_empty())
        .filter_map(parse_question)
        .collect()
}

fn parse_question(block: &str) -> Option<QuizQuestion> {
    let mut question = String::new();
    let mut options: Vec<String> = Vec::new();
    let mut correct = String::new();
    let mut explanation = String::new();
    let mut difficulty = Difficulty::default();

    for line in block.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Q:") {
            question = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("C:") {
            correct = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("E:") {
            explanation = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("D:") {
            if let Ok(d) = rest.parse() {
                difficulty = d;
            }
        } else if let Some(option) = option_text(line) {
            options.push(option.to_string());
        }
    }

    if question.is_empty() || options.len() != OPTIONS_PER_QUESTION {
        return None;
    }
    let correct_answer = resolve_answer(&correct, &options)?;

    Some(QuizQuestion {
        question,
        options,
        correct_answer,
        explanation,
        difficulty,
    })
}

/// `"B) Chloroplast"` → `"Chloroplast"`.
fn option_text(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let label = chars.next()?;
    if !OPTION_LABELS.contains(&label.to_ascii_uppercase()) {
        return None;
    }
    let rest = chars.as_str();
    let rest = rest.strip_prefix(')').or_else(|| rest.strip_prefix('.'))?;
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn resolve_answer(correct: &str, options: &[String]) -> Option<String> {
    let correct = correct.trim();
    if correct.is_empty() {
        return None;
    }
    // "B", "B)", "b." or "B) Chloroplast"
    let mut chars = correct.chars();
    if let Some(label) = chars.next() {
        let rest = chars.as_str();
        let is_label = rest.is_empty() || rest.starts_with(')') || rest.starts_with('.');
        if is_label {
            if let Some(pos) = OPTION_LABELS
                .iter()
                .position(|l| *l == label.to_ascii_uppercase())
            {
                return options.get(pos).cloned();
            }
        }
    }
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(correct))
        .cloned()
}
