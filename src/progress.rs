//! Study progress dashboard.
//!
//! Aggregates everything in a [`DocumentStore`]: totals, flashcard review
//! and star counts, the average score of completed quizzes, and the most
//! recently touched documents and quizzes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{DocumentStatus, Quiz};
use crate::store::DocumentStore;

/// How many recent documents and quizzes the dashboard lists.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub documents: usize,
    pub flashcard_sets: usize,
    pub quizzes: usize,
    pub completed_quizzes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardStats {
    pub total: usize,
    /// Cards reviewed at least once.
    pub reviewed: usize,
    pub starred: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDocument {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub status: DocumentStatus,
    pub last_accessed: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuiz {
    pub id: String,
    pub document_id: String,
    pub document_title: String,
    pub score: Option<u32>,
    pub total_questions: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: Totals,
    pub flashcards: FlashcardStats,
    /// Rounded mean score of completed quizzes; 0 when none are completed.
    pub average_score: u32,
    pub recent_documents: Vec<RecentDocument>,
    pub recent_quizzes: Vec<RecentQuiz>,
}

/// Build the dashboard from the store's current contents.
pub async fn dashboard<S>(store: &S) -> Result<Dashboard>
where
    S: DocumentStore + ?Sized,
{
    let documents = store.list_documents().await?;

    let mut totals = Totals {
        documents: documents.len(),
        ..Totals::default()
    };
    let mut flashcards = FlashcardStats::default();
    let mut quizzes: Vec<(Quiz, String)> = Vec::new();

    for doc in &documents {
        for set in store.flashcard_sets(&doc.id).await? {
            totals.flashcard_sets += 1;
            flashcards.total += set.cards.len();
            flashcards.reviewed += set.reviewed_count();
            flashcards.starred += set.starred_count();
        }
        for quiz in store.quizzes(&doc.id).await? {
            quizzes.push((quiz, doc.title.clone()));
        }
    }

    totals.quizzes = quizzes.len();
    let scores: Vec<u32> = quizzes
        .iter()
        .filter(|(q, _)| q.is_completed())
        .map(|(q, _)| q.score.unwrap_or(0))
        .collect();
    totals.completed_quizzes = scores.len();

    // Completed quizzes first, newest completion first; then the rest by creation.
    quizzes.sort_by(|(a, _), (b, _)| {
        b.completed_at
            .cmp(&a.completed_at)
            .then(b.created_at.cmp(&a.created_at))
    });

    Ok(Dashboard {
        totals,
        flashcards,
        average_score: average(&scores),
        recent_documents: documents
            .iter()
            .take(RECENT_LIMIT)
            .map(|d| RecentDocument {
                id: d.id.clone(),
                title: d.title.clone(),
                file_name: d.file_name.clone(),
                status: d.status,
                last_accessed: d.last_accessed,
            })
            .collect(),
        recent_quizzes: quizzes
            .into_iter()
            .take(RECENT_LIMIT)
            .map(|(q, title)| RecentQuiz {
                total_questions: q.total_questions(),
                id: q.id,
                document_id: q.document_id,
                document_title: title,
                score: q.score,
                completed_at: q.completed_at,
            })
            .collect(),
    })
}

fn average(scores: &[u32]) -> u32 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    (sum as f64 / scores.len() as f64).round() as u32
}
