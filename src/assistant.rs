//! Study assistant: retrieval-backed chat and generated study material.
//!
//! Every operation works on a `ready` document. Chat and concept
//! explanation rank the document's chunks against the user's text and
//! hand the top chunks to the oracle as context; summaries, flashcards,
//! and quizzes use the extracted text cut to `oracle.max_input_chars`.
//!
//! | Operation | Context |
//! |-----------|---------|
//! | [`chat`](StudyAssistant::chat) | top `retrieval.chat_max_chunks` chunks |
//! | [`explain_concept`](StudyAssistant::explain_concept) | top `retrieval.explain_max_chunks` chunks |
//! | [`summarize`](StudyAssistant::summarize) | extracted text |
//! | [`generate_flashcards`](StudyAssistant::generate_flashcards) | extracted text |
//! | [`generate_quiz`](StudyAssistant::generate_quiz) | extracted text |
//!
//! Listing, deletion, and the progress [`dashboard`](StudyAssistant::dashboard)
//! go straight to the store.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{ChatMessage, Document, DocumentStatus, FlashcardSet, Quiz, ScoredChunk};
use crate::oracle::TextOracle;
use crate::progress::{self, Dashboard};
use crate::relevance::find_relevant_chunks;
use crate::store::DocumentStore;
use study_harness_core::flashcards::parse_flashcards;
use study_harness_core::prompts;
use study_harness_core::quiz::{parse_quiz, QuizError};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("{0} is required")]
    MissingInput(&'static str),

    #[error("{0} must be at least 1")]
    InvalidCount(&'static str),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document {id} is not ready (status: {status})")]
    DocumentNotReady { id: String, status: DocumentStatus },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error(transparent)]
    Retrieval(#[from] study_harness_core::Error),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("oracle returned no usable {0}")]
    EmptyGeneration(&'static str),

    #[error("oracle request failed: {0:#}")]
    Upstream(anyhow::Error),

    #[error("storage failure: {0:#}")]
    Store(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;

/// An oracle answer plus the chunks it was grounded on, in ranked order.
#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    pub text: String,
    pub relevant_chunks: Vec<ScoredChunk>,
}

pub struct StudyAssistant<'a> {
    store: &'a dyn DocumentStore,
    oracle: &'a dyn TextOracle,
    config: &'a Config,
}

impl<'a> StudyAssistant<'a> {
    pub fn new(store: &'a dyn DocumentStore, oracle: &'a dyn TextOracle, config: &'a Config) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    /// Answer a question from the document and append both turns to its
    /// chat history.
    pub async fn chat(&self, document_id: &str, question: &str) -> Result<GroundedAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::MissingInput("question"));
        }
        let doc = self.ready_document(document_id).await?;

        let relevant = find_relevant_chunks(
            &doc.chunks,
            question,
            self.config.retrieval.chat_max_chunks,
        )?;
        debug!(document_id, context_chunks = relevant.len(), "answering question");

        let context = prompts::join_context(&relevant);
        let answer = self.generate(&prompts::chat_prompt(&context, question)).await?;

        let indices = relevant.iter().map(|c| c.chunk.index).collect();
        self.store
            .append_chat(
                document_id,
                &[
                    ChatMessage::user(question),
                    ChatMessage::assistant(answer.clone(), indices),
                ],
            )
            .await
            .map_err(AssistantError::Store)?;

        Ok(GroundedAnswer {
            text: answer,
            relevant_chunks: relevant,
        })
    }

    pub async fn explain_concept(&self, document_id: &str, concept: &str) -> Result<GroundedAnswer> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(AssistantError::MissingInput("concept"));
        }
        let doc = self.ready_document(document_id).await?;

        let relevant = find_relevant_chunks(
            &doc.chunks,
            concept,
            self.config.retrieval.explain_max_chunks,
        )?;
        let context = prompts::join_context(&relevant);
        let text = self
            .generate(&prompts::explain_concept_prompt(concept, &context))
            .await?;

        Ok(GroundedAnswer {
            text,
            relevant_chunks: relevant,
        })
    }

    pub async fn summarize(&self, document_id: &str) -> Result<String> {
        let doc = self.ready_document(document_id).await?;
        self.generate(&prompts::summary_prompt(
            &doc.extracted_text,
            self.config.oracle.max_input_chars,
        ))
        .await
    }

    /// Generate and store a flashcard set. The oracle may return fewer
    /// cards than requested; unparseable blocks are dropped.
    pub async fn generate_flashcards(&self, document_id: &str, count: usize) -> Result<FlashcardSet> {
        if count == 0 {
            return Err(AssistantError::InvalidCount("count"));
        }
        let doc = self.ready_document(document_id).await?;
        let raw = self
            .generate(&prompts::flashcards_prompt(
                &doc.extracted_text,
                count,
                self.config.oracle.max_input_chars,
            ))
            .await?;

        let mut cards = parse_flashcards(&raw);
        if cards.is_empty() {
            return Err(AssistantError::EmptyGeneration("flashcards"));
        }
        cards.truncate(count);

        let set = FlashcardSet::new(&doc.id, cards);
        self.store
            .save_flashcard_set(&set)
            .await
            .map_err(AssistantError::Store)?;
        info!(document_id, set_id = %set.id, cards = set.cards.len(), "flashcards generated");
        Ok(set)
    }

    pub async fn generate_quiz(&self, document_id: &str, num_questions: usize) -> Result<Quiz> {
        if num_questions == 0 {
            return Err(AssistantError::InvalidCount("num_questions"));
        }
        let doc = self.ready_document(document_id).await?;
        let raw = self
            .generate(&prompts::quiz_prompt(
                &doc.extracted_text,
                num_questions,
                self.config.oracle.max_input_chars,
            ))
            .await?;

        let mut questions = parse_quiz(&raw);
        if questions.is_empty() {
            return Err(AssistantError::EmptyGeneration("quiz questions"));
        }
        questions.truncate(num_questions);

        let quiz = Quiz::new(&doc.id, &doc.title, questions);
        self.store
            .save_quiz(&quiz)
            .await
            .map_err(AssistantError::Store)?;
        info!(document_id, quiz_id = %quiz.id, questions = quiz.total_questions(), "quiz generated");
        Ok(quiz)
    }

    /// Record a review of one card and return the updated set.
    pub async fn review_flashcard(&self, set_id: &str, card_id: &str) -> Result<FlashcardSet> {
        let mut set = self.flashcard_set(set_id).await?;
        if set.review(card_id, Utc::now()).is_none() {
            return Err(card_not_found(card_id));
        }
        self.save_set(&set).await?;
        Ok(set)
    }

    /// Flip a card's star and return the new value.
    pub async fn toggle_star(&self, set_id: &str, card_id: &str) -> Result<bool> {
        let mut set = self.flashcard_set(set_id).await?;
        let starred = set
            .toggle_star(card_id)
            .ok_or_else(|| card_not_found(card_id))?;
        self.save_set(&set).await?;
        Ok(starred)
    }

    /// Grade a quiz once and return the stored result.
    pub async fn submit_quiz(&self, quiz_id: &str, answers: &[(usize, String)]) -> Result<Quiz> {
        let mut quiz = self
            .store
            .get_quiz(quiz_id)
            .await
            .map_err(AssistantError::Store)?
            .ok_or_else(|| AssistantError::NotFound {
                kind: "quiz",
                id: quiz_id.to_string(),
            })?;
        let score = quiz.submit(answers, Utc::now())?;
        self.store
            .save_quiz(&quiz)
            .await
            .map_err(AssistantError::Store)?;
        info!(quiz_id, score, "quiz submitted");
        Ok(quiz)
    }

    pub async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatMessage>> {
        self.store
            .chat_history(document_id)
            .await
            .map_err(AssistantError::Store)
    }

    /// All documents, most recently accessed first.
    pub async fn documents(&self) -> Result<Vec<Document>> {
        self.store
            .list_documents()
            .await
            .map_err(AssistantError::Store)
    }

    /// Delete a document together with its flashcards, quizzes and chat.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let removed = self
            .store
            .delete_document(document_id)
            .await
            .map_err(AssistantError::Store)?;
        if !removed {
            return Err(AssistantError::DocumentNotFound(document_id.to_string()));
        }
        info!(document_id, "document deleted");
        Ok(())
    }

    /// Flashcard sets generated from a document, newest first.
    pub async fn flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>> {
        self.store
            .flashcard_sets(document_id)
            .await
            .map_err(AssistantError::Store)
    }

    pub async fn delete_flashcard_set(&self, set_id: &str) -> Result<()> {
        let removed = self
            .store
            .delete_flashcard_set(set_id)
            .await
            .map_err(AssistantError::Store)?;
        if !removed {
            return Err(AssistantError::NotFound {
                kind: "flashcard set",
                id: set_id.to_string(),
            });
        }
        Ok(())
    }

    /// Quizzes generated from a document, newest first.
    pub async fn quizzes(&self, document_id: &str) -> Result<Vec<Quiz>> {
        self.store
            .quizzes(document_id)
            .await
            .map_err(AssistantError::Store)
    }

    pub async fn delete_quiz(&self, quiz_id: &str) -> Result<()> {
        let removed = self
            .store
            .delete_quiz(quiz_id)
            .await
            .map_err(AssistantError::Store)?;
        if !removed {
            return Err(AssistantError::NotFound {
                kind: "quiz",
                id: quiz_id.to_string(),
            });
        }
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        progress::dashboard(self.store)
            .await
            .map_err(AssistantError::Store)
    }

    async fn ready_document(&self, id: &str) -> Result<Document> {
        let doc = self
            .store
            .get_document(id)
            .await
            .map_err(AssistantError::Store)?
            .ok_or_else(|| AssistantError::DocumentNotFound(id.to_string()))?;
        if !doc.is_ready() {
            return Err(AssistantError::DocumentNotReady {
                id: doc.id,
                status: doc.status,
            });
        }
        self.store
            .touch(id, Utc::now())
            .await
            .map_err(AssistantError::Store)?;
        Ok(doc)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = self.oracle.model_name(), prompt_chars = prompt.len(), "oracle request");
        self.oracle
            .generate(prompt)
            .await
            .map_err(AssistantError::Upstream)
    }

    async fn flashcard_set(&self, set_id: &str) -> Result<FlashcardSet> {
        self.store
            .get_flashcard_set(set_id)
            .await
            .map_err(AssistantError::Store)?
            .ok_or_else(|| AssistantError::NotFound {
                kind: "flashcard set",
                id: set_id.to_string(),
            })
    }

    async fn save_set(&self, set: &FlashcardSet) -> Result<()> {
        self.store
            .save_flashcard_set(set)
            .await
            .map_err(AssistantError::Store)
    }
}

fn card_not_found(card_id: &str) -> AssistantError {
    AssistantError::NotFound {
        kind: "flashcard",
        id: card_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MIME_TEXT;
    use crate::ingest::{ingest_document, Upload};
    use crate::models::ChatRole;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and remembers every prompt.
    struct ScriptedOracle {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl TextOracle for ScriptedOracle {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    const NOTES: &str = "Photosynthesis converts light into chemical energy.\n\
        The mitochondria is the powerhouse of the cell.\n\
        Ribosomes assemble proteins from amino acids.";

    async fn ready_doc(store: &InMemoryStore, config: &Config) -> String {
        let mut cfg = config.clone();
        cfg.chunking.chunk_size = 9;
        cfg.chunking.overlap = 0;
        let upload = Upload {
            title: "Biology",
            file_name: "bio.txt",
            content_type: MIME_TEXT,
            bytes: NOTES.as_bytes(),
        };
        let doc = ingest_document(store, &cfg, upload).await.unwrap();
        assert!(doc.is_ready());
        assert_eq!(doc.chunks.len(), 3);
        doc.id
    }

    #[tokio::test]
    async fn test_chat_grounds_answer_and_records_history() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new("It makes ATP.");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let answer = assistant
            .chat(&id, "What does the mitochondria do?")
            .await
            .unwrap();
        assert_eq!(answer.text, "It makes ATP.");
        assert_eq!(answer.relevant_chunks[0].chunk.index, 1);
        assert!(oracle.last_prompt().contains("powerhouse of the cell"));
        assert!(!oracle.last_prompt().contains("Ribosomes"));

        let history = assistant.chat_history(&id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Assistant);
        assert_eq!(history[1].relevant_chunks, vec![1]);
    }

    #[tokio::test]
    async fn test_chat_with_only_stop_words_uses_leading_chunks() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new("ok");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let answer = assistant.chat(&id, "is it the").await.unwrap();
        let indices: Vec<usize> = answer.relevant_chunks.iter().map(|c| c.chunk.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(answer.relevant_chunks.iter().all(|c| c.score.is_none()));
    }

    #[tokio::test]
    async fn test_chat_rejects_blank_question_and_unknown_document() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let oracle = ScriptedOracle::new("unused");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        assert!(matches!(
            assistant.chat("missing", "   ").await,
            Err(AssistantError::MissingInput("question"))
        ));
        assert!(matches!(
            assistant.chat("missing", "anything").await,
            Err(AssistantError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_document_is_not_ready() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let upload = Upload {
            title: "Scan",
            file_name: "scan.png",
            content_type: "image/png",
            bytes: b"\x89PNG",
        };
        let doc = ingest_document(&store, &cfg, upload).await.unwrap();
        let oracle = ScriptedOracle::new("unused");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let err = assistant.summarize(&doc.id).await.unwrap_err();
        assert!(matches!(
            err,
            AssistantError::DocumentNotReady {
                status: DocumentStatus::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_reported() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = crate::oracle::DisabledOracle;
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        assert!(matches!(
            assistant.explain_concept(&id, "ribosomes").await,
            Err(AssistantError::Upstream(_))
        ));
        assert!(assistant.chat_history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flashcards_generated_reviewed_and_starred() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new(
            "Q: What makes ATP?\nA: Mitochondria\nD: easy\n---\n\
             Q: What builds proteins?\nA: Ribosomes\nD: medium\n---\n\
             Q: Extra?\nA: Dropped\nD: hard",
        );
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let set = assistant.generate_flashcards(&id, 2).await.unwrap();
        assert_eq!(set.cards.len(), 2);
        assert_eq!(set.document_id, id);

        let card_id = set.cards[0].id.clone();
        let reviewed = assistant.review_flashcard(&set.id, &card_id).await.unwrap();
        assert_eq!(reviewed.cards[0].review_count, 1);

        assert!(assistant.toggle_star(&set.id, &card_id).await.unwrap());
        assert!(!assistant.toggle_star(&set.id, &card_id).await.unwrap());
        assert!(matches!(
            assistant.toggle_star(&set.id, "nope").await,
            Err(AssistantError::NotFound { kind: "flashcard", .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_flashcards_are_an_error() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new("Sorry, I cannot help with that.");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        assert!(matches!(
            assistant.generate_flashcards(&id, 5).await,
            Err(AssistantError::EmptyGeneration(_))
        ));
        assert!(matches!(
            assistant.generate_flashcards(&id, 0).await,
            Err(AssistantError::InvalidCount(_))
        ));
    }

    #[tokio::test]
    async fn test_quiz_generated_and_submitted_once() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new(
            "Q: What makes ATP?\nA) Ribosomes\nB) Mitochondria\nC) Chloroplasts\nD) Nucleus\n\
             C: B\nE: Mitochondria produce ATP.\nD: easy\n---\n\
             Q: What builds proteins?\nA) Ribosomes\nB) Lysosomes\nC) Vacuoles\nD) Golgi\n\
             C: A\nE: Ribosomes assemble proteins.\nD: medium",
        );
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let quiz = assistant.generate_quiz(&id, 5).await.unwrap();
        assert_eq!(quiz.total_questions(), 2);
        assert_eq!(quiz.title, "Quiz for Biology");

        let answers = vec![
            (0, "Mitochondria".to_string()),
            (1, "Lysosomes".to_string()),
        ];
        let graded = assistant.submit_quiz(&quiz.id, &answers).await.unwrap();
        assert_eq!(graded.score, Some(50));
        assert!(matches!(
            assistant.submit_quiz(&quiz.id, &answers).await,
            Err(AssistantError::Quiz(QuizError::AlreadySubmitted))
        ));
    }

    #[tokio::test]
    async fn test_explain_uses_explain_budget_in_ranked_order() {
        let store = InMemoryStore::new();
        let mut cfg = Config::minimal();
        cfg.retrieval.explain_max_chunks = 2;
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new("Energy flows through the cell.");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let answer = assistant
            .explain_concept(&id, "cell energy proteins")
            .await
            .unwrap();
        assert_eq!(answer.text, "Energy flows through the cell.");
        let indices: Vec<usize> = answer.relevant_chunks.iter().map(|c| c.chunk.index).collect();
        assert_eq!(indices, vec![0, 2]);

        let prompt = oracle.last_prompt();
        assert!(prompt.contains(
            "Photosynthesis converts light into chemical energy.\n\n\
             Ribosomes assemble proteins from amino acids."
        ));
        assert!(!prompt.contains("powerhouse"));
        assert!(assistant.chat_history(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_deletion_and_dashboard() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new(
            "Q: What makes ATP?\nA) Ribosomes\nB) Mitochondria\nC) Chloroplasts\nD) Nucleus\nC: B\n\
             ---\nQ: What makes ATP?\nA: Mitochondria",
        );
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        let set = assistant.generate_flashcards(&id, 5).await.unwrap();
        let quiz = assistant.generate_quiz(&id, 5).await.unwrap();
        assistant
            .submit_quiz(&quiz.id, &[(0, "Mitochondria".to_string())])
            .await
            .unwrap();

        assert_eq!(assistant.documents().await.unwrap().len(), 1);
        assert_eq!(assistant.flashcard_sets(&id).await.unwrap().len(), 1);
        assert_eq!(assistant.quizzes(&id).await.unwrap().len(), 1);

        let dash = assistant.dashboard().await.unwrap();
        assert_eq!(dash.totals.documents, 1);
        assert_eq!(dash.totals.flashcard_sets, 1);
        assert_eq!(dash.totals.completed_quizzes, 1);
        assert_eq!(dash.average_score, 100);

        assistant.delete_flashcard_set(&set.id).await.unwrap();
        assert!(matches!(
            assistant.delete_flashcard_set(&set.id).await,
            Err(AssistantError::NotFound { kind: "flashcard set", .. })
        ));
        assistant.delete_quiz(&quiz.id).await.unwrap();
        assert!(assistant.quizzes(&id).await.unwrap().is_empty());

        assistant.delete_document(&id).await.unwrap();
        assert!(matches!(
            assistant.delete_document(&id).await,
            Err(AssistantError::DocumentNotFound(_))
        ));
        assert_eq!(assistant.dashboard().await.unwrap().totals.documents, 0);
    }

    #[tokio::test]
    async fn test_summary_prompt_uses_extracted_text() {
        let store = InMemoryStore::new();
        let cfg = Config::minimal();
        let id = ready_doc(&store, &cfg).await;
        let oracle = ScriptedOracle::new("A short summary.");
        let assistant = StudyAssistant::new(&store, &oracle, &cfg);

        assert_eq!(assistant.summarize(&id).await.unwrap(), "A short summary.");
        assert!(oracle.last_prompt().contains("Ribosomes assemble proteins"));
    }
}
