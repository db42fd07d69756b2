//! Storage abstraction for documents, generated study material, and chat.
//!
//! The [`DocumentStore`] trait covers every persistence operation the
//! ingestion and assistant pipelines need, so the backing store can be
//! swapped without touching them. [`InMemoryStore`] is the bundled
//! implementation used by the CLI and the tests.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`insert_document`](DocumentStore::insert_document) | Create a document record |
//! | [`get_document`](DocumentStore::get_document) | Fetch a document with its chunks |
//! | [`find_by_hash`](DocumentStore::find_by_hash) | Look up a previous upload of the same bytes |
//! | [`replace_chunks`](DocumentStore::replace_chunks) | Swap in extracted text and a whole chunk sequence |
//! | [`set_status`](DocumentStore::set_status) | Move a document through its lifecycle |
//! | [`save_flashcard_set`](DocumentStore::save_flashcard_set) | Insert or update a flashcard set |
//! | [`save_quiz`](DocumentStore::save_quiz) | Insert or update a quiz |
//! | [`delete_flashcard_set`](DocumentStore::delete_flashcard_set) / [`delete_quiz`](DocumentStore::delete_quiz) | Remove generated material |
//! | [`append_chat`](DocumentStore::append_chat) | Append turns to a document's chat history |

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ChatMessage, Chunk, Document, DocumentStatus};
use study_harness_core::flashcards::FlashcardSet;
use study_harness_core::quiz::Quiz;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, doc: &Document) -> Result<()>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// A document uploaded with the same bytes, preferring a `ready` one.
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>>;

    /// All documents, most recently accessed first.
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Replace the extracted text and the entire chunk sequence at once.
    async fn replace_chunks(&self, id: &str, extracted_text: &str, chunks: &[Chunk]) -> Result<()>;

    async fn set_status(&self, id: &str, status: DocumentStatus) -> Result<()>;

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Delete a document and everything generated from it.
    async fn delete_document(&self, id: &str) -> Result<bool>;

    async fn save_flashcard_set(&self, set: &FlashcardSet) -> Result<()>;

    async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSet>>;

    async fn flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>>;

    async fn delete_flashcard_set(&self, id: &str) -> Result<bool>;

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()>;

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>>;

    async fn quizzes(&self, document_id: &str) -> Result<Vec<Quiz>>;

    async fn delete_quiz(&self, id: &str) -> Result<bool>;

    async fn append_chat(&self, document_id: &str, messages: &[ChatMessage]) -> Result<()>;

    async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatMessage>>;
}

/// In-memory store backed by `HashMap`s behind `RwLock`s.
#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    flashcards: RwLock<HashMap<String, FlashcardSet>>,
    quizzes: RwLock<HashMap<String, Quiz>>,
    chats: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| anyhow::anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        let mut docs = write(&self.docs)?;
        if docs.contains_key(&doc.id) {
            bail!("Document already exists: {}", doc.id);
        }
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(read(&self.docs)?.get(id).cloned())
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let docs = read(&self.docs)?;
        let mut matches = docs.values().filter(|d| d.content_hash == content_hash);
        let ready = matches.clone().find(|d| d.is_ready());
        Ok(ready.or_else(|| matches.next()).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = read(&self.docs)?.values().cloned().collect();
        docs.sort_by(|a, b| {
            b.last_accessed
                .cmp(&a.last_accessed)
                .then(a.id.cmp(&b.id))
        });
        Ok(docs)
    }

    async fn replace_chunks(&self, id: &str, extracted_text: &str, chunks: &[Chunk]) -> Result<()> {
        let mut docs = write(&self.docs)?;
        let doc = match docs.get_mut(id) {
            Some(doc) => doc,
            None => bail!("Document not found: {}", id),
        };
        doc.extracted_text = extracted_text.to_string();
        doc.chunks = chunks.to_vec();
        Ok(())
    }

    async fn set_status(&self, id: &str, status: DocumentStatus) -> Result<()> {
        let mut docs = write(&self.docs)?;
        match docs.get_mut(id) {
            Some(doc) => {
                doc.status = status;
                Ok(())
            }
            None => bail!("Document not found: {}", id),
        }
    }

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut docs = write(&self.docs)?;
        match docs.get_mut(id) {
            Some(doc) => {
                doc.last_accessed = at;
                Ok(())
            }
            None => bail!("Document not found: {}", id),
        }
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let removed = write(&self.docs)?.remove(id).is_some();
        if removed {
            write(&self.flashcards)?.retain(|_, s| s.document_id != id);
            write(&self.quizzes)?.retain(|_, q| q.document_id != id);
            write(&self.chats)?.remove(id);
        }
        Ok(removed)
    }

    async fn save_flashcard_set(&self, set: &FlashcardSet) -> Result<()> {
        write(&self.flashcards)?.insert(set.id.clone(), set.clone());
        Ok(())
    }

    async fn get_flashcard_set(&self, id: &str) -> Result<Option<FlashcardSet>> {
        Ok(read(&self.flashcards)?.get(id).cloned())
    }

    async fn flashcard_sets(&self, document_id: &str) -> Result<Vec<FlashcardSet>> {
        let mut sets: Vec<FlashcardSet> = read(&self.flashcards)?
            .values()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(sets)
    }

    async fn delete_flashcard_set(&self, id: &str) -> Result<bool> {
        Ok(write(&self.flashcards)?.remove(id).is_some())
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        write(&self.quizzes)?.insert(quiz.id.clone(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: &str) -> Result<Option<Quiz>> {
        Ok(read(&self.quizzes)?.get(id).cloned())
    }

    async fn quizzes(&self, document_id: &str) -> Result<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = read(&self.quizzes)?
            .values()
            .filter(|q| q.document_id == document_id)
            .cloned()
            .collect();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: &str) -> Result<bool> {
        Ok(write(&self.quizzes)?.remove(id).is_some())
    }

    async fn append_chat(&self, document_id: &str, messages: &[ChatMessage]) -> Result<()> {
        write(&self.chats)?
            .entry(document_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn chat_history(&self, document_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(read(&self.chats)?
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }
}
