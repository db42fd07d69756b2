//! # Study Harness
//!
//! Turns uploaded study documents into retrieval-ready chunks and
//! grounds a generative assistant on them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌─────────┐
//! │  Upload  │──▶│ Extract + Chunk  │──▶│  Store  │
//! │ PDF/text │   │  (word windows)  │   │         │
//! └──────────┘   └──────────────────┘   └────┬────┘
//!                                            │
//!                    ┌───────────────────────┤
//!                    ▼                       ▼
//!             ┌────────────┐          ┌────────────┐
//!             │ Relevance  │─────────▶│   Oracle   │
//!             │  ranking   │ context  │  (Gemini)  │
//!             └────────────┘          └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! study chunk notes.pdf --json
//! study search notes.pdf "mitochondria energy"
//! study ask notes.pdf "What does the mitochondria do?"
//! study flashcards notes.pdf --count 10
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Text chunking |
//! | [`relevance`] | Lexical chunk ranking |
//! | [`extract`] | PDF and plain-text extraction |
//! | [`ingest`] | Upload → ready document pipeline |
//! | [`store`] | Storage abstraction and in-memory store |
//! | [`oracle`] | Generative-text backend abstraction |
//! | [`assistant`] | Chat, explanations, summaries, flashcards, quizzes |
//! | [`progress`] | Study progress dashboard |
//! | [`commands`] | CLI command handlers |
//! | [`logging`] | Tracing subscriber setup |

pub mod assistant;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod progress;
pub mod relevance;
pub mod store;
