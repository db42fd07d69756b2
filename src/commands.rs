//! Command handlers for the `study` binary.
//!
//! Each handler ingests one local file into a fresh [`InMemoryStore`],
//! then runs a single operation against it. Results go to stdout; logs
//! go to stderr.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::assistant::StudyAssistant;
use crate::config::Config;
use crate::extract::content_type_for_path;
use crate::ingest::{ingest_document, Upload};
use crate::models::{Document, DocumentStatus, ScoredChunk};
use crate::oracle::create_oracle;
use crate::relevance::find_relevant_chunks;
use crate::store::InMemoryStore;

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Read `path` and ingest it, failing if processing did not finish.
async fn load_document(config: &Config, store: &InMemoryStore, path: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let title = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    let doc = ingest_document(
        store,
        config,
        Upload {
            title,
            file_name,
            content_type: content_type_for_path(path),
            bytes: &bytes,
        },
    )
    .await?;

    if doc.status != DocumentStatus::Ready {
        bail!("Failed to process {} (status: {})", path.display(), doc.status);
    }
    Ok(doc)
}

pub async fn run_chunk(config: &Config, path: &Path, json: bool) -> Result<()> {
    let store = InMemoryStore::new();
    let doc = load_document(config, &store, path).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&doc.chunks)?);
        return Ok(());
    }

    if doc.chunks.is_empty() {
        println!("No chunks.");
        return Ok(());
    }
    for chunk in &doc.chunks {
        println!("--- chunk {} ({} words) ---", chunk.index, chunk.word_count());
        println!("{}", chunk.content);
        println!();
    }
    Ok(())
}

pub async fn run_search(
    config: &Config,
    path: &Path,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let store = InMemoryStore::new();
    let doc = load_document(config, &store, path).await?;
    let limit = limit.unwrap_or(config.retrieval.chat_max_chunks);
    let results = find_relevant_chunks(&doc.chunks, query, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result);
    }
    Ok(())
}

fn print_result(rank: usize, result: &ScoredChunk) {
    match result.score {
        Some(score) => println!(
            "{}. [{:.3}] chunk {} ({} matched)",
            rank,
            score,
            result.chunk.index,
            result.matched_words.unwrap_or(0)
        ),
        None => println!("{}. chunk {}", rank, result.chunk.index),
    }
    println!("    {}", snippet(&result.chunk.content, 200));
    println!();
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &flat[..idx]),
        None => flat,
    }
}

pub async fn run_ask(config: &Config, path: &Path, question: &str) -> Result<()> {
    let store = InMemoryStore::new();
    let oracle = create_oracle(&config.oracle)?;
    let doc = load_document(config, &store, path).await?;
    let assistant = StudyAssistant::new(&store, oracle.as_ref(), config);

    let answer = assistant.chat(&doc.id, question).await?;
    println!("{}", answer.text.trim());
    print_sources(&answer.relevant_chunks);
    Ok(())
}

pub async fn run_explain(config: &Config, path: &Path, concept: &str) -> Result<()> {
    let store = InMemoryStore::new();
    let oracle = create_oracle(&config.oracle)?;
    let doc = load_document(config, &store, path).await?;
    let assistant = StudyAssistant::new(&store, oracle.as_ref(), config);

    let answer = assistant.explain_concept(&doc.id, concept).await?;
    println!("{}", answer.text.trim());
    print_sources(&answer.relevant_chunks);
    Ok(())
}

fn print_sources(chunks: &[ScoredChunk]) {
    if chunks.is_empty() {
        return;
    }
    let indices: Vec<String> = chunks.iter().map(|c| c.chunk.index.to_string()).collect();
    println!();
    println!("sources: chunks {}", indices.join(", "));
}

pub async fn run_summarize(config: &Config, path: &Path) -> Result<()> {
    let store = InMemoryStore::new();
    let oracle = create_oracle(&config.oracle)?;
    let doc = load_document(config, &store, path).await?;
    let assistant = StudyAssistant::new(&store, oracle.as_ref(), config);

    println!("{}", assistant.summarize(&doc.id).await?.trim());
    Ok(())
}

pub async fn run_flashcards(config: &Config, path: &Path, count: usize, json: bool) -> Result<()> {
    let store = InMemoryStore::new();
    let oracle = create_oracle(&config.oracle)?;
    let doc = load_document(config, &store, path).await?;
    let assistant = StudyAssistant::new(&store, oracle.as_ref(), config);

    let set = assistant.generate_flashcards(&doc.id, count).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }
    for (i, card) in set.cards.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, card.difficulty, card.question);
        println!("    {}", card.answer);
        println!();
    }
    Ok(())
}

pub async fn run_quiz(config: &Config, path: &Path, num_questions: usize, json: bool) -> Result<()> {
    let store = InMemoryStore::new();
    let oracle = create_oracle(&config.oracle)?;
    let doc = load_document(config, &store, path).await?;
    let assistant = StudyAssistant::new(&store, oracle.as_ref(), config);

    let quiz = assistant.generate_quiz(&doc.id, num_questions).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
        return Ok(());
    }
    println!("{}", quiz.title);
    println!();
    for (i, q) in quiz.questions.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, q.difficulty, q.question);
        for (label, option) in OPTION_LABELS.iter().zip(&q.options) {
            println!("    {}) {}", label, option);
        }
        println!("    answer: {}", q.correct_answer);
        if !q.explanation.is_empty() {
            println!("    why: {}", q.explanation);
        }
        println!();
    }
    Ok(())
}
