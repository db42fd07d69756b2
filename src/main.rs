//! # Study Harness CLI (`study`)
//!
//! Chunk a study document, rank its chunks against a query, or ask the
//! configured oracle about it.
//!
//! ## Usage
//!
//! ```bash
//! study --config ./config/study.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `study chunk <file>` | Print the document's chunks |
//! | `study search <file> "<query>"` | Rank chunks against a query |
//! | `study ask <file> "<question>"` | Answer a question from the document |
//! | `study explain <file> "<concept>"` | Explain a concept using the document |
//! | `study summarize <file>` | Summarize the document |
//! | `study flashcards <file>` | Generate flashcards |
//! | `study quiz <file>` | Generate a multiple-choice quiz |
//!
//! Commands that call the oracle need `[oracle]` configured and
//! `GEMINI_API_KEY` set.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use study_harness::chunk::ChunkOptions;
use study_harness::config::{self, Config};
use study_harness::{commands, logging};

/// Study Harness CLI: chunk, search, and study documents with a
/// generative assistant.
#[derive(Parser)]
#[command(
    name = "study",
    about = "Study Harness: chunk, search, and study documents with a generative assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/study.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/study.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Split a document into chunks and print them.
    Chunk {
        /// PDF, plain-text, or Markdown file.
        file: PathBuf,

        /// Words per chunk (overrides `[chunking].chunk_size`).
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Words carried into the next chunk (overrides `[chunking].overlap`).
        #[arg(long)]
        overlap: Option<usize>,

        /// Print chunks as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank a document's chunks against a query.
    Search {
        file: PathBuf,

        query: String,

        /// Maximum number of chunks to return.
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long)]
        overlap: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Answer a question grounded on the document.
    Ask { file: PathBuf, question: String },

    /// Explain a concept using the document as context.
    Explain { file: PathBuf, concept: String },

    /// Summarize the document.
    Summarize { file: PathBuf },

    /// Generate flashcards from the document.
    Flashcards {
        file: PathBuf,

        #[arg(long, default_value_t = 10)]
        count: usize,

        #[arg(long)]
        json: bool,
    },

    /// Generate a multiple-choice quiz from the document.
    Quiz {
        file: PathBuf,

        #[arg(long, default_value_t = 5)]
        questions: usize,

        #[arg(long)]
        json: bool,
    },
}

fn load_or_default(path: &std::path::Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

/// Apply command-line chunking overrides and re-check them.
fn with_chunking(mut cfg: Config, chunk_size: Option<usize>, overlap: Option<usize>) -> Result<Config> {
    if let Some(size) = chunk_size {
        cfg.chunking.chunk_size = size;
    }
    if let Some(overlap) = overlap {
        cfg.chunking.overlap = overlap;
    }
    ChunkOptions::new(cfg.chunking.chunk_size, cfg.chunking.overlap)?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Chunk {
            file,
            chunk_size,
            overlap,
            json,
        } => {
            let cfg = with_chunking(cfg, chunk_size, overlap)?;
            commands::run_chunk(&cfg, &file, json).await?;
        }
        Commands::Search {
            file,
            query,
            limit,
            chunk_size,
            overlap,
            json,
        } => {
            let cfg = with_chunking(cfg, chunk_size, overlap)?;
            commands::run_search(&cfg, &file, &query, limit, json).await?;
        }
        Commands::Ask { file, question } => {
            commands::run_ask(&cfg, &file, &question).await?;
        }
        Commands::Explain { file, concept } => {
            commands::run_explain(&cfg, &file, &concept).await?;
        }
        Commands::Summarize { file } => {
            commands::run_summarize(&cfg, &file).await?;
        }
        Commands::Flashcards { file, count, json } => {
            commands::run_flashcards(&cfg, &file, count, json).await?;
        }
        Commands::Quiz {
            file,
            questions,
            json,
        } => {
            commands::run_quiz(&cfg, &file, questions, json).await?;
        }
    }

    Ok(())
}
