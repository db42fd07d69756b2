//! TOML configuration parsing and validation.
//!
//! ```toml
//! [chunking]
//! chunk_size = 500
//! overlap = 50
//!
//! [retrieval]
//! chat_max_chunks = 3
//! explain_max_chunks = 10
//!
//! [oracle]
//! provider = "gemini"
//! model = "gemini-2.5-flash-lite"
//!
//! [ingest]
//! max_file_bytes = 10485760
//! ```
//!
//! Every section is optional; missing values fall back to the defaults
//! above. [`load_config`] rejects values the pipeline cannot run with.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use study_harness_core::chunk::{ChunkOptions, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use study_harness_core::prompts::DEFAULT_MAX_INPUT_CHARS;
use study_harness_core::relevance::DEFAULT_MAX_CHUNKS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn options(&self) -> ChunkOptions {
        ChunkOptions {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_chat_max_chunks")]
    pub chat_max_chunks: usize,
    #[serde(default = "default_explain_max_chunks")]
    pub explain_max_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chat_max_chunks: DEFAULT_MAX_CHUNKS,
            explain_max_chunks: 10,
        }
    }
}

fn default_chat_max_chunks() -> usize {
    DEFAULT_MAX_CHUNKS
}
fn default_explain_max_chunks() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Character budget for whole-document prompts (summary, flashcards, quiz).
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_retries: 3,
            timeout_secs: 60,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl OracleConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Config {
    /// Defaults for every section, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Parse and validate a config from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse, and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    config
        .chunking
        .options()
        .validate()
        .with_context(|| "Invalid [chunking] section")?;

    // Validate retrieval
    if config.retrieval.chat_max_chunks < 1 {
        anyhow::bail!("retrieval.chat_max_chunks must be >= 1");
    }
    if config.retrieval.explain_max_chunks < 1 {
        anyhow::bail!("retrieval.explain_max_chunks must be >= 1");
    }

    // Validate oracle
    match config.oracle.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown oracle provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }
    if config.oracle.is_enabled() && config.oracle.model.is_none() {
        anyhow::bail!(
            "oracle.model must be specified when provider is '{}'",
            config.oracle.provider
        );
    }
    if config.oracle.max_input_chars == 0 {
        anyhow::bail!("oracle.max_input_chars must be > 0");
    }

    if config.ingest.max_file_bytes == 0 {
        anyhow::bail!("ingest.max_file_bytes must be > 0");
    }

    Ok(())
}
