//! Error type shared by the core algorithms.
//!
//! Empty input is never an error here: empty text chunks to nothing and an
//! empty query ranks to nothing. Errors signal contract violations by the
//! caller and are returned immediately, with no partial result.

use thiserror::Error;

/// Failure raised by the chunker or the relevance ranker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Chunking parameters that would stall or never terminate.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A chunk record without usable content was handed to the ranker.
    #[error("invalid chunk at index {index}: content is empty")]
    InvalidChunk { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
