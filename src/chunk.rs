//! Paragraph-aware word-window chunker, re-exported from `study-harness-core`.
//!
//! # Example
//!
//! ```rust
//! use study_harness::chunk::{chunk_text, ChunkOptions};
//!
//! let chunks = chunk_text("Hello world.\n\nSecond paragraph.", &ChunkOptions::default()).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].index, 0);
//! ```

pub use study_harness_core::chunk::*;
