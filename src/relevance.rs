//! Lexical chunk ranking, re-exported from `study-harness-core`.
//!
//! # Example
//!
//! ```rust
//! use study_harness::models::Chunk;
//! use study_harness::relevance::find_relevant_chunks;
//!
//! let chunks = vec![
//!     Chunk::new(0, "Photosynthesis converts light."),
//!     Chunk::new(1, "Mitochondria produce ATP."),
//! ];
//! let ranked = find_relevant_chunks(&chunks, "mitochondria", 3).unwrap();
//! assert_eq!(ranked[0].chunk.index, 1);
//! ```

pub use study_harness_core::relevance::*;
