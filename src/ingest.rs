//! Document ingestion pipeline.
//!
//! Coordinates the upload flow: size check → dedup by content hash →
//! record creation (`processing`) → text extraction → chunking → chunk
//! persistence → `ready`. Any extraction, chunking, or persistence failure
//! leaves the document `failed` with an empty chunk sequence; the failure
//! is logged, not returned, so callers inspect the document status.

use anyhow::{bail, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunk::{chunk_text, ChunkOptions};
use crate::config::Config;
use crate::extract::{extract_text, ExtractError};
use crate::models::{Chunk, Document, DocumentStatus};
use crate::store::DocumentStore;

/// An uploaded file, as handed over by the upload layer.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub title: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug, Error)]
enum ProcessingError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("chunking failed: {0}")]
    Chunk(#[from] study_harness_core::Error),
    #[error("text extraction aborted: {0}")]
    Aborted(String),
}

/// SHA-256 of the uploaded bytes, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Ingest one upload and return the stored document.
///
/// Re-uploading bytes that already produced a `ready` document returns
/// that document unchanged.
///
/// # Errors
///
/// Only for uploads rejected before a record exists (empty or oversized
/// files) and for store failures while creating or failing the record.
pub async fn ingest_document<S>(store: &S, config: &Config, upload: Upload<'_>) -> Result<Document>
where
    S: DocumentStore + ?Sized,
{
    if upload.bytes.is_empty() {
        bail!("Document cannot be empty: {}", upload.file_name);
    }
    let size = upload.bytes.len() as u64;
    if size > config.ingest.max_file_bytes {
        bail!(
            "{} is {} bytes, above the {} byte limit",
            upload.file_name,
            size,
            config.ingest.max_file_bytes
        );
    }

    let hash = content_hash(upload.bytes);
    if let Some(existing) = store.find_by_hash(&hash).await? {
        if existing.is_ready() {
            info!(document_id = %existing.id, "duplicate upload, reusing document");
            return Ok(existing);
        }
    }

    let now = Utc::now();
    let doc = Document {
        id: Uuid::new_v4().to_string(),
        title: upload.title.to_string(),
        file_name: upload.file_name.to_string(),
        file_size: size,
        content_hash: hash,
        extracted_text: String::new(),
        chunks: Vec::new(),
        status: DocumentStatus::Processing,
        uploaded_at: now,
        last_accessed: now,
    };
    store.insert_document(&doc).await?;
    info!(document_id = %doc.id, file = upload.file_name, bytes = size, "document processing");

    let bytes = upload.bytes.to_vec();
    let content_type = upload.content_type.to_string();
    let options = config.chunking.options();
    let processed = run_blocking(move || process(&bytes, &content_type, &options)).await;

    let outcome = match processed {
        Ok((text, chunks)) => {
            debug!(document_id = %doc.id, chars = text.len(), chunks = chunks.len(), "chunked");
            persist(store, &doc.id, &text, &chunks).await
        }
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(()) => info!(document_id = %doc.id, "document ready"),
        Err(e) => {
            warn!(document_id = %doc.id, error = %format!("{:#}", e), "document failed");
            store.replace_chunks(&doc.id, "", &[]).await?;
            store.set_status(&doc.id, DocumentStatus::Failed).await?;
        }
    }

    store
        .get_document(&doc.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Document vanished during ingestion: {}", doc.id))
}

type Processed = (String, Vec<Chunk>);

fn process(
    bytes: &[u8],
    content_type: &str,
    options: &ChunkOptions,
) -> Result<Processed, ProcessingError> {
    let text = extract_text(bytes, content_type)?;
    let chunks = chunk_text(&text, options)?;
    Ok((text, chunks))
}

/// Run CPU-bound processing off the async workers. A panic inside the
/// PDF parser surfaces as [`ProcessingError::Aborted`].
async fn run_blocking<F>(f: F) -> Result<Processed, ProcessingError>
where
    F: FnOnce() -> Result<Processed, ProcessingError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(ProcessingError::Aborted(e.to_string())),
    }
}

/// Chunks first, status second: a document is only `ready` once its
/// chunks are stored.
async fn persist<S>(store: &S, id: &str, text: &str, chunks: &[Chunk]) -> Result<()>
where
    S: DocumentStore + ?Sized,
{
    store.replace_chunks(id, text, chunks).await?;
    store.set_status(id, DocumentStatus::Ready).await?;
    Ok(())
}
