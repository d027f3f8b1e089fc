//! Persistence contracts and implementations.
//!
//! This module defines the capabilities the rest of the crate persists
//! through: the embedding cache (one record per paper identifier) and the
//! library store (papers, interests, feed snapshot, chat transcripts,
//! notes). The abstraction keeps the ranking core ignorant of how the data
//! is stored; the [`json`] submodule provides the plain-JSON-file backend
//! the application uses.

pub mod json;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChatTranscript, EmbeddingRecord, Interest, Note, Paper};

/// Errors that can occur during storage operations.
///
/// Readers never see a "corrupt file" error: a missing or unreadable value
/// yields the default for its type. These variants surface on the write
/// path only.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared key-value cache of paper embeddings.
///
/// Keyed by paper identifier; at most one record per key. Writers follow
/// last-write-wins semantics and each key is independent, so concurrent
/// ranking passes need no coordination beyond the store's own per-key
/// atomicity.
#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    /// Look up the cached record for a paper, if one exists.
    async fn get(&self, paper_id: &str) -> StorageResult<Option<EmbeddingRecord>>;

    /// Insert or overwrite the record for `record.paper_id`.
    async fn put(&self, record: EmbeddingRecord) -> StorageResult<()>;
}

#[async_trait]
impl<T: EmbeddingCache + ?Sized> EmbeddingCache for std::sync::Arc<T> {
    async fn get(&self, paper_id: &str) -> StorageResult<Option<EmbeddingRecord>> {
        (**self).get(paper_id).await
    }

    async fn put(&self, record: EmbeddingRecord) -> StorageResult<()> {
        (**self).put(record).await
    }
}

/// Typed get/set store for the application's persisted lists.
///
/// Every load supplies a default for missing data; there is no schema
/// migration. Saves replace the whole value for a key.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Papers the user saved to their library.
    async fn load_library(&self) -> StorageResult<Vec<Paper>>;

    /// Replace the saved library.
    async fn save_library(&self, papers: &[Paper]) -> StorageResult<()>;

    /// The user's declared interests.
    async fn load_interests(&self) -> StorageResult<Vec<Interest>>;

    /// Replace the interest list.
    async fn save_interests(&self, interests: &[Interest]) -> StorageResult<()>;

    /// Last successfully fetched feed, kept as the offline fallback.
    async fn load_feed_snapshot(&self) -> StorageResult<Vec<Paper>>;

    /// Replace the feed snapshot.
    async fn save_feed_snapshot(&self, papers: &[Paper]) -> StorageResult<()>;

    /// Chat transcript for one paper, if any.
    async fn load_transcript(&self, paper_id: &str) -> StorageResult<Option<ChatTranscript>>;

    /// Insert or overwrite the transcript for its paper.
    async fn save_transcript(&self, transcript: &ChatTranscript) -> StorageResult<()>;

    /// All user notes.
    async fn load_notes(&self) -> StorageResult<Vec<Note>>;

    /// Replace the notes list.
    async fn save_notes(&self, notes: &[Note]) -> StorageResult<()>;
}

#[async_trait]
impl<T: LibraryStore + ?Sized> LibraryStore for std::sync::Arc<T> {
    async fn load_library(&self) -> StorageResult<Vec<Paper>> {
        (**self).load_library().await
    }

    async fn save_library(&self, papers: &[Paper]) -> StorageResult<()> {
        (**self).save_library(papers).await
    }

    async fn load_interests(&self) -> StorageResult<Vec<Interest>> {
        (**self).load_interests().await
    }

    async fn save_interests(&self, interests: &[Interest]) -> StorageResult<()> {
        (**self).save_interests(interests).await
    }

    async fn load_feed_snapshot(&self) -> StorageResult<Vec<Paper>> {
        (**self).load_feed_snapshot().await
    }

    async fn save_feed_snapshot(&self, papers: &[Paper]) -> StorageResult<()> {
        (**self).save_feed_snapshot(papers).await
    }

    async fn load_transcript(&self, paper_id: &str) -> StorageResult<Option<ChatTranscript>> {
        (**self).load_transcript(paper_id).await
    }

    async fn save_transcript(&self, transcript: &ChatTranscript) -> StorageResult<()> {
        (**self).save_transcript(transcript).await
    }

    async fn load_notes(&self) -> StorageResult<Vec<Note>> {
        (**self).load_notes().await
    }

    async fn save_notes(&self, notes: &[Note]) -> StorageResult<()> {
        (**self).save_notes(notes).await
    }
}
