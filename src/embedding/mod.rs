//! Embedding engine abstraction and embedding resolution.
//!
//! The on-device embedding engine is an external collaborator: the crate
//! only talks to it through the [`EmbeddingProvider`] trait. The
//! [`resolver`] submodule layers the cache-checked, failure-isolating
//! resolution policy on top of whatever provider is configured.
//!
//! The abstraction allows swapping engines (local fastembed model, a remote
//! service, a test mock) without touching the ranking logic.

pub mod resolver;

#[cfg(feature = "local-embeddings")]
pub mod fastembed;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Per-call budget for a single embedding request.
///
/// The external engine may hang; a ranking pass must not block on it.
/// Calls that exceed this are treated as [`EmbeddingError::Timeout`], which
/// the resolver degrades to "no signal" for that item.
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The engine is not downloaded, not ready, or errored on this call
    #[error("embedding engine unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded its time budget
    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid input text (e.g. empty after normalization)
    #[error("invalid input text: {0}")]
    InvalidInput(String),
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Trait for text embedding engines.
///
/// Implementors generate fixed-length vector representations of text. The
/// trait is async because real engines run inference off-thread or over a
/// process boundary. `embed` must be idempotent for identical text within
/// one model version; bit-exactness across versions is not guaranteed.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    ///
    /// # Errors
    /// Returns `EmbeddingError` if the engine is unavailable or the input
    /// is rejected.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for several texts in one call.
    ///
    /// The default implementation loops over [`embed`](Self::embed);
    /// engines with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimension of the vectors this engine produces.
    fn dimension(&self) -> usize;

    /// Identifier of the underlying model.
    ///
    /// Embedding records are tagged with this name so that vectors from
    /// different models are never compared against each other.
    fn model_name(&self) -> &str;
}

/// Normalize text for consistent embedding generation.
///
/// Lowercases, trims, and collapses runs of whitespace. Applied to paper
/// text and interest names alike so that cache keys and engine inputs are
/// stable across cosmetic differences.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
