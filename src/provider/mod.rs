//! Paper catalogue providers.
//!
//! The [`PaperProvider`] trait is the crate's contract with the external
//! paper catalogue (the arXiv search API in the real application). The
//! HTTP/XML client itself is an external collaborator; this crate only
//! consumes its results. The [`json`] submodule provides a local snapshot
//! implementation used offline and in the CLI.

pub mod json;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Paper;

/// Errors that can occur when fetching papers from a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure; callers fall back to the last cached snapshot
    #[error("network error: {0}")]
    Network(String),

    /// The source returned data that could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Failed to read a local data source
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Sort order for catalogue queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Source relevance ranking
    #[default]
    Relevance,
    /// Most recently updated first
    LastUpdated,
    /// Most recently submitted first
    Submitted,
}

/// Options for a catalogue query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Maximum number of papers to return
    pub limit: usize,

    /// Offset into the result set, for paging
    pub start: usize,

    /// Requested ordering
    pub sort: SortOrder,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: 30,
            start: 0,
            sort: SortOrder::default(),
        }
    }
}

/// Trait for sourcing paper metadata from a catalogue.
///
/// Implementations handle their own transport, pagination, and rate
/// limiting. Returned papers carry no embeddings; those are attached
/// lazily by the resolver.
#[async_trait]
pub trait PaperProvider: Send + Sync {
    /// Fetch papers matching a free-text query.
    ///
    /// # Errors
    /// Returns [`ProviderError::Network`] when the source is unreachable;
    /// callers recover from their cached snapshot.
    async fn fetch_by_query(&self, query: &str, options: &FetchOptions)
        -> ProviderResult<Vec<Paper>>;

    /// Fetch recent papers in the given category tags.
    ///
    /// # Errors
    /// Same failure modes as [`fetch_by_query`](Self::fetch_by_query).
    async fn fetch_by_categories(
        &self,
        categories: &[String],
        limit: usize,
    ) -> ProviderResult<Vec<Paper>>;

    /// Human-readable provider name, for logging.
    fn name(&self) -> &str;
}
