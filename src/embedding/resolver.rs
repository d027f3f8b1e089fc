//! Cache-checked embedding resolution.
//!
//! The resolver sits between the ranking pass and the external embedding
//! engine. It owns the two resolution policies:
//!
//! - **Papers** are looked up in the shared embedding cache first, keyed by
//!   paper identifier; only a miss (or a record produced by a different
//!   model) costs an engine call, and the fresh vector is written back.
//! - **Interests** are resolved once per pass, deduplicated
//!   case-insensitively by display name; an interest's own cached vector is
//!   trusted when present.
//!
//! Every engine call runs under a timeout, and any failure degrades to "no
//! signal" for that one item. The resolver holds no mutable state of its
//! own, so one instance can serve any number of concurrent passes.

use std::time::Duration;

use tracing::{debug, warn};

use super::{
    normalize_text, EmbeddingError, EmbeddingProvider, EmbeddingResult, DEFAULT_EMBED_TIMEOUT,
};
use crate::models::{EmbeddingRecord, Interest, Paper};
use crate::storage::EmbeddingCache;

/// An interest that resolved to a vector, in interest-list order.
#[derive(Debug, Clone)]
pub struct ResolvedInterest {
    /// Display name of the interest (as the user wrote it)
    pub name: String,

    /// Its embedding
    pub vector: Vec<f32>,
}

/// Embedding resolution over an optional engine and a shared cache.
///
/// The provider is optional: when absent (engine not downloaded or not
/// ready) the ranking pass falls back to its unranked output instead of
/// blocking.
pub struct EmbeddingResolver<P, C>
where
    P: EmbeddingProvider,
    C: EmbeddingCache,
{
    provider: Option<P>,
    cache: C,
    timeout: Duration,
}

impl<P, C> EmbeddingResolver<P, C>
where
    P: EmbeddingProvider,
    C: EmbeddingCache,
{
    /// Create a resolver with the default per-call timeout.
    pub fn new(provider: Option<P>, cache: C) -> Self {
        Self {
            provider,
            cache,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether an embedding engine is configured and usable.
    pub fn is_ready(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the active model, if an engine is configured.
    pub fn model_name(&self) -> Option<&str> {
        self.provider.as_ref().map(EmbeddingProvider::model_name)
    }

    /// Run one engine call under the timeout.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| EmbeddingError::Unavailable("no engine configured".to_string()))?;

        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "text is empty after normalization".to_string(),
            ));
        }

        match tokio::time::timeout(self.timeout, provider.embed(&normalized)).await {
            Ok(result) => result,
            Err(_) => Err(EmbeddingError::Timeout(self.timeout)),
        }
    }

    /// Resolve a paper's embedding, consulting the cache first.
    ///
    /// Resolution order: the vector already attached to the paper, then a
    /// cache record whose model tag matches the active engine, then one
    /// engine call whose result is written back to the cache. A record
    /// written under a different model name is treated as a miss so stale
    /// vectors are never compared against fresh ones.
    ///
    /// # Errors
    /// Returns `EmbeddingError` when no vector can be produced for this
    /// paper; callers treat that as zero signal for the paper, not as a
    /// batch failure.
    pub async fn paper_vector(&self, paper: &Paper) -> EmbeddingResult<Vec<f32>> {
        if let Some(vector) = &paper.embedding {
            return Ok(vector.clone());
        }

        match self.cache.get(&paper.id).await {
            Ok(Some(record)) => {
                let tag_ok = match self.model_name() {
                    Some(model) => record.model == model,
                    // No engine to compare against; trust the cache.
                    None => true,
                };
                if tag_ok {
                    debug!(paper_id = %paper.id, "embedding cache hit");
                    return Ok(record.vector);
                }
                debug!(
                    paper_id = %paper.id,
                    cached_model = %record.model,
                    "embedding cache record from different model, recomputing"
                );
            }
            Ok(None) => {}
            Err(err) => {
                warn!(paper_id = %paper.id, %err, "embedding cache read failed, treating as miss");
            }
        }

        let vector = self.embed(&paper.embedding_text()).await?;

        if let Some(model) = self.model_name() {
            let record = EmbeddingRecord::new(paper.id.clone(), vector.clone(), model);
            if let Err(err) = self.cache.put(record).await {
                // A failed cache write costs a recompute later, nothing more.
                warn!(paper_id = %paper.id, %err, "embedding cache write failed");
            }
        }

        Ok(vector)
    }

    /// Resolve every distinct interest to a vector, once per pass.
    ///
    /// Interests are deduplicated case-insensitively by display name (first
    /// occurrence wins, input order preserved). An interest that fails to
    /// resolve is dropped from the result; the pass continues with the
    /// rest.
    pub async fn interest_vectors(&self, interests: &[Interest]) -> Vec<ResolvedInterest> {
        let mut seen: Vec<String> = Vec::new();
        let mut resolved = Vec::new();

        for interest in interests {
            let key = normalize_text(&interest.name);
            if key.is_empty() || seen.iter().any(|s| s == &key) {
                continue;
            }
            seen.push(key);

            let vector = match &interest.embedding {
                Some(vector) => Ok(vector.clone()),
                None => self.embed(&interest.name).await,
            };

            match vector {
                Ok(vector) => resolved.push(ResolvedInterest {
                    name: interest.name.clone(),
                    vector,
                }),
                Err(err) => {
                    warn!(interest = %interest.name, %err, "interest embedding failed, skipping");
                }
            }
        }

        resolved
    }
}
