//! Local on-device embedding engine backed by fastembed.
//!
//! This is the crate's stand-in for the application's bundled model
//! runtime: embeddings are computed locally with no network dependency
//! after the model files are downloaded. Enabled by the
//! `local-embeddings` feature.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};

/// Embedding provider running a local fastembed model.
#[derive(Clone)]
pub struct FastEmbedProvider {
    // fastembed's inference call needs exclusive access to the session.
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Initialize a provider for the given model.
    ///
    /// Defaults to `AllMiniLML6V2` (384 dimensions). `cache_dir` controls
    /// where model files are downloaded and reused.
    ///
    /// # Errors
    /// Returns [`EmbeddingError::Unavailable`] if the model cannot be
    /// initialized (missing files, unsupported platform).
    pub fn new(model: Option<EmbeddingModel>, cache_dir: Option<PathBuf>) -> EmbeddingResult<Self> {
        let model_type = model.unwrap_or(EmbeddingModel::AllMiniLML6V2);
        let model_name = format!("{model_type:?}");

        let dimension = match model_type {
            EmbeddingModel::AllMiniLML6V2 | EmbeddingModel::BGESmallENV15 => 384,
            EmbeddingModel::BGEBaseENV15
            | EmbeddingModel::NomicEmbedTextV1
            | EmbeddingModel::NomicEmbedTextV15 => 768,
            EmbeddingModel::BGELargeENV15 => 1024,
            _ => 384,
        };

        let mut options = InitOptions::new(model_type);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let engine = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Unavailable(format!("model init failed: {e}")))?;

        Ok(Self {
            model: Arc::new(Mutex::new(engine)),
            model_name,
            dimension,
        })
    }

    /// Initialize the default model in the default cache directory.
    ///
    /// # Errors
    /// Same conditions as [`FastEmbedProvider::new`].
    pub fn with_defaults() -> EmbeddingResult<Self> {
        Self::new(None, None)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Unavailable("engine returned no vector".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "text cannot be empty".to_string(),
            ));
        }

        let documents: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let mut engine = self.model.lock().await;
        engine
            .embed(documents, None)
            .map_err(|e| EmbeddingError::Unavailable(format!("inference failed: {e}")))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
