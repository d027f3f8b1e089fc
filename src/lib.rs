//! paper-radar - interest-based ranking core for an arXiv paper reader.
//!
//! This library ranks candidate papers against a user's declared interests
//! using cosine similarity over embedding vectors, and carries the
//! persistence and coordination glue around that core: an embedding cache,
//! a local JSON library store, a paper-provider abstraction with snapshot
//! fallback, and staleness tracking for superseded ranking passes.
//!
//! # Architecture
//!
//! - **models**: Core data structures (Paper, Interest, EmbeddingRecord,
//!   RankedPaper, chat records)
//! - **similarity**: Cosine similarity primitive
//! - **embedding**: Embedding engine contract and cache-checked resolution
//! - **storage**: Persistence contracts and the JSON-file backend
//! - **provider**: Paper catalogue contract and the JSON snapshot source
//! - **ranking**: The ranking pass and pass-generation tracking
//! - **feed**: Refresh coordination (fetch, fallback, rank, discard stale)
//! - **chat**: Completion engine contract for paper chat/summarization
//!
//! # Workflow
//!
//! 1. Fetch candidate papers from the catalogue (or the cached snapshot
//!    when offline)
//! 2. Resolve each distinct interest to an embedding vector, once
//! 3. Resolve each paper's embedding through the shared cache
//! 4. Score every paper against every interest, keep the best match
//! 5. Sort by score, stable on ties, and hand the list to the UI
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use paper_radar::{
//!     embedding::resolver::EmbeddingResolver,
//!     feed::{FeedRequest, FeedService},
//!     provider::json::JsonSnapshotProvider,
//!     ranking::PassCounter,
//!     storage::json::JsonFileStore,
//! };
//!
//! # async fn example(engine: impl paper_radar::embedding::EmbeddingProvider) -> anyhow::Result<()> {
//! let store = Arc::new(JsonFileStore::open("~/.paper-radar").await?);
//! let resolver = EmbeddingResolver::new(Some(engine), store.clone());
//! let catalogue = JsonSnapshotProvider::new("papers.json");
//! let service = FeedService::new(catalogue, resolver, store, Arc::new(PassCounter::new()));
//!
//! let outcome = service
//!     .refresh(&FeedRequest::Categories {
//!         categories: vec!["cs.LG".to_string()],
//!         limit: 30,
//!     })
//!     .await?;
//! for ranked in &outcome.papers {
//!     println!("{:.3}  {}", ranked.score, ranked.paper.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod embedding;
pub mod feed;
pub mod models;
pub mod provider;
pub mod ranking;
pub mod similarity;
pub mod storage;

// Re-export commonly used types at the crate root
pub use embedding::resolver::EmbeddingResolver;
pub use embedding::EmbeddingProvider;
pub use feed::{FeedRequest, FeedService, RefreshOutcome};
pub use models::{EmbeddingRecord, Interest, InterestKind, Paper, RankedPaper};
pub use provider::{FetchOptions, PaperProvider};
pub use ranking::{rank_papers, PassCounter, PassToken};
pub use similarity::{cosine, SimilarityError};
pub use storage::{EmbeddingCache, LibraryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model name (the bundled on-device model)
pub const DEFAULT_EMBEDDING_MODEL: &str = "AllMiniLML6V2";

/// Default embedding dimension for the bundled model
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
