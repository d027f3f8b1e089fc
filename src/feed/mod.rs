//! Feed refresh coordination.
//!
//! The feed service ties the pieces together the way the application's
//! refresh triggers do (app init, interest change, pull-to-refresh):
//! fetch candidates from the paper provider, fall back to the last stored
//! snapshot when the network fails, run a ranking pass against the user's
//! interests, and discard the result if a newer pass superseded it while
//! our embedding calls were in flight.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::embedding::resolver::EmbeddingResolver;
use crate::embedding::EmbeddingProvider;
use crate::models::RankedPaper;
use crate::provider::{FetchOptions, PaperProvider};
use crate::ranking::{rank_papers, PassCounter};
use crate::storage::{EmbeddingCache, LibraryStore, StorageError};

/// Errors surfaced by a feed refresh.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network fetch failed and there is no cached snapshot to fall back
    /// to; the only batch-wide, user-visible failure.
    #[error("no papers available: network fetch failed and no cached snapshot exists")]
    NoData,

    /// A newer pass superseded this one; discard silently, never surface.
    #[error("ranking pass superseded by a newer one")]
    Stale,

    /// Persistence failed on a path with no fallback
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// What to ask the catalogue for.
#[derive(Debug, Clone)]
pub enum FeedRequest {
    /// Free-text search
    Query {
        /// Query text
        text: String,
        /// Paging and sort options
        options: FetchOptions,
    },
    /// Recent papers in the given categories
    Categories {
        /// Category tags (e.g. `cs.LG`)
        categories: Vec<String>,
        /// Maximum papers to fetch
        limit: usize,
    },
}

/// Statistics from one refresh, for logging and UI notices.
#[derive(Debug, Default, Clone)]
pub struct RefreshStats {
    /// Papers that went into the ranking pass
    pub fetched: usize,

    /// True when the network failed and the stored snapshot was used
    pub from_snapshot: bool,

    /// Papers that resolved an embedding and got a real score
    pub scored: usize,

    /// Papers that degraded to score 0
    pub unscored: usize,
}

/// A completed refresh: the ranked feed plus how it was produced.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Ranked papers, best match first
    pub papers: Vec<RankedPaper>,

    /// Refresh statistics
    pub stats: RefreshStats,
}

/// Coordinates provider, resolver, store, and pass generations.
pub struct FeedService<F, P, C, S>
where
    F: PaperProvider,
    P: EmbeddingProvider,
    C: EmbeddingCache,
    S: LibraryStore,
{
    provider: F,
    resolver: EmbeddingResolver<P, C>,
    store: S,
    passes: Arc<PassCounter>,
}

impl<F, P, C, S> FeedService<F, P, C, S>
where
    F: PaperProvider,
    P: EmbeddingProvider,
    C: EmbeddingCache,
    S: LibraryStore,
{
    /// Create a service sharing the given pass counter.
    ///
    /// The counter is shared so that every trigger that starts a pass
    /// (interest change, pull-to-refresh) invalidates the passes already
    /// in flight.
    pub fn new(
        provider: F,
        resolver: EmbeddingResolver<P, C>,
        store: S,
        passes: Arc<PassCounter>,
    ) -> Self {
        Self {
            provider,
            resolver,
            store,
            passes,
        }
    }

    /// Access the resolver (for direct ranking outside a refresh).
    pub fn resolver(&self) -> &EmbeddingResolver<P, C> {
        &self.resolver
    }

    /// Fetch, rank, and return the feed.
    ///
    /// # Errors
    /// [`FeedError::NoData`] when the network failed and the snapshot is
    /// empty; [`FeedError::Stale`] when a newer pass started while this
    /// one was awaiting (callers drop the result without surfacing it).
    pub async fn refresh(&self, request: &FeedRequest) -> FeedResult<RefreshOutcome> {
        let token = self.passes.begin();

        let fetched = match request {
            FeedRequest::Query { text, options } => {
                self.provider.fetch_by_query(text, options).await
            }
            FeedRequest::Categories { categories, limit } => {
                self.provider.fetch_by_categories(categories, *limit).await
            }
        };

        let (papers, from_snapshot) = match fetched {
            Ok(papers) => {
                if let Err(err) = self.store.save_feed_snapshot(&papers).await {
                    // Losing the snapshot costs the next offline fallback,
                    // not this refresh.
                    warn!(%err, "failed to persist feed snapshot");
                }
                (papers, false)
            }
            Err(err) => {
                warn!(provider = self.provider.name(), %err, "fetch failed, falling back to snapshot");
                let snapshot = self.store.load_feed_snapshot().await?;
                if snapshot.is_empty() {
                    return Err(FeedError::NoData);
                }
                (snapshot, true)
            }
        };

        let interests = self.store.load_interests().await?;
        debug!(
            papers = papers.len(),
            interests = interests.len(),
            from_snapshot,
            "starting ranking pass"
        );

        let mut stats = RefreshStats {
            fetched: papers.len(),
            from_snapshot,
            ..RefreshStats::default()
        };

        let ranked = rank_papers(papers, &interests, &self.resolver).await;

        if !self.passes.is_current(token) {
            debug!("ranking pass superseded, discarding result");
            return Err(FeedError::Stale);
        }

        stats.scored = ranked.iter().filter(|r| r.matched_interest.is_some()).count();
        stats.unscored = ranked.len() - stats.scored;
        info!(
            fetched = stats.fetched,
            scored = stats.scored,
            from_snapshot = stats.from_snapshot,
            "feed refresh complete"
        );

        Ok(RefreshOutcome {
            papers: ranked,
            stats,
        })
    }

    /// Rank the saved library against the current interests.
    ///
    /// Same ranking semantics as [`refresh`](Self::refresh) without a
    /// network fetch; used by the library screen and the CLI.
    pub async fn rank_library(&self) -> FeedResult<Vec<RankedPaper>> {
        let token = self.passes.begin();
        let papers = self.store.load_library().await?;
        let interests = self.store.load_interests().await?;

        let ranked = rank_papers(papers, &interests, &self.resolver).await;
        if !self.passes.is_current(token) {
            return Err(FeedError::Stale);
        }
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingError, EmbeddingResult};
    use crate::models::{Author, ChatTranscript, EmbeddingRecord, Interest, InterestKind, Note, Paper};
    use crate::provider::{ProviderError, ProviderResult};
    use crate::storage::StorageResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn paper(id: &str, embedding: Option<Vec<f32>>) -> Paper {
        Paper {
            id: id.to_string(),
            title: format!("Paper {id}"),
            authors: vec![Author::named("A")],
            abstract_text: "abstract".to_string(),
            categories: vec!["cs.LG".to_string()],
            published: Utc::now(),
            updated: Utc::now(),
            url: None,
            embedding,
        }
    }

    /// Provider serving a fixed list, or failing with a network error.
    struct StubCatalogue {
        papers: Vec<Paper>,
        fail: bool,
        // lets a test start a newer pass while a fetch is in flight
        supersede: Option<Arc<PassCounter>>,
    }

    #[async_trait]
    impl PaperProvider for StubCatalogue {
        async fn fetch_by_query(
            &self,
            _query: &str,
            _options: &FetchOptions,
        ) -> ProviderResult<Vec<Paper>> {
            if let Some(passes) = &self.supersede {
                passes.begin();
            }
            if self.fail {
                return Err(ProviderError::Network("connection refused".to_string()));
            }
            Ok(self.papers.clone())
        }

        async fn fetch_by_categories(
            &self,
            _categories: &[String],
            _limit: usize,
        ) -> ProviderResult<Vec<Paper>> {
            self.fetch_by_query("", &FetchOptions::default()).await
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Embedding engine with a fixed vector per normalized text.
    struct StubEngine {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StubEngine {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEngine {
        async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| EmbeddingError::Unavailable(format!("no vector for '{text}'")))
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "stub-model"
        }
    }

    /// In-memory store implementing both persistence traits.
    #[derive(Default)]
    struct MemoryStore {
        library: Mutex<Vec<Paper>>,
        interests: Mutex<Vec<Interest>>,
        snapshot: Mutex<Vec<Paper>>,
        records: Mutex<HashMap<String, EmbeddingRecord>>,
    }

    #[async_trait]
    impl LibraryStore for MemoryStore {
        async fn load_library(&self) -> StorageResult<Vec<Paper>> {
            Ok(self.library.lock().unwrap().clone())
        }

        async fn save_library(&self, papers: &[Paper]) -> StorageResult<()> {
            *self.library.lock().unwrap() = papers.to_vec();
            Ok(())
        }

        async fn load_interests(&self) -> StorageResult<Vec<Interest>> {
            Ok(self.interests.lock().unwrap().clone())
        }

        async fn save_interests(&self, interests: &[Interest]) -> StorageResult<()> {
            *self.interests.lock().unwrap() = interests.to_vec();
            Ok(())
        }

        async fn load_feed_snapshot(&self) -> StorageResult<Vec<Paper>> {
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn save_feed_snapshot(&self, papers: &[Paper]) -> StorageResult<()> {
            *self.snapshot.lock().unwrap() = papers.to_vec();
            Ok(())
        }

        async fn load_transcript(&self, _paper_id: &str) -> StorageResult<Option<ChatTranscript>> {
            Ok(None)
        }

        async fn save_transcript(&self, _transcript: &ChatTranscript) -> StorageResult<()> {
            Ok(())
        }

        async fn load_notes(&self) -> StorageResult<Vec<Note>> {
            Ok(vec![])
        }

        async fn save_notes(&self, _notes: &[Note]) -> StorageResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingCache for MemoryStore {
        async fn get(&self, paper_id: &str) -> StorageResult<Option<EmbeddingRecord>> {
            Ok(self.records.lock().unwrap().get(paper_id).cloned())
        }

        async fn put(&self, record: EmbeddingRecord) -> StorageResult<()> {
            self.records
                .lock()
                .unwrap()
                .insert(record.paper_id.clone(), record);
            Ok(())
        }
    }

    fn request() -> FeedRequest {
        FeedRequest::Query {
            text: "anything".to_string(),
            options: FetchOptions::default(),
        }
    }

    fn service(
        catalogue: StubCatalogue,
        engine: Option<StubEngine>,
        store: Arc<MemoryStore>,
        passes: Arc<PassCounter>,
    ) -> FeedService<StubCatalogue, StubEngine, Arc<MemoryStore>, Arc<MemoryStore>> {
        let resolver = EmbeddingResolver::new(engine, store.clone());
        FeedService::new(catalogue, resolver, store, passes)
    }

    #[tokio::test]
    async fn successful_refresh_ranks_and_stores_snapshot() {
        let store = Arc::new(MemoryStore::default());
        store
            .save_interests(&[Interest::new("i", "transformers", InterestKind::Topic)])
            .await
            .unwrap();

        let catalogue = StubCatalogue {
            papers: vec![
                paper("low", Some(vec![0.3, (1.0f32 - 0.09).sqrt()])),
                paper("high", Some(vec![0.9, (1.0f32 - 0.81).sqrt()])),
            ],
            fail: false,
            supersede: None,
        };
        let engine = StubEngine::new(&[("transformers", vec![1.0, 0.0])]);
        let svc = service(catalogue, Some(engine), store.clone(), Arc::default());

        let outcome = svc.refresh(&request()).await.unwrap();
        assert_eq!(outcome.papers[0].paper.id, "high");
        assert_eq!(outcome.stats.fetched, 2);
        assert_eq!(outcome.stats.scored, 2);
        assert!(!outcome.stats.from_snapshot);

        // The fetch was persisted as the new fallback snapshot.
        assert_eq!(store.load_feed_snapshot().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_snapshot() {
        let store = Arc::new(MemoryStore::default());
        store
            .save_feed_snapshot(&[paper("cached", Some(vec![1.0, 0.0]))])
            .await
            .unwrap();

        let catalogue = StubCatalogue {
            papers: vec![],
            fail: true,
            supersede: None,
        };
        let svc = service(catalogue, None, store, Arc::default());

        let outcome = svc.refresh(&request()).await.unwrap();
        assert!(outcome.stats.from_snapshot);
        assert_eq!(outcome.papers.len(), 1);
        assert_eq!(outcome.papers[0].paper.id, "cached");
    }

    #[tokio::test]
    async fn network_failure_with_empty_snapshot_is_no_data() {
        let store = Arc::new(MemoryStore::default());
        let catalogue = StubCatalogue {
            papers: vec![],
            fail: true,
            supersede: None,
        };
        let svc = service(catalogue, None, store, Arc::default());

        let err = svc.refresh(&request()).await.unwrap_err();
        assert!(matches!(err, FeedError::NoData));
    }

    #[tokio::test]
    async fn superseded_pass_is_discarded_as_stale() {
        let passes: Arc<PassCounter> = Arc::default();
        let store = Arc::new(MemoryStore::default());

        // The catalogue starts a newer pass while this one is in flight.
        let catalogue = StubCatalogue {
            papers: vec![paper("p", Some(vec![1.0, 0.0]))],
            fail: false,
            supersede: Some(passes.clone()),
        };
        let svc = service(catalogue, None, store, passes);

        let err = svc.refresh(&request()).await.unwrap_err();
        assert!(matches!(err, FeedError::Stale));
    }

    #[tokio::test]
    async fn no_engine_refresh_returns_unscored_feed() {
        let store = Arc::new(MemoryStore::default());
        store
            .save_interests(&[Interest::new("i", "transformers", InterestKind::Topic)])
            .await
            .unwrap();

        let catalogue = StubCatalogue {
            papers: vec![paper("a", None), paper("b", None)],
            fail: false,
            supersede: None,
        };
        let svc = service(catalogue, None, store, Arc::default());

        let outcome = svc.refresh(&request()).await.unwrap();
        let ids: Vec<_> = outcome.papers.iter().map(|r| r.paper.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(outcome.stats.scored, 0);
        assert_eq!(outcome.stats.unscored, 2);
    }

    #[tokio::test]
    async fn rank_library_ranks_saved_papers() {
        let store = Arc::new(MemoryStore::default());
        store
            .save_library(&[
                paper("far", Some(vec![0.0, 1.0])),
                paper("near", Some(vec![1.0, 0.0])),
            ])
            .await
            .unwrap();
        store
            .save_interests(&[Interest::new("i", "transformers", InterestKind::Topic)])
            .await
            .unwrap();

        let catalogue = StubCatalogue {
            papers: vec![],
            fail: false,
            supersede: None,
        };
        let engine = StubEngine::new(&[("transformers", vec![1.0, 0.0])]);
        let svc = service(catalogue, Some(engine), store, Arc::default());

        let ranked = svc.rank_library().await.unwrap();
        assert_eq!(ranked[0].paper.id, "near");
        assert_eq!(ranked[0].matched_interest.as_deref(), Some("transformers"));
    }
}
