//! Interest-based paper ranking.
//!
//! The ranking pass is a single-shot, re-entrant, stateless transformation:
//! it takes a list of papers, the user's interests, and a resolver
//! capability, and returns a new annotated list. Its only side effect is
//! the embedding cache writes the resolver performs for freshly computed
//! paper vectors.
//!
//! # Algorithm
//!
//! 1. With no interests, or no embedding engine, every paper comes back
//!    with score 0 in input order, so the UI is never blocked on an
//!    unavailable model.
//! 2. Distinct interests are resolved to vectors once per pass
//!    (case-insensitive dedup by display name).
//! 3. Each paper's embedding is resolved through the cache; a paper whose
//!    resolution fails scores 0 and carries no matched interest, without
//!    aborting the batch.
//! 4. Each resolved paper takes the maximum cosine similarity across all
//!    interest vectors; ties go to the earliest interest in input order.
//! 5. The output is stably sorted by score descending, so equal scores
//!    keep their input order and identical inputs (with identical cache
//!    state) produce identical output.
//!
//! Staleness across overlapping passes is handled by [`PassCounter`]:
//! callers mint a token before awaiting and drop results whose token has
//! been superseded.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::embedding::resolver::{EmbeddingResolver, ResolvedInterest};
use crate::embedding::EmbeddingProvider;
use crate::models::{Interest, Paper, RankedPaper};
use crate::similarity::cosine;
use crate::storage::EmbeddingCache;

/// Rank papers against interests, best match first.
///
/// Pure with respect to its inputs: identical papers, interests, and cache
/// state yield identical output. Per-item failures degrade that item to
/// score 0; nothing here returns an error.
pub async fn rank_papers<P, C>(
    papers: Vec<Paper>,
    interests: &[Interest],
    resolver: &EmbeddingResolver<P, C>,
) -> Vec<RankedPaper>
where
    P: EmbeddingProvider,
    C: EmbeddingCache,
{
    if interests.is_empty() || !resolver.is_ready() {
        debug!(
            papers = papers.len(),
            ready = resolver.is_ready(),
            "ranking fallback: unscored, input order"
        );
        return papers.into_iter().map(RankedPaper::unscored).collect();
    }

    let interest_vectors = resolver.interest_vectors(interests).await;
    if interest_vectors.is_empty() {
        // Every interest failed to resolve; same fallback as no interests.
        warn!("no interest resolved to a vector, returning unscored papers");
        return papers.into_iter().map(RankedPaper::unscored).collect();
    }

    let mut ranked = Vec::with_capacity(papers.len());
    for paper in papers {
        let ranked_paper = match resolver.paper_vector(&paper).await {
            Ok(vector) => score_paper(paper, &vector, &interest_vectors),
            Err(err) => {
                debug!(%err, "paper embedding unresolved, scoring 0");
                RankedPaper::unscored(paper)
            }
        };
        ranked.push(ranked_paper);
    }

    // Stable sort: equal scores keep their input order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Score one paper against the resolved interests.
///
/// Takes the maximum similarity; ties are broken by the earliest interest
/// (strict `>` while scanning in input order). A dimension mismatch fails
/// that single comparison only. The final score is clamped into `[0, 1]`.
fn score_paper(paper: Paper, vector: &[f32], interests: &[ResolvedInterest]) -> RankedPaper {
    let mut best: Option<(f32, &str)> = None;

    for interest in interests {
        let score = match cosine(vector, &interest.vector) {
            Ok(score) => score,
            Err(err) => {
                warn!(paper_id = %paper.id, interest = %interest.name, %err, "skipping comparison");
                continue;
            }
        };
        match best {
            Some((top, _)) if score <= top => {}
            _ => best = Some((score, &interest.name)),
        }
    }

    match best {
        Some((score, name)) => {
            let matched_interest = Some(name.to_string());
            RankedPaper {
                paper,
                score: score.clamp(0.0, 1.0),
                matched_interest,
            }
        }
        None => RankedPaper::unscored(paper),
    }
}

/// Generation counter for overlapping ranking passes.
///
/// A caller mints a [`PassToken`] before starting a pass. When a newer pass
/// begins, every earlier token goes stale; results arriving under a stale
/// token must be discarded rather than overwrite the newer pass's output.
#[derive(Debug, Default)]
pub struct PassCounter {
    current: AtomicU64,
}

/// Token identifying one ranking pass. See [`PassCounter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassToken(u64);

impl PassCounter {
    /// Create a counter with no passes started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass, invalidating all earlier tokens.
    pub fn begin(&self) -> PassToken {
        PassToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` still identifies the latest pass.
    pub fn is_current(&self, token: PassToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}
