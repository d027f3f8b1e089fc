//! Local JSON snapshot provider.
//!
//! Serves papers from a JSON file holding a `Vec<Paper>`. Used by the CLI
//! binaries and as the offline stand-in for the live catalogue: queries
//! match against title, abstract, and authors; category fetches match tags
//! exactly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{FetchOptions, PaperProvider, ProviderError, ProviderResult};
use crate::models::Paper;

/// Paper provider backed by a JSON snapshot file.
pub struct JsonSnapshotProvider {
    path: PathBuf,
}

impl JsonSnapshotProvider {
    /// Create a provider reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ProviderResult<Vec<Paper>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let papers: Vec<Paper> = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::Parse(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), count = papers.len(), "snapshot loaded");
        Ok(papers)
    }
}

fn matches_query(paper: &Paper, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    paper.title.to_lowercase().contains(&needle)
        || paper.abstract_text.to_lowercase().contains(&needle)
        || paper
            .authors
            .iter()
            .any(|a| a.name.to_lowercase().contains(&needle))
}

#[async_trait]
impl PaperProvider for JsonSnapshotProvider {
    async fn fetch_by_query(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> ProviderResult<Vec<Paper>> {
        let papers = self.load().await?;
        Ok(papers
            .into_iter()
            .filter(|p| query.trim().is_empty() || matches_query(p, query))
            .skip(options.start)
            .take(options.limit)
            .collect())
    }

    async fn fetch_by_categories(
        &self,
        categories: &[String],
        limit: usize,
    ) -> ProviderResult<Vec<Paper>> {
        let papers = self.load().await?;
        Ok(papers
            .into_iter()
            .filter(|p| {
                categories.is_empty()
                    || p.categories
                        .iter()
                        .any(|c| categories.iter().any(|want| want.eq_ignore_ascii_case(c)))
            })
            .take(limit)
            .collect())
    }

    fn name(&self) -> &str {
        "json-snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use chrono::Utc;

    fn paper(id: &str, title: &str, category: &str) -> Paper {
        Paper {
            id: id.to_string(),
            title: title.to_string(),
            authors: vec![Author::named("Grace Hopper")],
            abstract_text: "We study things.".to_string(),
            categories: vec![category.to_string()],
            published: Utc::now(),
            updated: Utc::now(),
            url: None,
            embedding: None,
        }
    }

    async fn snapshot(papers: &[Paper]) -> (tempfile::TempDir, JsonSnapshotProvider) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");
        tokio::fs::write(&path, serde_json::to_vec(papers).unwrap())
            .await
            .unwrap();
        (dir, JsonSnapshotProvider::new(path))
    }

    #[tokio::test]
    async fn query_matches_title_case_insensitively() {
        let (_dir, provider) = snapshot(&[
            paper("1", "Vision Transformers", "cs.CV"),
            paper("2", "Recurrent Networks", "cs.LG"),
        ])
        .await;

        let results = provider
            .fetch_by_query("transformers", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "1");
    }

    #[tokio::test]
    async fn empty_query_returns_everything_up_to_limit() {
        let (_dir, provider) = snapshot(&[
            paper("1", "A", "cs.CV"),
            paper("2", "B", "cs.LG"),
            paper("3", "C", "cs.CL"),
        ])
        .await;

        let options = FetchOptions {
            limit: 2,
            ..FetchOptions::default()
        };
        let results = provider.fetch_by_query("", &options).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn category_fetch_filters_by_tag() {
        let (_dir, provider) = snapshot(&[
            paper("1", "A", "cs.CV"),
            paper("2", "B", "cs.LG"),
            paper("3", "C", "cs.CV"),
        ])
        .await;

        let results = provider
            .fetch_by_categories(&["cs.cv".to_string()], 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_io_error() {
        let provider = JsonSnapshotProvider::new("/nonexistent/papers.json");
        let err = provider
            .fetch_by_query("x", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }
}
