//! Library import CLI.
//!
//! Loads papers from a JSON snapshot into the local library store,
//! deduplicating by catalogue identifier, and optionally pre-computes
//! embeddings through the local engine so the first ranking pass is warm.
//!
//! # Examples
//!
//! ```bash
//! import --store ~/.paper-radar --input papers.json
//! import --store ~/.paper-radar --input papers.json --embed
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paper_radar::{
    provider::{json::JsonSnapshotProvider, FetchOptions, PaperProvider},
    storage::{json::JsonFileStore, LibraryStore},
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Import papers from a JSON snapshot into the library store
#[derive(Parser, Debug)]
#[command(name = "import", version, about)]
struct Args {
    /// Store directory
    #[arg(long, default_value = ".paper-radar")]
    store: std::path::PathBuf,

    /// JSON snapshot file holding an array of papers
    #[arg(long)]
    input: std::path::PathBuf,

    /// Pre-compute embeddings for imported papers
    #[arg(long)]
    embed: bool,
}

#[cfg(feature = "local-embeddings")]
async fn embed_library(
    store: &Arc<JsonFileStore>,
    library: &[paper_radar::Paper],
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use paper_radar::embedding::fastembed::FastEmbedProvider;
    use paper_radar::embedding::resolver::EmbeddingResolver;
    use tracing::warn;

    let engine = FastEmbedProvider::with_defaults()
        .map_err(|e| anyhow::anyhow!("embedding engine init failed: {e}"))?;
    let resolver = EmbeddingResolver::new(Some(engine), store.clone());

    let bar = ProgressBar::new(library.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut failures = 0usize;
    for paper in library {
        bar.set_message(paper.id.clone());
        if let Err(err) = resolver.paper_vector(paper).await {
            warn!(paper_id = %paper.id, %err, "embedding failed");
            failures += 1;
        }
        bar.inc(1);
    }
    bar.finish_with_message("done");

    if failures > 0 {
        println!("warning: {failures} papers could not be embedded");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let store = Arc::new(
        JsonFileStore::open(&args.store)
            .await
            .with_context(|| format!("cannot open store at {}", args.store.display()))?,
    );

    let incoming = JsonSnapshotProvider::new(&args.input)
        .fetch_by_query(
            "",
            &FetchOptions {
                limit: usize::MAX,
                ..FetchOptions::default()
            },
        )
        .await
        .with_context(|| format!("cannot read snapshot {}", args.input.display()))?;

    let mut library = store.load_library().await?;
    let before = library.len();
    for paper in incoming {
        if library.iter().any(|existing| existing.id == paper.id) {
            continue;
        }
        library.push(paper);
    }
    let added = library.len() - before;
    store.save_library(&library).await?;
    info!(added, total = library.len(), "library updated");
    println!("imported {added} papers ({} total)", library.len());

    if args.embed {
        #[cfg(feature = "local-embeddings")]
        embed_library(&store, &library).await?;

        #[cfg(not(feature = "local-embeddings"))]
        anyhow::bail!("built without local-embeddings; cannot pre-compute embeddings");
    }

    Ok(())
}
