//! Recommendation CLI.
//!
//! Ranks papers from the local store (or a JSON snapshot) against the
//! user's interests and prints the result as a table or JSON. Supports an
//! interactive mode for editing interests and re-ranking.
//!
//! # Examples
//!
//! Rank the saved library against stored interests:
//! ```bash
//! recommend --store ~/.paper-radar
//! ```
//!
//! Rank a snapshot against ad-hoc interests, JSON output:
//! ```bash
//! recommend --store ~/.paper-radar --snapshot papers.json \
//!     --interest "diffusion models" --interest cs.CV --format json
//! ```
//!
//! Interactive mode:
//! ```bash
//! recommend --store ~/.paper-radar --interactive
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use paper_radar::{
    embedding::resolver::EmbeddingResolver,
    feed::{FeedRequest, FeedService},
    models::{Interest, InterestKind, RankedPaper},
    provider::{json::JsonSnapshotProvider, FetchOptions},
    ranking::PassCounter,
    storage::{json::JsonFileStore, LibraryStore},
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(feature = "local-embeddings")]
type Engine = paper_radar::embedding::fastembed::FastEmbedProvider;

#[cfg(not(feature = "local-embeddings"))]
type Engine = NoEngine;

/// Placeholder engine type when no local model is compiled in. Never
/// constructed; the resolver runs with no provider and ranking degrades
/// to its unscored fallback.
#[cfg(not(feature = "local-embeddings"))]
struct NoEngine;

#[cfg(not(feature = "local-embeddings"))]
#[async_trait::async_trait]
impl paper_radar::EmbeddingProvider for NoEngine {
    async fn embed(
        &self,
        _text: &str,
    ) -> paper_radar::embedding::EmbeddingResult<Vec<f32>> {
        Err(paper_radar::embedding::EmbeddingError::Unavailable(
            "built without local-embeddings".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "none"
    }
}

/// Output format for ranked results
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Human-readable table
    Table,
    /// JSON array of ranked papers
    Json,
}

/// Rank papers against user interests
#[derive(Parser, Debug)]
#[command(name = "recommend", version, about)]
struct Args {
    /// Store directory (library, interests, embedding cache)
    #[arg(long, default_value = ".paper-radar")]
    store: std::path::PathBuf,

    /// Rank papers from this JSON snapshot instead of the saved library
    #[arg(long)]
    snapshot: Option<std::path::PathBuf>,

    /// Ad-hoc interest (repeatable); overrides stored interests when given
    #[arg(long = "interest")]
    interests: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Maximum papers to show
    #[arg(long, default_value_t = 30)]
    limit: usize,

    /// Disable the embedding engine (forces the unscored fallback)
    #[arg(long)]
    no_engine: bool,

    /// Interactive interest-editing REPL; edits the stored interests, so
    /// it cannot be combined with ad-hoc `--interest` overrides
    #[arg(long, conflicts_with = "interests")]
    interactive: bool,
}

fn init_engine(args: &Args) -> Option<Engine> {
    if args.no_engine {
        return None;
    }

    #[cfg(feature = "local-embeddings")]
    {
        match Engine::with_defaults() {
            Ok(engine) => Some(engine),
            Err(err) => {
                warn!(%err, "embedding engine unavailable, ranking will be unscored");
                None
            }
        }
    }

    #[cfg(not(feature = "local-embeddings"))]
    {
        warn!("built without local-embeddings, ranking will be unscored");
        None
    }
}

fn ephemeral_interests(names: &[String]) -> Vec<Interest> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            // Category tags look like "cs.XX"; everything else is a topic.
            let kind = if name.contains('.') && !name.contains(' ') {
                InterestKind::Category
            } else {
                InterestKind::Topic
            };
            Interest::new(format!("cli-{i}"), name.clone(), kind)
        })
        .collect()
}

fn print_results(ranked: &[RankedPaper], format: Format, limit: usize) -> Result<()> {
    let shown = &ranked[..ranked.len().min(limit)];
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(shown)?);
        }
        Format::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Score", "Interest", "Title", "Categories"]);
            for r in shown {
                table.add_row(vec![
                    Cell::new(format!("{:.3}", r.score)),
                    Cell::new(r.matched_interest.as_deref().unwrap_or("-")),
                    Cell::new(&r.paper.title),
                    Cell::new(r.paper.categories.join(", ")),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

type Service = FeedService<JsonSnapshotProvider, Engine, Arc<JsonFileStore>, Arc<JsonFileStore>>;

async fn rank_once(
    service: &Service,
    store: &Arc<JsonFileStore>,
    args: &Args,
    overrides: Option<&[Interest]>,
) -> Result<Vec<RankedPaper>> {
    // Ad-hoc interests rank directly, without touching the stored list.
    if let Some(interests) = overrides {
        use paper_radar::PaperProvider;
        let papers = match &args.snapshot {
            Some(path) => {
                JsonSnapshotProvider::new(path)
                    .fetch_by_query(
                        "",
                        &FetchOptions {
                            limit: usize::MAX,
                            ..FetchOptions::default()
                        },
                    )
                    .await
                    .context("snapshot read failed")?
            }
            None => store.load_library().await?,
        };
        return Ok(paper_radar::rank_papers(papers, interests, service.resolver()).await);
    }

    if args.snapshot.is_some() {
        let outcome = service
            .refresh(&FeedRequest::Query {
                text: String::new(),
                options: FetchOptions {
                    limit: usize::MAX,
                    ..FetchOptions::default()
                },
            })
            .await
            .context("feed refresh failed")?;
        if outcome.stats.from_snapshot {
            eprintln!("note: catalogue unreachable, showing cached papers");
        }
        Ok(outcome.papers)
    } else {
        service.rank_library().await.context("library ranking failed")
    }
}

async fn interactive(service: &Service, store: &Arc<JsonFileStore>, args: &Args) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("commands: add <name> | rm <name> | list | rank | quit");

    loop {
        let line = match editor.readline("radar> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        editor.add_history_entry(&line)?;

        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "add" if !rest.is_empty() => {
                let mut interests = store.load_interests().await?;
                let mut added = ephemeral_interests(&[rest.to_string()]);
                if let Some(interest) = added.first_mut() {
                    interest.id = format!("i-{}", interests.len());
                }
                interests.append(&mut added);
                store.save_interests(&interests).await?;
                println!("added '{rest}'");
            }
            "rm" if !rest.is_empty() => {
                let mut interests = store.load_interests().await?;
                let before = interests.len();
                interests.retain(|i| !i.name.eq_ignore_ascii_case(rest));
                store.save_interests(&interests).await?;
                println!("removed {}", before - interests.len());
            }
            "list" => {
                for interest in store.load_interests().await? {
                    println!("{:?}\t{}", interest.kind, interest.name);
                }
            }
            "rank" => {
                let ranked = rank_once(service, store, args, None).await?;
                print_results(&ranked, args.format, args.limit)?;
            }
            "quit" | "exit" => break,
            _ => println!("unknown command"),
        }
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

    let engine = init_engine(&args);
    let resolver = EmbeddingResolver::new(engine, store.clone());

    let snapshot_path = args
        .snapshot
        .clone()
        .unwrap_or_else(|| args.store.join("feed.json"));
    let catalogue = JsonSnapshotProvider::new(snapshot_path);
    let service = FeedService::new(
        catalogue,
        resolver,
        store.clone(),
        Arc::new(PassCounter::new()),
    );

    let overrides = if args.interests.is_empty() {
        None
    } else {
        Some(ephemeral_interests(&args.interests))
    };

    if args.interactive {
        interactive(&service, &store, &args).await
    } else {
        let ranked = rank_once(&service, &store, &args, overrides.as_deref()).await?;
        print_results(&ranked, args.format, args.limit)
    }
}
