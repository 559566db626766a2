mod config;
mod error;
mod snapshot;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resin_core::{FetchCache, MemorySink, Pipeline};
use resin_fetch::HttpAssetFetcher;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::load_config;
use crate::snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "resin")]
#[command(about = "Turns CMS content into site graph nodes", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build nodes from a CMS snapshot
    Build {
        /// Snapshot JSON with collections, singletons and the asset table
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for downloaded inline assets
        #[arg(long, default_value = ".resin/cache")]
        cache_dir: PathBuf,

        /// Where to write the nodes (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            input,
            cache_dir,
            output,
        } => {
            let snapshot = Snapshot::load(&input)?;
            info!(
                input = %input.display(),
                collections = snapshot.collections.len(),
                singletons = snapshot.singletons.len(),
                assets = snapshot.assets.len(),
                "loaded snapshot"
            );
            let fetcher = FetchCache::new(HttpAssetFetcher::new(cache_dir));
            let sink = MemorySink::new();

            let report = Pipeline::new(&config, &snapshot.assets, &fetcher, &sink)
                .run(&snapshot.collections, &snapshot.singletons)
                .await;

            let json = serde_json::to_string_pretty(&report.nodes)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => writeln!(std::io::stdout().lock(), "{json}")?,
            }

            eprintln!(
                "{} nodes created, {} inline assets fetched, {} failures",
                report.nodes.len(),
                fetcher.len(),
                report.failures.len()
            );
            for failure in &report.failures {
                eprintln!(
                    "  {} / {}: {}",
                    failure.collection,
                    failure.entry_id.as_deref().unwrap_or("<no id>"),
                    failure.error
                );
            }
            if !report.is_clean() {
                anyhow::bail!("{} entries failed", report.failures.len());
            }
        }
    }

    Ok(())
}
