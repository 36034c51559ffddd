//! Tickerwire CLI: run the market and news pipeline and inspect what it stored.
//!
//! Commands:
//! - `run` (default) executes one fetch, clean, store and report cycle
//! - `history` lists recent runs from the ledger
//! - `latest` prints the most recent stored records of one dataset
//! - `stats` reports row counts per table

mod commands;
mod main_lib;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tickerwire_core::constants::DEFAULT_QUERY_LIMIT;
use tickerwire_core::{DatasetKind, PipelineConfig};

use main_lib::{init_tracing, open_store};

#[derive(Parser, Debug)]
#[command(
    name = "tickerwire",
    version,
    about = "Fetch market and news data, clean it, store it and report on it"
)]
struct Cli {
    /// JSON config file. Defaults to ./config.json when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Execute one pipeline run and print its summary.
    Run {
        /// Fetch and store market data only.
        #[arg(long, default_value_t = false)]
        skip_news: bool,
    },
    /// Show recent runs from the ledger.
    History {
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
    /// Show the latest stored records of one dataset.
    Latest {
        /// market or news
        kind: DatasetKind,
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
    /// Show row counts per table.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_path)?;

    let store = open_store(&config)?;
    match cli.command.unwrap_or(Command::Run { skip_news: false }) {
        Command::Run { skip_news } => commands::run(&config, store, skip_news).await,
        Command::History { limit } => commands::history(store.as_ref(), limit),
        Command::Latest { kind, limit } => commands::latest(store.as_ref(), kind, limit),
        Command::Stats => commands::stats(store.as_ref(), &config),
    }
}
