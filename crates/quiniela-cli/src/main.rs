//! `quiniela` operator binary.
//!
//! Loads a store snapshot, runs one command against it, writes the snapshot
//! back, and prints the result as JSON on stdout. Logs go to stderr;
//! `RUST_LOG` filters them and `QUINIELA_LOG_FORMAT=json` switches to JSON
//! lines.

mod args;

use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quiniela_ingress::{FeedResult, merge_feed};
use quiniela_settlement::{Settler, load_standings};
use quiniela_store::{MemoryStore, PoolStore, load_snapshot, save_snapshot};
use quiniela_types::{CandidateScore, PoolId, QuinielaConfig, QuinielaError, Result, constants};

use crate::args::{Cli, Command};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("QUINIELA_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    tracing::debug!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        "Starting"
    );

    match run(cli.command).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<String> {
    match command {
        Command::Settle {
            pool_id,
            snapshot,
            scores,
            feed,
            config,
        } => {
            let config = match config {
                Some(path) => QuinielaConfig::from_json_str(&tokio::fs::read_to_string(path).await?)?,
                None => QuinielaConfig::default(),
            };
            let store = open_store(&snapshot).await?;
            let candidates = gather_candidates(&store, pool_id, scores.as_deref(), feed.as_deref()).await?;

            let outcome = Settler::new(&store, &store, config.settlement)
                .settle_pool(pool_id, &candidates, Utc::now())
                .await;
            // Committed batches are real even when the run stops early.
            save_snapshot(&snapshot, &store.snapshot()?).await?;
            Ok(serde_json::to_string_pretty(&outcome?)?)
        }
        Command::Standings { pool_id, snapshot } => {
            let store = open_store(&snapshot).await?;
            store.load_pool(pool_id).await?;
            let rows = load_standings(&store, pool_id, constants::DEFAULT_ENTRY_PAGE_SIZE).await?;
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        Command::ReleaseStale { pool_id, snapshot } => {
            let store = open_store(&snapshot).await?;
            quiniela_settlement::release_stale(&store, pool_id).await?;
            save_snapshot(&snapshot, &store.snapshot()?).await?;
            Ok(serde_json::json!({ "poolId": pool_id, "status": "closed" }).to_string())
        }
    }
}

async fn open_store(path: &Path) -> Result<MemoryStore> {
    MemoryStore::from_snapshot(load_snapshot(path).await?)
}

/// Operator scores first, then feed rows for the fixtures they did not cover.
async fn gather_candidates(
    store: &MemoryStore,
    pool_id: PoolId,
    scores: Option<&Path>,
    feed: Option<&Path>,
) -> Result<Vec<CandidateScore>> {
    let mut candidates: Vec<CandidateScore> = match scores {
        Some(path) => read_json(path).await?,
        None => Vec::new(),
    };
    if let Some(path) = feed {
        let rows: Vec<FeedResult> = read_json(path).await?;
        let pool = store.load_pool(pool_id).await?;
        let sync = merge_feed(&pool, &rows);
        let from_feed: Vec<CandidateScore> = sync
            .candidates
            .into_iter()
            .filter(|c| !candidates.iter().any(|m| m.fixture_id == c.fixture_id))
            .collect();
        candidates.extend(from_feed);
    }
    Ok(candidates)
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| QuinielaError::Serialization(format!("{}: {e}", path.display())))
}
