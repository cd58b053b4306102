//! Command-line parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quiniela_types::PoolId;

#[derive(Debug, Parser)]
#[command(name = "quiniela", version, about = "Settle quiniela pools from a JSON store snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Apply scores to a pool and finalize every entry.
    Settle {
        pool_id: PoolId,
        /// Store snapshot, rewritten after the run.
        #[arg(long)]
        snapshot: PathBuf,
        /// JSON array of candidate scores.
        #[arg(long)]
        scores: Option<PathBuf>,
        /// JSON array of feed rows, merged into candidates.
        #[arg(long)]
        feed: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the ranked standings of a pool.
    Standings {
        pool_id: PoolId,
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Move a pool stuck in SETTLING to CLOSED.
    ReleaseStale {
        pool_id: PoolId,
        #[arg(long)]
        snapshot: PathBuf,
    },
}
