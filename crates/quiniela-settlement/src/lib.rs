//! # quiniela-settlement
//!
//! **Finality plane**: turns final scores into official outcomes and
//! entry points.
//!
//! ## Pipeline
//!
//! ```text
//! CandidateScore[] ─▶ outcome::apply_candidate ─▶ Fixture[] (written first)
//!                                                   │
//!                                     scoring::OfficialOutcomes + digest
//!                                                   │
//!                    Entry pages ─▶ EntryUpdate batches ─▶ commit (retry)
//! ```
//!
//! The whole run sits inside a [`SettlementGuard`], so a pool is settled
//! by at most one run at a time.

pub mod engine;
pub mod guard;
pub mod leaderboard;
pub mod outcome;
pub mod scoring;

pub use engine::{AbortHandle, SettlementProgress, SettlementReport, Settler};
pub use guard::{SettlementGuard, release_stale};
pub use leaderboard::{Standing, load_standings, standings};
pub use outcome::{apply_candidate, determine_outcome, recompute_outcome};
pub use scoring::OfficialOutcomes;
