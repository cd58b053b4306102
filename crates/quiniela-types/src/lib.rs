//! # quiniela-types
//!
//! Shared types, errors, and configuration for **quiniela** prediction pools.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PoolId`], [`UserId`], [`FixtureId`], [`EntryId`]
//! - **Pool model**: [`Pool`], [`PoolStatus`]
//! - **Fixture model**: [`Fixture`], [`MatchStatus`], [`Outcome`], [`Score`], [`CandidateScore`]
//! - **Entry model**: [`Entry`], [`EntryStatus`], [`EntryUpdate`], [`Predictions`]
//! - **Configuration**: [`QuinielaConfig`], [`SettlementConfig`], [`PoolRules`]
//! - **Errors**: [`QuinielaError`] with `QN_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod fixture;
pub mod ids;
pub mod pool;

pub use config::*;
pub use entry::*;
pub use error::*;
pub use fixture::*;
pub use ids::*;
pub use pool::*;

// Constants are accessed via `quiniela_types::constants::FOO`
// (not re-exported to avoid name collisions).
