//! # quiniela-ingress
//!
//! **Intake plane**: everything that writes into a pool before settlement.
//!
//! - [`PoolBuilder`]: validates an organizer's draft and opens the pool
//! - [`EntrySubmitter`]: gates user submissions (status, deadline,
//!   complete predictions, one entry per user)
//! - [`merge_feed`] / [`set_fixture_lock`]: feed results become settlement
//!   candidates, except where an operator has locked the fixture

pub mod pool_builder;
pub mod result_sync;
pub mod submission;

pub use pool_builder::{PoolBuilder, PoolDraft};
pub use result_sync::{FeedResult, SyncOutcome, merge_feed, set_fixture_lock};
pub use submission::{EntrySubmitter, check_submission};
