//! Collaborator contracts for the two document collections.
//!
//! Pools and entries live in an external document store that offers no
//! multi-document transactions. The contracts below name exactly the
//! guarantees the rest of the workspace relies on:
//!
//! - [`PoolStore::write_fixtures`] is durable once it returns `Ok`.
//! - [`PoolStore::transition_status`] is a compare-and-set.
//! - [`PoolStore::set_fixture_lock`] touches one fixture and is refused
//!   while the pool is SETTLING.
//! - [`EntryStore::create_entry`] is insert-if-absent.
//! - [`EntryStore::commit_batch`] is all-or-nothing for the entries in it.

use std::future::Future;

use chrono::{DateTime, Utc};
use quiniela_types::{
    Entry, EntryId, EntryUpdate, Fixture, FixtureId, Pool, PoolId, PoolStatus, Result,
};

/// Read/write access to pool documents.
pub trait PoolStore: Send + Sync {
    /// Fetch a pool. Fails with `PoolNotFound` if absent.
    fn load_pool(&self, id: PoolId) -> impl Future<Output = Result<Pool>> + Send;

    /// Persist a new pool. Fails with `DuplicatePool` if the id is taken.
    fn insert_pool(&self, pool: Pool) -> impl Future<Output = Result<()>> + Send;

    /// Replace the pool's fixture list (same fixtures, updated fields).
    fn write_fixtures(&self, id: PoolId, fixtures: &[Fixture]) -> impl Future<Output = Result<()>> + Send;

    /// Move the pool from `from` to `to`, failing with `WrongPoolStatus`
    /// if the stored status is not `from`.
    fn transition_status(
        &self,
        id: PoolId,
        from: PoolStatus,
        to: PoolStatus,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Lock or unlock a single fixture, leaving every other field of the
    /// pool as stored. Fails with `SettlementInProgress` while the pool is
    /// SETTLING and `FixtureNotFound` for a fixture outside the pool.
    fn set_fixture_lock(
        &self,
        id: PoolId,
        fixture_id: FixtureId,
        locked: bool,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// One page of a pool's entries, ordered by entry id.
#[derive(Debug, Clone, Default)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    /// Cursor for the following page; `None` when this was the last one.
    pub next: Option<EntryId>,
}

/// Read/write access to entry documents.
pub trait EntryStore: Send + Sync {
    /// Insert a new entry. Fails with `DuplicateEntry` if the id exists,
    /// leaving the stored entry untouched.
    fn create_entry(&self, entry: Entry) -> impl Future<Output = Result<()>> + Send;

    /// Fetch an entry. Fails with `EntryNotFound` if absent.
    fn load_entry(&self, id: &EntryId) -> impl Future<Output = Result<Entry>> + Send;

    /// Entries of `pool_id` with id strictly greater than `after`, at most
    /// `limit` of them.
    fn entries_page(
        &self,
        pool_id: PoolId,
        after: Option<&EntryId>,
        limit: usize,
    ) -> impl Future<Output = Result<EntryPage>> + Send;

    /// Apply every update or none of them.
    fn commit_batch(&self, updates: &[EntryUpdate]) -> impl Future<Output = Result<()>> + Send;
}
