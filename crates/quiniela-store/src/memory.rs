//! In-memory document store.
//!
//! Backs tests and the operator CLI (which loads a JSON snapshot into it,
//! runs, and writes the snapshot back). Every operation holds the state
//! mutex for its whole body, so each call is atomic with respect to the
//! others, which is what the store contracts require of a batch commit.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use quiniela_types::{
    Entry, EntryId, EntryUpdate, Fixture, FixtureId, Pool, PoolId, PoolStatus, QuinielaError,
    Result,
};

use crate::snapshot::StoreSnapshot;
use crate::store::{EntryPage, EntryStore, PoolStore};

#[derive(Debug, Default)]
struct State {
    pools: HashMap<PoolId, Pool>,
    /// Ordered by id so paging is a range scan.
    entries: BTreeMap<EntryId, Entry>,
    committed_batches: usize,
    faults: Faults,
}

/// Injected failures (test builds only change these).
#[derive(Debug, Default)]
struct Faults {
    fail_fixture_writes: bool,
    /// Start failing once this many batches have committed.
    fail_batches_after: Option<usize>,
    /// How many consecutive commits fail before the store recovers.
    remaining_batch_failures: usize,
}

/// Thread-safe in-memory implementation of [`PoolStore`] and [`EntryStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, rejecting duplicate ids.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let mut state = State::default();
        for pool in snapshot.pools {
            if state.pools.contains_key(&pool.id) {
                return Err(QuinielaError::DuplicatePool(pool.id));
            }
            state.pools.insert(pool.id, pool);
        }
        for entry in snapshot.entries {
            if state.entries.contains_key(&entry.id) {
                return Err(QuinielaError::DuplicateEntry(entry.id));
            }
            state.entries.insert(entry.id.clone(), entry);
        }
        Ok(Self {
            state: Mutex::new(state),
        })
    }

    /// Copy out every document, pools sorted by id.
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let state = self.lock()?;
        let mut pools: Vec<Pool> = state.pools.values().cloned().collect();
        pools.sort_by_key(|p| p.id);
        Ok(StoreSnapshot {
            pools,
            entries: state.entries.values().cloned().collect(),
        })
    }

    /// Number of entry batches committed so far.
    pub fn committed_batches(&self) -> Result<usize> {
        Ok(self.lock()?.committed_batches)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| QuinielaError::Internal("memory store mutex poisoned".into()))
    }
}

/// Test helpers: failure injection.
#[cfg(any(test, feature = "test-helpers"))]
impl MemoryStore {
    /// Make every fixture write fail until reset.
    pub fn fail_fixture_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.fail_fixture_writes = fail;
        }
    }

    /// Once `committed` batches have gone through, fail the next
    /// `failures` commits.
    pub fn fail_batches_after(&self, committed: usize, failures: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.faults.fail_batches_after = Some(committed);
            state.faults.remaining_batch_failures = failures;
        }
    }
}

impl PoolStore for MemoryStore {
    async fn load_pool(&self, id: PoolId) -> Result<Pool> {
        let state = self.lock()?;
        state
            .pools
            .get(&id)
            .cloned()
            .ok_or(QuinielaError::PoolNotFound(id))
    }

    async fn insert_pool(&self, pool: Pool) -> Result<()> {
        let mut state = self.lock()?;
        if state.pools.contains_key(&pool.id) {
            return Err(QuinielaError::DuplicatePool(pool.id));
        }
        state.pools.insert(pool.id, pool);
        Ok(())
    }

    async fn write_fixtures(&self, id: PoolId, fixtures: &[Fixture]) -> Result<()> {
        let mut state = self.lock()?;
        if state.faults.fail_fixture_writes {
            return Err(QuinielaError::Storage("injected fixture write failure".into()));
        }
        let pool = state
            .pools
            .get_mut(&id)
            .ok_or(QuinielaError::PoolNotFound(id))?;

        // The fixture list is fixed at creation: only fields may change.
        let same_set = pool.fixtures.len() == fixtures.len()
            && pool
                .fixtures
                .iter()
                .zip(fixtures)
                .all(|(stored, new)| stored.id == new.id);
        if !same_set {
            return Err(QuinielaError::InvalidPool {
                reason: format!("fixture list of pool {id} cannot change"),
            });
        }
        pool.fixtures = fixtures.to_vec();
        Ok(())
    }

    async fn transition_status(&self, id: PoolId, from: PoolStatus, to: PoolStatus) -> Result<()> {
        let mut state = self.lock()?;
        let pool = state
            .pools
            .get_mut(&id)
            .ok_or(QuinielaError::PoolNotFound(id))?;
        if pool.status != from {
            return Err(QuinielaError::WrongPoolStatus {
                expected: from,
                actual: pool.status,
            });
        }
        pool.status = to;
        Ok(())
    }

    async fn set_fixture_lock(
        &self,
        id: PoolId,
        fixture_id: FixtureId,
        locked: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.lock()?;
        if state.faults.fail_fixture_writes {
            return Err(QuinielaError::Storage("injected fixture write failure".into()));
        }
        let pool = state
            .pools
            .get_mut(&id)
            .ok_or(QuinielaError::PoolNotFound(id))?;
        if pool.status == PoolStatus::Settling {
            return Err(QuinielaError::SettlementInProgress(id));
        }
        let fixture = pool.fixture_mut(fixture_id).ok_or(QuinielaError::FixtureNotFound {
            pool_id: id,
            fixture_id,
        })?;
        fixture.set_locked(locked, at);
        Ok(())
    }
}

impl EntryStore for MemoryStore {
    async fn create_entry(&self, entry: Entry) -> Result<()> {
        let mut state = self.lock()?;
        if state.entries.contains_key(&entry.id) {
            return Err(QuinielaError::DuplicateEntry(entry.id));
        }
        state.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn load_entry(&self, id: &EntryId) -> Result<Entry> {
        let state = self.lock()?;
        state
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| QuinielaError::EntryNotFound(id.clone()))
    }

    async fn entries_page(
        &self,
        pool_id: PoolId,
        after: Option<&EntryId>,
        limit: usize,
    ) -> Result<EntryPage> {
        let state = self.lock()?;
        let start: Bound<&EntryId> = after.map_or(Bound::Unbounded, Bound::Excluded);
        let end: Bound<&EntryId> = Bound::Unbounded;
        let entries: Vec<Entry> = state
            .entries
            .range::<EntryId, _>((start, end))
            .map(|(_, e)| e)
            .filter(|e| e.pool_id == pool_id)
            .take(limit)
            .cloned()
            .collect();
        let next = if entries.len() == limit {
            entries.last().map(|e| e.id.clone())
        } else {
            None
        };
        Ok(EntryPage { entries, next })
    }

    async fn commit_batch(&self, updates: &[EntryUpdate]) -> Result<()> {
        let mut state = self.lock()?;

        if let Some(after) = state.faults.fail_batches_after {
            if state.committed_batches >= after && state.faults.remaining_batch_failures > 0 {
                state.faults.remaining_batch_failures -= 1;
                return Err(QuinielaError::Storage("injected batch failure".into()));
            }
        }

        // Validate the whole batch before touching anything.
        if let Some(missing) = updates.iter().find(|u| !state.entries.contains_key(&u.entry_id)) {
            return Err(QuinielaError::EntryNotFound(missing.entry_id.clone()));
        }
        for update in updates {
            if let Some(entry) = state.entries.get_mut(&update.entry_id) {
                entry.apply(update);
            }
        }
        state.committed_batches += 1;
        Ok(())
    }
}
