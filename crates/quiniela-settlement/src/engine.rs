//! The settlement run: fixtures first, then entries in batches.
//!
//! ## Phases
//!
//! 1. **Guard**: pool OPEN/CLOSED → SETTLING ([`SettlementGuard`]).
//! 2. **Fixtures**: apply candidate scores, derive outcomes, and write
//!    the fixture list. Nothing else happens until this write returns.
//! 3. **Entries**: page through the pool's entries, score each against
//!    the outcomes written in phase 2, and commit the updates in batches.
//!    Each batch is atomic; a failed batch is retried, then reported
//!    together with how many entries were finalized before it.
//! 4. **Close**: SETTLING → CLOSED. A failure before the fixture write
//!    releases the guard back to the prior status; any later failure
//!    leaves the pool CLOSED, since its outcomes are already public.
//!
//! Points are set, never added, and every finalized entry records the
//! digest of the outcomes it was scored against. Re-running with the same
//! outcomes therefore changes nothing and skips entries a previous
//! (interrupted) run already finalized.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use quiniela_store::{EntryStore, PoolStore};
use quiniela_types::{
    CandidateScore, EntryId, EntryUpdate, Fixture, PoolId, QuinielaError, Result,
    ScoreSource, SettlementConfig,
};

use crate::guard::SettlementGuard;
use crate::outcome::{apply_candidate, recompute_outcome};
use crate::scoring::OfficialOutcomes;

/// Running totals published after every committed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementProgress {
    /// Entries finalized by this run.
    pub finalized: usize,
    /// Entries skipped because they were already settled against these outcomes.
    pub already_current: usize,
    pub batches_committed: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub pool_id: PoolId,
    /// Fixtures with an official outcome after this run.
    pub decided_fixtures: usize,
    /// Fixtures still without an outcome (unplayed, void, bad score).
    pub undecided_fixtures: usize,
    /// Feed candidates refused because their fixture is locked.
    pub locked_feed_skipped: usize,
    /// Candidates naming a fixture that is not in the pool.
    pub unknown_candidates: usize,
    pub entries_finalized: usize,
    pub entries_already_current: usize,
    pub batches_committed: usize,
    pub outcomes_digest: String,
    pub settled_at: DateTime<Utc>,
}

/// Cooperative abort flag, checked between batches.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters from the fixture phase.
#[derive(Debug, Default)]
struct FixturePass {
    locked_feed_skipped: usize,
    unknown_candidates: usize,
}

/// Settles pools held in a [`PoolStore`] / [`EntryStore`] pair.
pub struct Settler<'a, P, E> {
    pools: &'a P,
    entries: &'a E,
    config: SettlementConfig,
    progress: Option<watch::Sender<SettlementProgress>>,
    abort: Option<AbortHandle>,
}

impl<'a, P: PoolStore, E: EntryStore> Settler<'a, P, E> {
    #[must_use]
    pub fn new(pools: &'a P, entries: &'a E, config: SettlementConfig) -> Self {
        Self {
            pools,
            entries,
            config,
            progress: None,
            abort: None,
        }
    }

    /// Publish progress to `tx` after every batch.
    #[must_use]
    pub fn with_progress(mut self, tx: watch::Sender<SettlementProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Stop between batches once `handle` is aborted.
    #[must_use]
    pub fn with_abort(mut self, handle: AbortHandle) -> Self {
        self.abort = Some(handle);
        self
    }

    /// Settle one pool.
    ///
    /// # Errors
    /// - `PoolNotFound`: nothing was written.
    /// - `SettlementInProgress`: another run holds the pool.
    /// - `FixtureWriteFailed`: no entry was touched.
    /// - `PartialSettlement` / `SettlementAborted`: earlier batches stay
    ///   committed and the pool is left CLOSED; running again resumes.
    pub async fn settle_pool(
        &self,
        pool_id: PoolId,
        candidates: &[CandidateScore],
        now: DateTime<Utc>,
    ) -> Result<SettlementReport> {
        self.config.validate()?;
        let pool = self.pools.load_pool(pool_id).await?;
        let mut guard = SettlementGuard::acquire(self.pools, &pool).await?;

        tracing::info!(
            pool = %pool_id,
            title = %pool.title,
            fixtures = pool.fixtures.len(),
            candidates = candidates.len(),
            "Settlement started"
        );

        match self.run(pool_id, candidates, now, &mut guard).await {
            Ok(report) => {
                guard.complete(self.pools).await?;
                tracing::info!(
                    pool = %pool_id,
                    decided = report.decided_fixtures,
                    undecided = report.undecided_fixtures,
                    finalized = report.entries_finalized,
                    already_current = report.entries_already_current,
                    batches = report.batches_committed,
                    digest = %report.outcomes_digest,
                    "Settlement complete"
                );
                Ok(report)
            }
            Err(err) => {
                let status = guard.release_status();
                if let Err(release_err) = guard.release(self.pools).await {
                    tracing::error!(
                        pool = %pool_id,
                        error = %release_err,
                        "Failed to release settlement guard"
                    );
                }
                tracing::error!(pool = %pool_id, status = %status, error = %err, "Settlement failed");
                Err(err)
            }
        }
    }

    /// Clear a SETTLING status left by a run that never finished.
    pub async fn release_stale(&self, pool_id: PoolId) -> Result<()> {
        crate::guard::release_stale(self.pools, pool_id).await
    }

    async fn run(
        &self,
        pool_id: PoolId,
        candidates: &[CandidateScore],
        now: DateTime<Utc>,
        guard: &mut SettlementGuard,
    ) -> Result<SettlementReport> {
        // Phase 2: fixtures. Re-read under the guard; lock changes are
        // refused from here on.
        let mut fixtures = self.pools.load_pool(pool_id).await?.fixtures;
        let pass = apply_candidates(pool_id, &mut fixtures, candidates, now);
        let outcomes = OfficialOutcomes::from_fixtures(&fixtures);
        let digest = outcomes.digest(pool_id);

        self.pools
            .write_fixtures(pool_id, &fixtures)
            .await
            .map_err(|err| QuinielaError::FixtureWriteFailed {
                pool_id,
                reason: err.to_string(),
            })?;
        guard.mark_outcomes_written();
        tracing::info!(
            pool = %pool_id,
            decided = outcomes.len(),
            digest = %digest,
            "Fixture outcomes persisted"
        );

        // Phase 3: entries.
        let mut tally = SettlementProgress::default();
        let mut cursor: Option<EntryId> = None;
        loop {
            self.check_abort(pool_id, &tally)?;
            let page = self
                .entries
                .entries_page(pool_id, cursor.as_ref(), self.config.entry_page_size)
                .await
                .map_err(|err| QuinielaError::PartialSettlement {
                    pool_id,
                    finalized: tally.finalized,
                    already_current: tally.already_current,
                    reason: err.to_string(),
                })?;

            let mut updates = Vec::with_capacity(page.entries.len());
            for entry in &page.entries {
                if entry.is_settled_against(&digest) {
                    tally.already_current += 1;
                    continue;
                }
                updates.push(EntryUpdate {
                    entry_id: entry.id.clone(),
                    points: outcomes.score(&entry.predictions),
                    settled_at: now,
                    outcomes_digest: digest.clone(),
                });
            }

            for batch in updates.chunks(self.config.entry_batch_size) {
                self.check_abort(pool_id, &tally)?;
                self.commit_with_retry(pool_id, batch, &tally).await?;
                tally.finalized += batch.len();
                tally.batches_committed += 1;
                tracing::info!(
                    pool = %pool_id,
                    batch = tally.batches_committed,
                    size = batch.len(),
                    finalized = tally.finalized,
                    "Entry batch committed"
                );
                self.publish(tally);
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        if tally.finalized == 0 && tally.already_current == 0 {
            tracing::info!(pool = %pool_id, "No entries to settle");
        }
        self.publish(tally);

        Ok(SettlementReport {
            pool_id,
            decided_fixtures: outcomes.len(),
            undecided_fixtures: fixtures.len() - outcomes.len(),
            locked_feed_skipped: pass.locked_feed_skipped,
            unknown_candidates: pass.unknown_candidates,
            entries_finalized: tally.finalized,
            entries_already_current: tally.already_current,
            batches_committed: tally.batches_committed,
            outcomes_digest: digest,
            settled_at: now,
        })
    }

    async fn commit_with_retry(
        &self,
        pool_id: PoolId,
        batch: &[EntryUpdate],
        tally: &SettlementProgress,
    ) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.entries.commit_batch(batch).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.config.max_batch_retries => {
                    attempt += 1;
                    tracing::warn!(
                        pool = %pool_id,
                        attempt,
                        size = batch.len(),
                        error = %err,
                        "Entry batch commit failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff()).await;
                }
                Err(err) => {
                    return Err(QuinielaError::PartialSettlement {
                        pool_id,
                        finalized: tally.finalized,
                        already_current: tally.already_current,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    fn check_abort(&self, pool_id: PoolId, tally: &SettlementProgress) -> Result<()> {
        match &self.abort {
            Some(handle) if handle.is_aborted() => Err(QuinielaError::SettlementAborted {
                pool_id,
                finalized: tally.finalized,
                already_current: tally.already_current,
            }),
            _ => Ok(()),
        }
    }

    fn publish(&self, tally: SettlementProgress) {
        if let Some(tx) = &self.progress {
            tx.send_replace(tally);
        }
    }
}

/// Apply candidates onto the fixture list and re-derive untouched fixtures.
///
/// Feed candidates for locked fixtures are refused here as well as in the
/// sync step; manual candidates always apply.
fn apply_candidates(
    pool_id: PoolId,
    fixtures: &mut [Fixture],
    candidates: &[CandidateScore],
    now: DateTime<Utc>,
) -> FixturePass {
    let mut pass = FixturePass::default();
    let mut touched = vec![false; fixtures.len()];

    for candidate in candidates {
        let Some(idx) = fixtures.iter().position(|f| f.id == candidate.fixture_id) else {
            tracing::warn!(
                pool = %pool_id,
                fixture = %candidate.fixture_id,
                "Candidate score for fixture outside the pool ignored"
            );
            pass.unknown_candidates += 1;
            continue;
        };
        let fixture = &mut fixtures[idx];
        if fixture.is_locked && candidate.source == ScoreSource::Feed {
            tracing::warn!(
                pool = %pool_id,
                fixture = %fixture.id,
                "Feed score for locked fixture refused"
            );
            pass.locked_feed_skipped += 1;
            continue;
        }
        apply_candidate(fixture, candidate, now);
        touched[idx] = true;
    }

    for (fixture, touched) in fixtures.iter_mut().zip(touched) {
        if !touched {
            recompute_outcome(fixture);
        }
    }
    pass
}
