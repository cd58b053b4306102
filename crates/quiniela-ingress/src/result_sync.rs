//! Result intake from the sports-data feed, and the operator lock.
//!
//! The feed reports a status for every fixture it knows about, with goals
//! once the match is underway. [`merge_feed`] turns those rows into `feed`
//! candidates for settlement. A locked fixture is never touched: the lock
//! is how an operator keeps a hand-entered score from being overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quiniela_store::PoolStore;
use quiniela_types::{CandidateScore, FixtureId, MatchStatus, Pool, PoolId, Result};

/// One row from the external feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResult {
    pub fixture_id: FixtureId,
    pub status: MatchStatus,
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
}

/// Candidates produced from a feed pull, plus what was left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub candidates: Vec<CandidateScore>,
    /// Rows for locked fixtures.
    pub skipped_locked: usize,
    /// Rows naming fixtures outside the pool.
    pub ignored: usize,
}

impl SyncOutcome {
    /// Number of fixtures that received a candidate.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.candidates.len()
    }
}

/// Merge feed rows into settlement candidates for `pool`.
///
/// A finished status carries the feed's goals. Any other status keeps the
/// goals already stored on the fixture, so a match that regresses to, say,
/// postponed loses its outcome but not its last known score.
#[must_use]
pub fn merge_feed(pool: &Pool, feed: &[FeedResult]) -> SyncOutcome {
    let mut out = SyncOutcome::default();
    for row in feed {
        let Some(fixture) = pool.fixture(row.fixture_id) else {
            tracing::debug!(pool = %pool.id, fixture = %row.fixture_id, "Feed row outside pool ignored");
            out.ignored += 1;
            continue;
        };
        if fixture.is_locked {
            tracing::warn!(
                pool = %pool.id,
                fixture = %fixture.id,
                teams = %fixture.label(),
                "Locked fixture skipped during feed sync"
            );
            out.skipped_locked += 1;
            continue;
        }

        let (home, away) = if row.status.is_finished() {
            (row.home, row.away)
        } else {
            (
                fixture.result.map(|s| s.home),
                fixture.result.map(|s| s.away),
            )
        };
        out.candidates
            .push(CandidateScore::feed(fixture.id, row.status.clone(), home, away));
    }
    tracing::info!(
        pool = %pool.id,
        updated = out.updated(),
        skipped_locked = out.skipped_locked,
        ignored = out.ignored,
        "Feed merged"
    );
    out
}

/// Engage or release the operator lock on one fixture.
///
/// Only the lock fields of that fixture are written, so results persisted
/// by a settlement run are never overwritten.
///
/// # Errors
/// - `PoolNotFound`, or `FixtureNotFound` if the fixture is not in the pool.
/// - `SettlementInProgress` while the pool is SETTLING; retry once the
///   run has finished.
pub async fn set_fixture_lock<P: PoolStore>(
    store: &P,
    pool_id: PoolId,
    fixture_id: FixtureId,
    locked: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    store.set_fixture_lock(pool_id, fixture_id, locked, now).await?;
    tracing::info!(pool = %pool_id, fixture = %fixture_id, locked, "Fixture lock changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiniela_store::MemoryStore;
    use quiniela_types::{PoolStatus, QuinielaError, RawGoals, Score, ScoreSource};

    fn row(id: u64, status: &str, home: Option<u32>, away: Option<u32>) -> FeedResult {
        FeedResult {
            fixture_id: FixtureId(id),
            status: MatchStatus::from_code(status),
            home,
            away,
        }
    }

    #[test]
    fn finished_rows_carry_feed_goals() {
        let pool = Pool::dummy(2);
        let out = merge_feed(&pool, &[row(1, "FT", Some(3), Some(1))]);
        assert_eq!(out.updated(), 1);
        let c = &out.candidates[0];
        assert_eq!(c.source, ScoreSource::Feed);
        assert_eq!(c.goals(), Some(Score::new(3, 1)));
        assert_eq!(c.status, Some(MatchStatus::FullTime));
    }

    #[test]
    fn unfinished_rows_keep_stored_goals() {
        let mut pool = Pool::dummy(1);
        pool.fixtures[0].result = Some(Score::new(1, 1));
        let out = merge_feed(&pool, &[row(1, "PST", Some(0), Some(0))]);
        assert_eq!(out.candidates[0].home, Some(RawGoals::Count(1)));
        assert_eq!(out.candidates[0].status, Some(MatchStatus::Postponed));
    }

    #[test]
    fn locked_and_foreign_rows_are_counted_not_merged() {
        let mut pool = Pool::dummy(2);
        pool.fixtures[0].set_locked(true, Utc::now());
        let out = merge_feed(
            &pool,
            &[
                row(1, "FT", Some(2), Some(0)),
                row(2, "FT", Some(0), Some(0)),
                row(42, "FT", Some(1), Some(0)),
            ],
        );
        assert_eq!(out.updated(), 1);
        assert_eq!(out.skipped_locked, 1);
        assert_eq!(out.ignored, 1);
        assert_eq!(out.candidates[0].fixture_id, FixtureId(2));
    }

    #[test]
    fn feed_rows_parse_from_json() {
        let rows: Vec<FeedResult> = serde_json::from_str(
            r#"[{"fixtureId":7,"status":"AET","home":2,"away":1},{"fixtureId":8,"status":{"short":"NS"}}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].status, MatchStatus::AfterExtraTime);
        assert_eq!(rows[1].home, None);
    }

    #[tokio::test]
    async fn lock_round_trip_through_store() {
        let store = MemoryStore::new();
        let pool = Pool::dummy(2);
        store.insert_pool(pool.clone()).await.unwrap();
        let now = Utc::now();

        set_fixture_lock(&store, pool.id, FixtureId(2), true, now).await.unwrap();
        let stored = store.load_pool(pool.id).await.unwrap();
        assert!(stored.fixtures[1].is_locked);
        assert_eq!(stored.fixtures[1].locked_at, Some(now));

        set_fixture_lock(&store, pool.id, FixtureId(2), false, now).await.unwrap();
        let stored = store.load_pool(pool.id).await.unwrap();
        assert!(!stored.fixtures[1].is_locked);
        assert!(stored.fixtures[1].locked_at.is_none());

        let err = set_fixture_lock(&store, pool.id, FixtureId(9), true, now)
            .await
            .unwrap_err();
        assert!(matches!(err, QuinielaError::FixtureNotFound { .. }));
    }

    #[tokio::test]
    async fn lock_refused_while_settling() {
        let store = MemoryStore::new();
        let pool = Pool::dummy(2);
        store.insert_pool(pool.clone()).await.unwrap();
        store
            .transition_status(pool.id, PoolStatus::Open, PoolStatus::Settling)
            .await
            .unwrap();

        let err = set_fixture_lock(&store, pool.id, FixtureId(1), true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, QuinielaError::SettlementInProgress(id) if id == pool.id));
        assert!(!store.load_pool(pool.id).await.unwrap().fixtures[0].is_locked);
    }

    #[tokio::test]
    async fn lock_keeps_results_written_since_it_was_read() {
        let store = MemoryStore::new();
        let pool = Pool::dummy(2);
        store.insert_pool(pool.clone()).await.unwrap();

        // Results land after the operator's view of the pool was loaded.
        let mut fixtures = pool.fixtures.clone();
        fixtures[0].result = Some(Score::new(1, 0));
        store.write_fixtures(pool.id, &fixtures).await.unwrap();

        set_fixture_lock(&store, pool.id, FixtureId(2), true, Utc::now())
            .await
            .unwrap();
        let stored = store.load_pool(pool.id).await.unwrap();
        assert_eq!(stored.fixtures[0].result, Some(Score::new(1, 0)));
        assert!(stored.fixtures[1].is_locked);
    }
}
