//! Entry submission gate.
//!
//! Every submission is checked against the pool before anything is
//! written:
//!
//! - the pool exists and is OPEN
//! - the deadline has not passed (`now < deadline`)
//! - every fixture has exactly one prediction, and no prediction names a
//!   fixture outside the pool
//!
//! One entry per (user, pool): the entry id is derived from the pair and
//! the store refuses to create an id twice.

use chrono::{DateTime, Utc};

use quiniela_store::{EntryStore, PoolStore};
use quiniela_types::{Entry, Pool, PoolId, PoolStatus, Predictions, QuinielaError, Result, UserId};

/// Accepts entries into pools held in a pool/entry store pair.
pub struct EntrySubmitter<'a, P, E> {
    pools: &'a P,
    entries: &'a E,
}

impl<'a, P: PoolStore, E: EntryStore> EntrySubmitter<'a, P, E> {
    #[must_use]
    pub fn new(pools: &'a P, entries: &'a E) -> Self {
        Self { pools, entries }
    }

    /// Validate and store one user's predictions.
    ///
    /// # Errors
    /// - `PoolNotFound`, `PoolNotAcceptingEntries`, `DeadlinePassed`
    /// - `IncompletePredictions` / `UnknownFixturePrediction`
    /// - `DuplicateEntry` if the user already entered this pool
    pub async fn submit(
        &self,
        pool_id: PoolId,
        user_id: UserId,
        user_name: impl Into<String>,
        predictions: Predictions,
        now: DateTime<Utc>,
    ) -> Result<Entry> {
        let pool = self.pools.load_pool(pool_id).await?;
        check_submission(&pool, &predictions, now)?;

        let entry = Entry::new(user_id, user_name, pool.id, &pool.title, predictions, now);
        self.entries.create_entry(entry.clone()).await?;
        tracing::info!(
            pool = %pool.id,
            entry = %entry.id,
            predictions = entry.predictions.len(),
            "Entry submitted"
        );
        Ok(entry)
    }
}

/// The pure part of the gate.
pub fn check_submission(pool: &Pool, predictions: &Predictions, now: DateTime<Utc>) -> Result<()> {
    if pool.status != PoolStatus::Open {
        return Err(QuinielaError::PoolNotAcceptingEntries {
            pool_id: pool.id,
            status: pool.status,
        });
    }
    if now >= pool.deadline {
        return Err(QuinielaError::DeadlinePassed {
            pool_id: pool.id,
            deadline: pool.deadline,
        });
    }
    if let Some(unknown) = predictions.keys().find(|id| pool.fixture(**id).is_none()) {
        return Err(QuinielaError::UnknownFixturePrediction(*unknown));
    }
    let predicted = pool
        .fixture_ids()
        .filter(|id| predictions.contains_key(id))
        .count();
    if predicted != pool.fixtures.len() {
        return Err(QuinielaError::IncompletePredictions {
            required: pool.fixtures.len(),
            predicted,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiniela_store::MemoryStore;
    use quiniela_types::{FixtureId, Outcome};

    fn full(pool: &Pool) -> Predictions {
        pool.fixture_ids().map(|id| (id, Outcome::Draw)).collect()
    }

    #[test]
    fn complete_predictions_pass() {
        let pool = Pool::dummy(3);
        assert!(check_submission(&pool, &full(&pool), Utc::now()).is_ok());
    }

    #[test]
    fn deadline_is_exclusive() {
        let pool = Pool::dummy(1);
        let err = check_submission(&pool, &full(&pool), pool.deadline).unwrap_err();
        assert!(matches!(err, QuinielaError::DeadlinePassed { .. }));
        let just_before = pool.deadline - Duration::milliseconds(1);
        assert!(check_submission(&pool, &full(&pool), just_before).is_ok());
    }

    #[test]
    fn closed_pool_refuses() {
        let mut pool = Pool::dummy(1);
        pool.status = PoolStatus::Closed;
        let err = check_submission(&pool, &full(&pool), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            QuinielaError::PoolNotAcceptingEntries {
                status: PoolStatus::Closed,
                ..
            }
        ));
    }

    #[test]
    fn missing_and_foreign_fixtures_refused() {
        let pool = Pool::dummy(3);
        let mut partial = full(&pool);
        partial.remove(&FixtureId(2));
        let err = check_submission(&pool, &partial, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            QuinielaError::IncompletePredictions {
                required: 3,
                predicted: 2
            }
        ));

        let mut foreign = full(&pool);
        foreign.insert(FixtureId(99), Outcome::Home);
        let err = check_submission(&pool, &foreign, Utc::now()).unwrap_err();
        assert!(matches!(err, QuinielaError::UnknownFixturePrediction(FixtureId(99))));
    }

    #[tokio::test]
    async fn second_submission_is_refused_and_first_kept() {
        let store = MemoryStore::new();
        let pool = Pool::dummy(2);
        store.insert_pool(pool.clone()).await.unwrap();
        let submitter = EntrySubmitter::new(&store, &store);

        let first = submitter
            .submit(pool.id, UserId::new("u1"), "Ana", full(&pool), Utc::now())
            .await
            .unwrap();

        let mut other = full(&pool);
        other.insert(FixtureId(1), Outcome::Away);
        let err = submitter
            .submit(pool.id, UserId::new("u1"), "Ana", other, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, QuinielaError::DuplicateEntry(_)));
        assert_eq!(store.load_entry(&first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn unknown_pool_is_not_found() {
        let store = MemoryStore::new();
        let submitter = EntrySubmitter::new(&store, &store);
        let err = submitter
            .submit(PoolId::new(), UserId::new("u1"), "Ana", Predictions::new(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, QuinielaError::PoolNotFound(_)));
    }
}
