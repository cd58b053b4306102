//! Settlement guard: one settlement run per pool at a time.
//!
//! The guard is the pool status transition itself:
//! ```text
//! OPEN | CLOSED ──acquire──▶ SETTLING ──complete──▶ CLOSED
//!                               │
//!                               └──release──▶ status before acquire, or
//!                                             CLOSED once outcomes are written
//! ```
//! A pool whose official outcomes are persisted never reopens: entries
//! submitted after that point could be made with the results known.
//! `acquire` is a compare-and-set in the pool store, so of two operators
//! racing to settle the same pool exactly one wins; the other gets
//! [`QuinielaError::SettlementInProgress`].

use quiniela_store::PoolStore;
use quiniela_types::{Pool, PoolId, PoolStatus, QuinielaError, Result};

/// Proof that the caller holds the SETTLING status of one pool.
///
/// Must be ended with [`complete`](Self::complete) or
/// [`release`](Self::release); dropping it leaves the pool SETTLING until
/// an operator clears it with [`release_stale`].
#[derive(Debug)]
#[must_use = "a settlement guard must be completed or released"]
pub struct SettlementGuard {
    pool_id: PoolId,
    prior: PoolStatus,
    outcomes_written: bool,
}

impl SettlementGuard {
    /// Move `pool` into SETTLING.
    ///
    /// # Errors
    /// - `SettlementInProgress` if the pool is already SETTLING, or another
    ///   run moved it there after `pool` was read.
    pub async fn acquire<P: PoolStore>(store: &P, pool: &Pool) -> Result<Self> {
        if !pool.status.can_begin_settlement() {
            return Err(QuinielaError::SettlementInProgress(pool.id));
        }
        store
            .transition_status(pool.id, pool.status, PoolStatus::Settling)
            .await
            .map_err(|err| match err {
                QuinielaError::WrongPoolStatus { .. } => QuinielaError::SettlementInProgress(pool.id),
                other => other,
            })?;
        tracing::debug!(pool = %pool.id, prior = %pool.status, "Settlement guard acquired");
        Ok(Self {
            pool_id: pool.id,
            prior: pool.status,
            outcomes_written: false,
        })
    }

    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Status the pool had before the guard was taken.
    #[must_use]
    pub fn prior_status(&self) -> PoolStatus {
        self.prior
    }

    /// Record that the run persisted the pool's fixture outcomes.
    pub fn mark_outcomes_written(&mut self) {
        self.outcomes_written = true;
    }

    /// Status [`release`](Self::release) will move the pool to.
    #[must_use]
    pub fn release_status(&self) -> PoolStatus {
        if self.outcomes_written {
            PoolStatus::Closed
        } else {
            self.prior
        }
    }

    /// The run finished: SETTLING → CLOSED.
    pub async fn complete<P: PoolStore>(self, store: &P) -> Result<()> {
        store
            .transition_status(self.pool_id, PoolStatus::Settling, PoolStatus::Closed)
            .await
    }

    /// The run stopped early: SETTLING → [`release_status`](Self::release_status).
    pub async fn release<P: PoolStore>(self, store: &P) -> Result<()> {
        store
            .transition_status(self.pool_id, PoolStatus::Settling, self.release_status())
            .await
    }
}

/// Clear a SETTLING status left behind by a run that never finished
/// (process killed, future dropped). The pool becomes CLOSED; it can be
/// settled again from there.
pub async fn release_stale<P: PoolStore>(store: &P, pool_id: PoolId) -> Result<()> {
    store
        .transition_status(pool_id, PoolStatus::Settling, PoolStatus::Closed)
        .await?;
    tracing::warn!(pool = %pool_id, "Stale settlement guard released");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiniela_store::MemoryStore;

    async fn stored_pool(status: PoolStatus) -> (MemoryStore, Pool) {
        let store = MemoryStore::new();
        let mut pool = Pool::dummy(2);
        pool.status = status;
        store.insert_pool(pool.clone()).await.unwrap();
        (store, pool)
    }

    #[tokio::test]
    async fn acquire_then_complete_closes_pool() {
        let (store, pool) = stored_pool(PoolStatus::Open).await;
        let guard = SettlementGuard::acquire(&store, &pool).await.unwrap();
        assert_eq!(guard.prior_status(), PoolStatus::Open);
        assert_eq!(store.load_pool(pool.id).await.unwrap().status, PoolStatus::Settling);

        guard.complete(&store).await.unwrap();
        assert_eq!(store.load_pool(pool.id).await.unwrap().status, PoolStatus::Closed);
    }

    #[tokio::test]
    async fn release_restores_prior_status() {
        let (store, pool) = stored_pool(PoolStatus::Closed).await;
        let guard = SettlementGuard::acquire(&store, &pool).await.unwrap();
        guard.release(&store).await.unwrap();
        assert_eq!(store.load_pool(pool.id).await.unwrap().status, PoolStatus::Closed);
    }

    #[tokio::test]
    async fn release_after_outcomes_written_closes_open_pool() {
        let (store, pool) = stored_pool(PoolStatus::Open).await;
        let mut guard = SettlementGuard::acquire(&store, &pool).await.unwrap();
        assert_eq!(guard.release_status(), PoolStatus::Open);

        guard.mark_outcomes_written();
        assert_eq!(guard.release_status(), PoolStatus::Closed);
        guard.release(&store).await.unwrap();
        assert_eq!(store.load_pool(pool.id).await.unwrap().status, PoolStatus::Closed);
    }

    #[tokio::test]
    async fn second_acquire_is_rejected() {
        let (store, pool) = stored_pool(PoolStatus::Open).await;
        let _held = SettlementGuard::acquire(&store, &pool).await.unwrap();

        // Same stale read of the pool (status OPEN) loses the race.
        let err = SettlementGuard::acquire(&store, &pool).await.unwrap_err();
        assert!(matches!(err, QuinielaError::SettlementInProgress(id) if id == pool.id));

        // A fresh read sees SETTLING and is rejected up front.
        let fresh = store.load_pool(pool.id).await.unwrap();
        let err = SettlementGuard::acquire(&store, &fresh).await.unwrap_err();
        assert!(matches!(err, QuinielaError::SettlementInProgress(_)));
    }

    #[tokio::test]
    async fn stale_guard_can_be_cleared() {
        let (store, pool) = stored_pool(PoolStatus::Open).await;
        let guard = SettlementGuard::acquire(&store, &pool).await.unwrap();
        drop(guard);

        release_stale(&store, pool.id).await.unwrap();
        assert_eq!(store.load_pool(pool.id).await.unwrap().status, PoolStatus::Closed);
        assert!(release_stale(&store, pool.id).await.is_err());
    }
}
