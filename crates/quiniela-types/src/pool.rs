//! Pool types: a named, time-boxed prediction contest.
//!
//! A pool moves through **OPEN → SETTLING → CLOSED**. Entries are only
//! accepted while OPEN and before the deadline. SETTLING is held for the
//! duration of one settlement run and is the mutual-exclusion point
//! between two operators settling the same pool.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Fixture, FixtureId, Outcome, PoolId, QuinielaError, Result, UserId};

/// Lifecycle status of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    /// Accepting entries (until the deadline).
    Open,
    /// A settlement run currently holds the pool.
    Settling,
    /// Settled at least once.
    Closed,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Settling => write!(f, "SETTLING"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

impl PoolStatus {
    /// Whether a settlement run may start from this status.
    ///
    /// A closed pool may be settled again (corrected scores); a pool that
    /// is already settling may not.
    #[must_use]
    pub fn can_begin_settlement(self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }
}

/// A prediction pool with its fixed fixture list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: PoolId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// No entry may be submitted at or after this instant.
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub status: PoolStatus,
    pub fixtures: Vec<Fixture>,
}

impl Pool {
    /// Parse a pool document, failing fast on a malformed shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(QuinielaError::from)
    }

    /// Whether a submission at `now` would be accepted.
    #[must_use]
    pub fn accepts_entries(&self, now: DateTime<Utc>) -> bool {
        self.status == PoolStatus::Open && now < self.deadline
    }

    #[must_use]
    pub fn fixture(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn fixture_mut(&mut self, id: FixtureId) -> Option<&mut Fixture> {
        self.fixtures.iter_mut().find(|f| f.id == id)
    }

    /// Fixture ids in pool order.
    pub fn fixture_ids(&self) -> impl Iterator<Item = FixtureId> + '_ {
        self.fixtures.iter().map(|f| f.id)
    }

    /// Outcomes currently stored on the fixtures.
    pub fn stored_outcomes(&self) -> impl Iterator<Item = (FixtureId, Outcome)> + '_ {
        self.fixtures
            .iter()
            .filter_map(|f| f.outcome.map(|o| (f.id, o)))
    }

    /// Number of fixtures with a determined outcome.
    #[must_use]
    pub fn decided_fixtures(&self) -> usize {
        self.fixtures.iter().filter(|f| f.outcome.is_some()).count()
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Pool {
    /// An open pool with fixtures `1..=fixture_count` and a deadline one
    /// day out.
    pub fn dummy(fixture_count: u64) -> Self {
        let now = Utc::now();
        Self {
            id: PoolId::new(),
            title: "Jornada 1".to_string(),
            description: String::new(),
            deadline: now + chrono::Duration::days(1),
            created_by: None,
            created_at: now,
            status: PoolStatus::Open,
            fixtures: (1..=fixture_count).map(Fixture::dummy).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepts_entries_before_deadline_only() {
        let pool = Pool::dummy(3);
        assert!(pool.accepts_entries(pool.deadline - Duration::seconds(1)));
        assert!(!pool.accepts_entries(pool.deadline));
        assert!(!pool.accepts_entries(pool.deadline + Duration::seconds(1)));
    }

    #[test]
    fn closed_pool_rejects_entries() {
        let mut pool = Pool::dummy(3);
        pool.status = PoolStatus::Closed;
        assert!(!pool.accepts_entries(pool.created_at));
    }

    #[test]
    fn settlement_start_statuses() {
        assert!(PoolStatus::Open.can_begin_settlement());
        assert!(PoolStatus::Closed.can_begin_settlement());
        assert!(!PoolStatus::Settling.can_begin_settlement());
    }

    #[test]
    fn pool_status_display() {
        assert_eq!(format!("{}", PoolStatus::Open), "OPEN");
        assert_eq!(format!("{}", PoolStatus::Settling), "SETTLING");
        assert_eq!(format!("{}", PoolStatus::Closed), "CLOSED");
    }

    #[test]
    fn fixture_lookup() {
        let mut pool = Pool::dummy(3);
        assert!(pool.fixture(FixtureId(2)).is_some());
        assert!(pool.fixture(FixtureId(9)).is_none());
        pool.fixture_mut(FixtureId(2)).unwrap().outcome = Some(Outcome::Draw);
        assert_eq!(pool.decided_fixtures(), 1);
        assert_eq!(
            pool.stored_outcomes().collect::<Vec<_>>(),
            vec![(FixtureId(2), Outcome::Draw)]
        );
    }

    #[test]
    fn from_json_rejects_malformed_document() {
        let err = Pool::from_json(r#"{"id":"nope","title":3}"#).unwrap_err();
        assert!(matches!(err, QuinielaError::Serialization(_)));
    }

    #[test]
    fn from_json_reads_camel_case_document() {
        let pool = Pool::dummy(2);
        let json = serde_json::to_string(&pool).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"homeTeam\""));
        assert!(json.contains("\"status\":\"open\""));
        let back = Pool::from_json(&json).unwrap();
        assert_eq!(back, pool);
    }
}
