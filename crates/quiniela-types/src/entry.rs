//! Entry types: one user's submitted predictions for one pool.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, FixtureId, Outcome, PoolId, UserId};

/// Predicted outcome per fixture.
pub type Predictions = BTreeMap<FixtureId, Outcome>;

/// Lifecycle status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Submitted, awaiting settlement.
    Active,
    /// Scored by a settlement run.
    Finalized,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// A user's submission to a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub user_id: UserId,
    pub user_name: String,
    pub pool_id: PoolId,
    pub pool_title: String,
    pub predictions: Predictions,
    pub submitted_at: DateTime<Utc>,
    pub status: EntryStatus,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub settled_at: Option<DateTime<Utc>>,
    /// Digest of the official outcomes this entry was last scored against.
    #[serde(default)]
    pub outcomes_digest: Option<String>,
}

impl Entry {
    /// A freshly submitted, unscored entry.
    #[must_use]
    pub fn new(
        user_id: UserId,
        user_name: impl Into<String>,
        pool_id: PoolId,
        pool_title: impl Into<String>,
        predictions: Predictions,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntryId::for_participant(&user_id, &pool_id),
            user_id,
            user_name: user_name.into(),
            pool_id,
            pool_title: pool_title.into(),
            predictions,
            submitted_at,
            status: EntryStatus::Active,
            points: 0,
            settled_at: None,
            outcomes_digest: None,
        }
    }

    /// Already finalized against exactly these outcomes.
    #[must_use]
    pub fn is_settled_against(&self, digest: &str) -> bool {
        self.status == EntryStatus::Finalized && self.outcomes_digest.as_deref() == Some(digest)
    }

    /// Write a settlement result onto this entry (points and status together).
    pub fn apply(&mut self, update: &EntryUpdate) {
        self.points = update.points;
        self.status = EntryStatus::Finalized;
        self.settled_at = Some(update.settled_at);
        self.outcomes_digest = Some(update.outcomes_digest.clone());
    }
}

/// The fields settlement writes onto one entry, committed as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    pub entry_id: EntryId,
    pub points: u32,
    pub settled_at: DateTime<Utc>,
    pub outcomes_digest: String,
}
