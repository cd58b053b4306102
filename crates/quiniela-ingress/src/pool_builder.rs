//! Pool creation: validate an organizer's draft and persist it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quiniela_store::PoolStore;
use quiniela_types::{Fixture, Pool, PoolId, PoolRules, PoolStatus, QuinielaError, Result, UserId};

/// What an organizer submits to open a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub fixtures: Vec<Fixture>,
}

/// Turns drafts into open pools under a set of [`PoolRules`].
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    rules: PoolRules,
}

impl PoolBuilder {
    #[must_use]
    pub fn new(rules: PoolRules) -> Self {
        Self { rules }
    }

    /// Validate `draft` and produce an OPEN pool with a fresh id.
    ///
    /// Fixtures are reset to their unplayed state: no result, no outcome,
    /// unlocked.
    ///
    /// # Errors
    /// `InvalidPool` naming the first rule the draft breaks.
    pub fn build(&self, draft: PoolDraft, created_by: Option<UserId>, now: DateTime<Utc>) -> Result<Pool> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(invalid("title must not be empty"));
        }
        let description_chars = draft.description.chars().count();
        if description_chars > self.rules.max_description_chars {
            return Err(invalid(format!(
                "description has {description_chars} characters, max {}",
                self.rules.max_description_chars
            )));
        }
        if draft.deadline <= now {
            return Err(invalid(format!("deadline {} is not in the future", draft.deadline)));
        }
        if draft.fixtures.len() != self.rules.fixtures_per_pool {
            return Err(invalid(format!(
                "pool needs exactly {} fixtures, got {}",
                self.rules.fixtures_per_pool,
                draft.fixtures.len()
            )));
        }
        let mut seen = HashSet::with_capacity(draft.fixtures.len());
        for fixture in &draft.fixtures {
            if !seen.insert(fixture.id) {
                return Err(invalid(format!("{} appears twice", fixture.id)));
            }
        }

        let fixtures = draft
            .fixtures
            .into_iter()
            .map(|f| {
                let mut fresh = Fixture::new(f.id, f.home_team, f.away_team, f.match_date);
                fresh.league_id = f.league_id;
                fresh.league_name = f.league_name;
                fresh.round = f.round;
                fresh.home_logo = f.home_logo;
                fresh.away_logo = f.away_logo;
                fresh
            })
            .collect();

        Ok(Pool {
            id: PoolId::new(),
            title: title.to_string(),
            description: draft.description,
            deadline: draft.deadline,
            created_by,
            created_at: now,
            status: PoolStatus::Open,
            fixtures,
        })
    }

    /// Build and persist a pool.
    pub async fn create_pool<P: PoolStore>(
        &self,
        store: &P,
        draft: PoolDraft,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Pool> {
        let pool = self.build(draft, created_by, now)?;
        store.insert_pool(pool.clone()).await?;
        tracing::info!(
            pool = %pool.id,
            title = %pool.title,
            fixtures = pool.fixtures.len(),
            deadline = %pool.deadline,
            "Pool created"
        );
        Ok(pool)
    }
}

fn invalid(reason: impl Into<String>) -> QuinielaError {
    QuinielaError::InvalidPool {
        reason: reason.into(),
    }
}
