//! Scoring: one point per exact outcome match.
//!
//! ```text
//! points(entry) = |{ f : entry.predictions[f] == official[f] }|
//! ```
//!
//! Fixtures without an official outcome are absent from [`OfficialOutcomes`]
//! and therefore neither credit nor debit anyone.

use std::collections::BTreeMap;

use quiniela_types::{Fixture, FixtureId, Outcome, PoolId, Predictions};
use sha2::{Digest, Sha256};

/// The official outcome of every decided fixture in one settlement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfficialOutcomes(BTreeMap<FixtureId, Outcome>);

impl OfficialOutcomes {
    /// Collect the outcomes stored on a fixture list.
    #[must_use]
    pub fn from_fixtures(fixtures: &[Fixture]) -> Self {
        Self(
            fixtures
                .iter()
                .filter_map(|f| f.outcome.map(|o| (f.id, o)))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, fixture_id: FixtureId) -> Option<Outcome> {
        self.0.get(&fixture_id).copied()
    }

    /// Number of decided fixtures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Points earned by a set of predictions.
    #[must_use]
    pub fn score(&self, predictions: &Predictions) -> u32 {
        let hits = predictions
            .iter()
            .filter(|(fixture_id, pick)| self.get(**fixture_id) == Some(**pick))
            .count();
        // Bounded by the number of fixtures in a pool.
        u32::try_from(hits).unwrap_or(u32::MAX)
    }

    /// SHA-256 commitment to these outcomes for this pool, hex-encoded.
    ///
    /// Stored on every entry a run finalizes, so a reader can check an
    /// entry's points against the outcomes persisted on the pool, and a
    /// re-run can skip entries that are already current.
    #[must_use]
    pub fn digest(&self, pool_id: PoolId) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"quiniela:outcomes:v1:");
        hasher.update(pool_id.0.as_bytes());
        hasher.update((self.0.len() as u64).to_le_bytes());
        for (fixture_id, outcome) in &self.0 {
            hasher.update(fixture_id.0.to_le_bytes());
            hasher.update(match outcome {
                Outcome::Home => [0u8],
                Outcome::Draw => [1u8],
                Outcome::Away => [2u8],
            });
        }
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(FixtureId, Outcome)> for OfficialOutcomes {
    fn from_iter<I: IntoIterator<Item = (FixtureId, Outcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn outcomes(pairs: &[(u64, Outcome)]) -> OfficialOutcomes {
        pairs.iter().map(|(id, o)| (FixtureId(*id), *o)).collect()
    }

    fn picks(pairs: &[(u64, Outcome)]) -> Predictions {
        pairs.iter().map(|(id, o)| (FixtureId(*id), *o)).collect()
    }

    fn random_outcome(rng: &mut impl Rng) -> Outcome {
        match rng.gen_range(0..3) {
            0 => Outcome::Home,
            1 => Outcome::Draw,
            _ => Outcome::Away,
        }
    }

    #[test]
    fn exact_matches_score_one_each() {
        let official = outcomes(&[(1, Outcome::Home), (2, Outcome::Draw), (3, Outcome::Away)]);
        let entry = picks(&[(1, Outcome::Home), (2, Outcome::Away), (3, Outcome::Away)]);
        assert_eq!(official.score(&entry), 2);
    }

    #[test]
    fn undecided_fixture_neither_credits_nor_debits() {
        let official = outcomes(&[(1, Outcome::Home)]);
        let right_on_3 = picks(&[(1, Outcome::Home), (3, Outcome::Draw)]);
        let wrong_on_3 = picks(&[(1, Outcome::Home), (3, Outcome::Away)]);
        assert_eq!(official.score(&right_on_3), 1);
        assert_eq!(official.score(&wrong_on_3), 1);
    }

    #[test]
    fn no_outcomes_scores_zero() {
        let official = OfficialOutcomes::default();
        assert!(official.is_empty());
        assert_eq!(official.score(&picks(&[(1, Outcome::Home)])), 0);
    }

    #[test]
    fn random_entries_stay_within_bounds() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let n: u64 = rng.gen_range(1..=9);
            let mut decided = Vec::new();
            for id in 1..=n {
                if rng.gen_bool(0.7) {
                    decided.push((FixtureId(id), random_outcome(&mut rng)));
                }
            }
            let official: OfficialOutcomes = decided.into_iter().collect();
            let entry: Predictions = (1..=n)
                .map(|id| (FixtureId(id), random_outcome(&mut rng)))
                .collect();

            let expected = (1..=n)
                .filter(|id| official.get(FixtureId(*id)) == entry.get(&FixtureId(*id)).copied())
                .count();
            let points = official.score(&entry);
            assert_eq!(points as usize, expected);
            assert!(u64::from(points) <= n);
            assert!(points as usize <= official.len());
        }
    }

    #[test]
    fn from_fixtures_skips_undecided() {
        let mut decided = Fixture::dummy(1);
        decided.outcome = Some(Outcome::Away);
        let undecided = Fixture::dummy(2);
        let official = OfficialOutcomes::from_fixtures(&[decided, undecided]);
        assert_eq!(official.len(), 1);
        assert_eq!(official.get(FixtureId(1)), Some(Outcome::Away));
        assert_eq!(official.get(FixtureId(2)), None);
    }

    #[test]
    fn digest_is_deterministic_and_sensitive() {
        let pool = PoolId::from_bytes([3u8; 16]);
        let a = outcomes(&[(1, Outcome::Home), (2, Outcome::Draw)]);
        let b = outcomes(&[(2, Outcome::Draw), (1, Outcome::Home)]);
        let c = outcomes(&[(1, Outcome::Home), (2, Outcome::Away)]);

        assert_eq!(a.digest(pool), b.digest(pool));
        assert_ne!(a.digest(pool), c.digest(pool));
        assert_ne!(a.digest(pool), a.digest(PoolId::from_bytes([4u8; 16])));
        assert_eq!(a.digest(pool).len(), 64);
    }
}
