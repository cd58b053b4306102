//! Outcome derivation and the per-fixture result write.
//!
//! [`determine_outcome`] is the single place that turns a score and a
//! match status into HOME / DRAW / AWAY. It is pure and total: anything it
//! cannot decide is `None` ("no official outcome yet"), never a guess.

use chrono::{DateTime, Utc};
use quiniela_types::{CandidateScore, Fixture, MatchStatus, Outcome};

/// Derive the official outcome of a match.
///
/// Returns `None` when the status is void (cancelled, postponed...),
/// when either goal count is missing, or when the match has not finished.
#[must_use]
pub fn determine_outcome(home: Option<u32>, away: Option<u32>, status: &MatchStatus) -> Option<Outcome> {
    if status.is_void() {
        return None;
    }
    let (home, away) = (home?, away?);
    if !status.is_finished() {
        return None;
    }
    Some(match home.cmp(&away) {
        std::cmp::Ordering::Greater => Outcome::Home,
        std::cmp::Ordering::Less => Outcome::Away,
        std::cmp::Ordering::Equal => Outcome::Draw,
    })
}

/// Status a candidate is judged under: its own, else the fixture's, else
/// full time (an operator typing a final score implies the match ended).
#[must_use]
pub fn effective_status(fixture: &Fixture, candidate: &CandidateScore) -> MatchStatus {
    candidate
        .status
        .clone()
        .or_else(|| fixture.status.clone())
        .unwrap_or(MatchStatus::FullTime)
}

/// Write a candidate score onto its fixture.
///
/// `result`, `status`, `outcome` and `isValid` are always written together
/// so the stored outcome is a function of the stored result and status.
/// Unparseable goals clear the result.
pub fn apply_candidate(fixture: &mut Fixture, candidate: &CandidateScore, now: DateTime<Utc>) -> Option<Outcome> {
    let status = effective_status(fixture, candidate);
    let goals = candidate.goals();
    let outcome = determine_outcome(goals.map(|g| g.home), goals.map(|g| g.away), &status);

    tracing::debug!(
        fixture = %fixture.id,
        teams = %fixture.label(),
        status = %status,
        result = ?goals,
        outcome = ?outcome,
        source = ?candidate.source,
        "Fixture result applied"
    );

    fixture.result = goals;
    fixture.status = Some(status);
    fixture.outcome = outcome;
    fixture.is_valid = outcome.is_some();
    fixture.calculated_at = Some(now);
    outcome
}

/// Re-derive the outcome of a fixture that received no candidate this run.
pub fn recompute_outcome(fixture: &mut Fixture) -> Option<Outcome> {
    let outcome = match fixture.result {
        Some(score) => {
            let status = fixture.status.get_or_insert(MatchStatus::FullTime);
            determine_outcome(Some(score.home), Some(score.away), status)
        }
        None => None,
    };
    fixture.outcome = outcome;
    fixture.is_valid = outcome.is_some();
    outcome
}
