//! Fixture types: one real-world match inside a pool.
//!
//! A [`Fixture`] carries the official [`Score`], the external
//! [`MatchStatus`] and the derived [`Outcome`]. Scores arriving from an
//! operator or a feed are first held as a [`CandidateScore`] whose goal
//! values are still raw (operators type them in, so they may be text).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FixtureId;

/// The predicted or official result of a match, ignoring the margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "HOME"),
            Self::Draw => write!(f, "DRAW"),
            Self::Away => write!(f, "AWAY"),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchStatus
// ---------------------------------------------------------------------------

/// Match status as reported by the sports-data feed (short codes).
///
/// Unknown codes are kept verbatim in [`MatchStatus::Other`] so a feed
/// upgrade never makes a pool document unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StatusRepr", into = "String")]
pub enum MatchStatus {
    TimeToBeDefined,
    NotStarted,
    FirstHalf,
    HalfTime,
    SecondHalf,
    ExtraTime,
    BreakTime,
    PenaltiesInProgress,
    Live,
    FullTime,
    AfterExtraTime,
    Penalties,
    Suspended,
    Interrupted,
    Postponed,
    Cancelled,
    Abandoned,
    Awarded,
    Walkover,
    Other(String),
}

impl MatchStatus {
    /// The feed's short code for this status.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::TimeToBeDefined => "TBD",
            Self::NotStarted => "NS",
            Self::FirstHalf => "1H",
            Self::HalfTime => "HT",
            Self::SecondHalf => "2H",
            Self::ExtraTime => "ET",
            Self::BreakTime => "BT",
            Self::PenaltiesInProgress => "P",
            Self::Live => "LIVE",
            Self::FullTime => "FT",
            Self::AfterExtraTime => "AET",
            Self::Penalties => "PEN",
            Self::Suspended => "SUSP",
            Self::Interrupted => "INT",
            Self::Postponed => "PST",
            Self::Cancelled => "CANC",
            Self::Abandoned => "ABD",
            Self::Awarded => "AWD",
            Self::Walkover => "WO",
            Self::Other(code) => code,
        }
    }

    /// Parse a short code. Never fails; unknown codes become `Other`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "TBD" => Self::TimeToBeDefined,
            "NS" => Self::NotStarted,
            "1H" => Self::FirstHalf,
            "HT" => Self::HalfTime,
            "2H" => Self::SecondHalf,
            "ET" => Self::ExtraTime,
            "BT" => Self::BreakTime,
            "P" => Self::PenaltiesInProgress,
            "LIVE" => Self::Live,
            "FT" => Self::FullTime,
            "AET" => Self::AfterExtraTime,
            "PEN" => Self::Penalties,
            "SUSP" => Self::Suspended,
            "INT" => Self::Interrupted,
            "PST" => Self::Postponed,
            "CANC" => Self::Cancelled,
            "ABD" => Self::Abandoned,
            "AWD" => Self::Awarded,
            "WO" => Self::Walkover,
            other => Self::Other(other.to_string()),
        }
    }

    /// The match reached a final score that counts for the pool.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::FullTime | Self::AfterExtraTime | Self::Penalties)
    }

    /// The match will not produce a usable result (cancelled, postponed...).
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::Postponed
                | Self::Suspended
                | Self::Abandoned
                | Self::Walkover
                | Self::Interrupted
        )
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<MatchStatus> for String {
    fn from(status: MatchStatus) -> Self {
        status.code().to_string()
    }
}

/// Wire shapes accepted for a status: a bare code, or the feed's detailed
/// object (`{"short": "FT", "long": "Match Finished", ...}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(String),
    Detailed { short: String },
}

impl From<StatusRepr> for MatchStatus {
    fn from(repr: StatusRepr) -> Self {
        match repr {
            StatusRepr::Code(code) | StatusRepr::Detailed { short: code } => Self::from_code(&code),
        }
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// An official final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    #[must_use]
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// A goal count as supplied by the caller, before validation.
///
/// Any JSON value deserializes; shapes other than an integer or a string
/// land in `Other` and never parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawGoals {
    Count(i64),
    Text(String),
    Other(serde_json::Value),
}

impl RawGoals {
    /// The goal count, if this is a non-negative integer.
    ///
    /// Text must be a plain integer (surrounding whitespace allowed);
    /// `"2abc"` is rejected rather than read as 2.
    #[must_use]
    pub fn parse(&self) -> Option<u32> {
        match self {
            Self::Count(n) => u32::try_from(*n).ok(),
            Self::Text(s) => s.trim().parse::<u32>().ok(),
            Self::Other(_) => None,
        }
    }
}

impl From<u32> for RawGoals {
    fn from(n: u32) -> Self {
        Self::Count(i64::from(n))
    }
}

impl From<i32> for RawGoals {
    fn from(n: i32) -> Self {
        Self::Count(i64::from(n))
    }
}

impl From<&str> for RawGoals {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Where a candidate score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    /// Typed in by an operator. Applies even to locked fixtures.
    #[default]
    Manual,
    /// Pulled from the sports-data feed. Never overwrites a locked fixture.
    Feed,
}

/// A proposed official score for one fixture, consumed by settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub fixture_id: FixtureId,
    pub home: Option<RawGoals>,
    pub away: Option<RawGoals>,
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(default)]
    pub source: ScoreSource,
}

impl CandidateScore {
    /// An operator-entered score with no status of its own.
    #[must_use]
    pub fn manual(fixture_id: FixtureId, home: impl Into<RawGoals>, away: impl Into<RawGoals>) -> Self {
        Self {
            fixture_id,
            home: Some(home.into()),
            away: Some(away.into()),
            status: None,
            source: ScoreSource::Manual,
        }
    }

    /// A feed row: status always present, goals possibly missing.
    #[must_use]
    pub fn feed(fixture_id: FixtureId, status: MatchStatus, home: Option<u32>, away: Option<u32>) -> Self {
        Self {
            fixture_id,
            home: home.map(RawGoals::from),
            away: away.map(RawGoals::from),
            status: Some(status),
            source: ScoreSource::Feed,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Both goal counts, if both parse.
    #[must_use]
    pub fn goals(&self) -> Option<Score> {
        let home = self.home.as_ref()?.parse()?;
        let away = self.away.as_ref()?.parse()?;
        Some(Score { home, away })
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// One real-world match being predicted, embedded in a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: FixtureId,
    #[serde(default)]
    pub league_id: Option<u32>,
    #[serde(default)]
    pub league_name: Option<String>,
    #[serde(default)]
    pub round: Option<String>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_logo: Option<String>,
    #[serde(default)]
    pub away_logo: Option<String>,
    pub match_date: DateTime<Utc>,
    /// Official final score, absent until reported.
    #[serde(default)]
    pub result: Option<Score>,
    #[serde(default)]
    pub status: Option<MatchStatus>,
    /// Derived from `(result, status)`; `None` means no official outcome yet.
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub is_valid: bool,
    /// Operator veto on automated (feed) overwrites of `result`/`status`.
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub calculated_at: Option<DateTime<Utc>>,
}

impl Fixture {
    /// A fresh fixture with no result, as placed in a new pool.
    #[must_use]
    pub fn new(
        id: FixtureId,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        match_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            league_id: None,
            league_name: None,
            round: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_logo: None,
            away_logo: None,
            match_date,
            result: None,
            status: None,
            outcome: None,
            is_valid: false,
            is_locked: false,
            locked_at: None,
            calculated_at: None,
        }
    }

    #[must_use]
    pub fn with_league(mut self, league_id: u32, league_name: impl Into<String>, round: impl Into<String>) -> Self {
        self.league_id = Some(league_id);
        self.league_name = Some(league_name.into());
        self.round = Some(round.into());
        self
    }

    #[must_use]
    pub fn with_logos(mut self, home_logo: impl Into<String>, away_logo: impl Into<String>) -> Self {
        self.home_logo = Some(home_logo.into());
        self.away_logo = Some(away_logo.into());
        self
    }

    /// Engage or release the operator lock.
    pub fn set_locked(&mut self, locked: bool, now: DateTime<Utc>) {
        self.is_locked = locked;
        self.locked_at = locked.then_some(now);
    }

    /// "Home vs Away" label used in logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Fixture {
    pub fn dummy(id: u64) -> Self {
        Self::new(
            FixtureId(id),
            format!("Home {id}"),
            format!("Away {id}"),
            Utc::now(),
        )
    }
}
