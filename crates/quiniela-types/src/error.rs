//! Error types for quiniela.
//!
//! All errors use the `QN_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Pool errors
//! - 2xx: Entry errors
//! - 3xx: Fixture errors
//! - 6xx: Settlement errors
//! - 9xx: General / storage errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{EntryId, FixtureId, PoolId, PoolStatus};

/// Central error enum for all quiniela operations.
#[derive(Debug, Error)]
pub enum QuinielaError {
    // =================================================================
    // Pool Errors (1xx)
    // =================================================================
    /// No pool document with this id.
    #[error("QN_ERR_100: Pool not found: {0}")]
    PoolNotFound(PoolId),

    /// The pool failed structural validation.
    #[error("QN_ERR_101: Invalid pool: {reason}")]
    InvalidPool { reason: String },

    /// A pool with this id already exists.
    #[error("QN_ERR_102: Pool already exists: {0}")]
    DuplicatePool(PoolId),

    /// The pool was not in the status an operation required.
    #[error("QN_ERR_103: Wrong pool status: expected {expected}, got {actual}")]
    WrongPoolStatus {
        expected: PoolStatus,
        actual: PoolStatus,
    },

    // =================================================================
    // Entry Errors (2xx)
    // =================================================================
    /// The pool's deadline has passed.
    #[error("QN_ERR_200: Deadline passed for pool {pool_id} at {deadline}")]
    DeadlinePassed {
        pool_id: PoolId,
        deadline: DateTime<Utc>,
    },

    /// The pool is not open for entries.
    #[error("QN_ERR_201: Pool {pool_id} is not accepting entries (status {status})")]
    PoolNotAcceptingEntries { pool_id: PoolId, status: PoolStatus },

    /// Not every fixture of the pool has a prediction.
    #[error("QN_ERR_202: Incomplete predictions: {predicted} of {required} fixtures")]
    IncompletePredictions { required: usize, predicted: usize },

    /// A prediction names a fixture that is not in the pool.
    #[error("QN_ERR_203: Prediction for unknown {0}")]
    UnknownFixturePrediction(FixtureId),

    /// The user already has an entry in this pool.
    #[error("QN_ERR_204: Entry already exists: {0}")]
    DuplicateEntry(EntryId),

    /// No entry document with this id.
    #[error("QN_ERR_205: Entry not found: {0}")]
    EntryNotFound(EntryId),

    // =================================================================
    // Fixture Errors (3xx)
    // =================================================================
    /// The fixture is not part of the pool.
    #[error("QN_ERR_300: {fixture_id} not found in pool {pool_id}")]
    FixtureNotFound {
        pool_id: PoolId,
        fixture_id: FixtureId,
    },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// Another settlement run holds the pool.
    #[error("QN_ERR_600: Settlement already in progress for pool {0}")]
    SettlementInProgress(PoolId),

    /// Some entry batches committed, then a batch kept failing.
    ///
    /// `finalized` counts entries written by this run; `already_current`
    /// counts entries a previous run had already settled.
    #[error(
        "QN_ERR_601: Settlement of pool {pool_id} stopped after {finalized} entries \
         ({already_current} already current): {reason}"
    )]
    PartialSettlement {
        pool_id: PoolId,
        finalized: usize,
        already_current: usize,
        reason: String,
    },

    /// The operator aborted the run between batches.
    #[error(
        "QN_ERR_602: Settlement of pool {pool_id} aborted after {finalized} entries \
         ({already_current} already current)"
    )]
    SettlementAborted {
        pool_id: PoolId,
        finalized: usize,
        already_current: usize,
    },

    /// The fixture write (phase one) failed; no entry was touched.
    #[error("QN_ERR_603: Failed to persist fixture outcomes for pool {pool_id}: {reason}")]
    FixtureWriteFailed { pool_id: PoolId, reason: String },

    // =================================================================
    // General / Storage (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("QN_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("QN_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("QN_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("QN_ERR_903: I/O error: {0}")]
    Io(String),

    /// The backing document store rejected an operation.
    #[error("QN_ERR_904: Storage error: {0}")]
    Storage(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, QuinielaError>;

impl From<std::io::Error> for QuinielaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for QuinielaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = QuinielaError::PoolNotFound(PoolId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("QN_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn partial_settlement_reports_progress() {
        let err = QuinielaError::PartialSettlement {
            pool_id: PoolId::new(),
            finalized: 800,
            already_current: 200,
            reason: "batch rejected".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("QN_ERR_601"));
        assert!(msg.contains("800 entries (200 already current)"), "Got: {msg}");
        assert!(msg.contains("batch rejected"));
    }

    #[test]
    fn wrong_pool_status_display() {
        let err = QuinielaError::WrongPoolStatus {
            expected: PoolStatus::Open,
            actual: PoolStatus::Settling,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OPEN"));
        assert!(msg.contains("SETTLING"));
    }

    #[test]
    fn all_errors_have_qn_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(QuinielaError::SettlementInProgress(PoolId::new())),
            Box::new(QuinielaError::IncompletePredictions {
                required: 9,
                predicted: 8,
            }),
            Box::new(QuinielaError::UnknownFixturePrediction(FixtureId(3))),
            Box::new(QuinielaError::Internal("test".into())),
            Box::new(QuinielaError::Storage("down".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("QN_ERR_"),
                "Error missing QN_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn json_error_converts_to_serialization() {
        let err: QuinielaError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, QuinielaError::Serialization(_)));
    }
}
