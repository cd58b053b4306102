//! Configuration types for pools and settlement runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{QuinielaError, Result, constants};

/// Top-level configuration, loadable from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuinielaConfig {
    pub settlement: SettlementConfig,
    pub pool_rules: PoolRules,
}

impl QuinielaConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| QuinielaError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.settlement.validate()?;
        self.pool_rules.validate()
    }
}

/// Tuning for one settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettlementConfig {
    /// Entry updates committed per write batch.
    pub entry_batch_size: usize,
    /// Entries fetched per page.
    pub entry_page_size: usize,
    /// Retries for a failed batch before the run stops.
    pub max_batch_retries: u32,
    /// Pause between retries, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            entry_batch_size: constants::DEFAULT_ENTRY_BATCH_SIZE,
            entry_page_size: constants::DEFAULT_ENTRY_PAGE_SIZE,
            max_batch_retries: constants::DEFAULT_MAX_BATCH_RETRIES,
            retry_backoff_ms: constants::DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl SettlementConfig {
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entry_batch_size == 0 || self.entry_batch_size > constants::MAX_WRITE_BATCH {
            return Err(QuinielaError::Configuration(format!(
                "entryBatchSize must be in 1..={}, got {}",
                constants::MAX_WRITE_BATCH,
                self.entry_batch_size
            )));
        }
        if self.entry_page_size == 0 {
            return Err(QuinielaError::Configuration(
                "entryPageSize must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Rules an organizer's pool must satisfy at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolRules {
    /// Exact number of fixtures per pool.
    pub fixtures_per_pool: usize,
    /// Maximum description length in characters.
    pub max_description_chars: usize,
}

impl Default for PoolRules {
    fn default() -> Self {
        Self {
            fixtures_per_pool: constants::MAX_FIXTURES_PER_POOL,
            max_description_chars: constants::MAX_DESCRIPTION_CHARS,
        }
    }
}

impl PoolRules {
    pub fn validate(&self) -> Result<()> {
        if self.fixtures_per_pool == 0 {
            return Err(QuinielaError::Configuration(
                "fixturesPerPool must be > 0".into(),
            ));
        }
        Ok(())
    }
}
