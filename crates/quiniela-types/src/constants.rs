//! System-wide constants for quiniela pools.

/// Number of fixtures every pool carries (the organizer picks exactly this many).
pub const MAX_FIXTURES_PER_POOL: usize = 9;

/// Maximum length of a pool description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Default number of entry updates committed per write batch.
pub const DEFAULT_ENTRY_BATCH_SIZE: usize = 400;

/// Hard ceiling on a single write batch (document store limit).
pub const MAX_WRITE_BATCH: usize = 500;

/// Default number of entries fetched per page during settlement.
pub const DEFAULT_ENTRY_PAGE_SIZE: usize = 500;

/// Default number of retries for a failed batch commit.
pub const DEFAULT_MAX_BATCH_RETRIES: u32 = 3;

/// Default pause between batch commit retries in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Status codes meaning the match will not produce a usable result.
pub const VOID_STATUS_CODES: [&str; 6] = ["CANC", "PST", "SUSP", "ABD", "WO", "INT"];

/// Status codes meaning the match reached a final score.
pub const FINISHED_STATUS_CODES: [&str; 3] = ["FT", "AET", "PEN"];

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Quiniela";
